//! Two-nearest-neighbor descriptor matching with ratio-test filtering.

use super::brief::hamming;
use super::{Correspondence, Feature};

/// Match photo features against reference features.
///
/// For every photo descriptor the two nearest reference descriptors by
/// Hamming distance are found; the nearest is accepted only when it is
/// clearly better than the runner-up (`best < ratio * second_best`).
/// Keeping only the best-ranked pairing per photo keypoint makes each
/// correspondence belong to exactly one photo keypoint.
///
/// Zero accepted matches is valid output, not an error.
pub fn match_features(photo: &[Feature], reference: &[Feature], ratio: f32) -> Vec<Correspondence> {
    if reference.len() < 2 {
        // The ratio test needs a runner-up to compare against.
        return Vec::new();
    }

    let mut accepted = Vec::new();
    for p in photo {
        let mut best = u32::MAX;
        let mut second = u32::MAX;
        let mut best_idx = 0usize;
        for (i, r) in reference.iter().enumerate() {
            let d = hamming(&p.descriptor, &r.descriptor);
            if d < best {
                second = best;
                best = d;
                best_idx = i;
            } else if d < second {
                second = d;
            }
        }

        if (best as f32) < ratio * (second as f32) {
            let r = &reference[best_idx];
            accepted.push(Correspondence {
                photo: [p.keypoint.x as f64, p.keypoint.y as f64],
                reference: [r.keypoint.x as f64, r.keypoint.y as f64],
                distance: best,
            });
        }
    }
    tracing::info!(
        "{} of {} photo keypoints passed the ratio test",
        accepted.len(),
        photo.len()
    );
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{extract_features, FeatureConfig};
    use crate::test_utils::draw_blob_image;

    #[test]
    fn identical_images_match_richly() {
        let img = draw_blob_image(256, 256, 60, 11);
        let cfg = FeatureConfig::default();
        let feats = extract_features(&img, &cfg);
        let matches = match_features(&feats, &feats, cfg.ratio);
        assert!(
            matches.len() >= 8,
            "self-matching should yield many correspondences, got {}",
            matches.len()
        );
        // Self-matches land on the same coordinates.
        for m in &matches {
            assert_eq!(m.photo, m.reference);
            assert_eq!(m.distance, 0);
        }
    }

    #[test]
    fn matching_is_idempotent() {
        let a = draw_blob_image(200, 200, 45, 3);
        let b = draw_blob_image(200, 200, 45, 4);
        let cfg = FeatureConfig::default();
        let fa = extract_features(&a, &cfg);
        let fb = extract_features(&b, &cfg);
        let m1 = match_features(&fa, &fb, cfg.ratio);
        let m2 = match_features(&fa, &fb, cfg.ratio);
        assert_eq!(m1, m2);
    }

    #[test]
    fn too_few_reference_features_yield_no_matches() {
        let img = draw_blob_image(256, 256, 60, 11);
        let cfg = FeatureConfig::default();
        let feats = extract_features(&img, &cfg);
        assert!(match_features(&feats, &[], cfg.ratio).is_empty());
        assert!(match_features(&feats, &feats[..1], cfg.ratio).is_empty());
    }
}
