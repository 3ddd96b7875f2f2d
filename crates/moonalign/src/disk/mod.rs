//! Disk localization: finding the Moon's silhouette in a photograph.
//!
//! A gradient-voting circular Hough transform over the smoothed intensity
//! image. Edge pixels vote along their gradient direction at candidate
//! radii; disks produce accumulator peaks at their centers because limb
//! gradients converge radially. Radii are recovered per peak from the mode
//! of an edge-distance histogram.

mod hough;

use image::RgbImage;

use crate::preprocess::{self, SmoothingConfig};

pub(crate) use hough::find_circles;

/// A detected circular disk in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Circle {
    /// Center x (pixels).
    pub x: f32,
    /// Center y (pixels).
    pub y: f32,
    /// Radius (pixels), always >= 0.
    pub r: f32,
}

/// Configuration for disk localization.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DiskConfig {
    /// Gradient magnitude threshold (fraction of max gradient).
    pub grad_threshold: f32,
    /// Gaussian sigma for accumulator smoothing.
    pub accum_sigma: f32,
    /// NMS radius for accumulator peak extraction (pixels).
    pub nms_radius: f32,
    /// Minimum accumulator value for a candidate (fraction of max).
    pub min_vote_frac: f32,
    /// Number of radius samples voted across [r_min, r_max].
    pub n_radius_samples: usize,
    /// Maximum number of center candidates to evaluate for radius.
    pub max_candidates: usize,
    /// Minimum boundary support as a fraction of the circumference.
    pub min_arc_frac: f32,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            grad_threshold: 0.1,
            accum_sigma: 2.0,
            nms_radius: 10.0,
            min_vote_frac: 0.3,
            n_radius_samples: 48,
            max_candidates: 8,
            min_arc_frac: 0.1,
        }
    }
}

/// Locate the largest circular disk in a color photograph.
///
/// Radius search is constrained to [shorter_dim / 4, longer_dim / 2].
/// Returns `None` when no candidate passes the vote and arc-support gates;
/// the caller decides whether that is fatal for the request.
pub fn locate_disk(
    photo: &RgbImage,
    config: &DiskConfig,
    smoothing: &SmoothingConfig,
) -> Option<Circle> {
    let (w, h) = photo.dimensions();
    let r_min = (w.min(h) as f32) / 4.0;
    let r_max = (w.max(h) as f32) / 2.0;

    let gray = preprocess::gray_smoothed(photo, smoothing);
    let candidates = find_circles(&gray, r_min, r_max, config);
    if candidates.is_empty() {
        tracing::info!("disk not detected");
        return None;
    }

    // Largest radius wins; ties keep the earlier (higher-scoring) candidate.
    let mut best = candidates[0];
    for c in &candidates[1..] {
        if c.r > best.r {
            best = *c;
        }
    }
    tracing::info!(
        "disk detected at ({:.1}, {:.1}) r={:.1} from {} candidates",
        best.x,
        best.y,
        best.r,
        candidates.len()
    );
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_disk_image;

    #[test]
    fn centered_disk_is_found() {
        let img = draw_disk_image(400, 400, [200.0, 200.0], 150.0, 230, 10);
        let circle = locate_disk(&img, &DiskConfig::default(), &SmoothingConfig::default())
            .expect("disk should be detected");

        // Accept ~3% deviation from the true parameters.
        assert!((circle.x - 200.0).abs() < 6.0, "center x = {}", circle.x);
        assert!((circle.y - 200.0).abs() < 6.0, "center y = {}", circle.y);
        assert!((circle.r - 150.0).abs() < 4.5, "radius = {}", circle.r);
    }

    #[test]
    fn off_center_clipped_disk_is_found() {
        // Disk partially outside the left edge.
        let img = draw_disk_image(400, 300, [60.0, 150.0], 110.0, 220, 15);
        let circle = locate_disk(&img, &DiskConfig::default(), &SmoothingConfig::default())
            .expect("clipped disk should still be detected");
        assert!((circle.x - 60.0).abs() < 10.0);
        assert!((circle.y - 150.0).abs() < 10.0);
        assert!((circle.r - 110.0).abs() < 8.0);
    }

    #[test]
    fn featureless_image_reports_no_detection() {
        let img = RgbImage::new(200, 200);
        assert!(locate_disk(&img, &DiskConfig::default(), &SmoothingConfig::default()).is_none());
    }
}
