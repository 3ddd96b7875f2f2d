//! Stage ordering for one registration request.

use std::path::Path;

use image::RgbImage;
use nalgebra::Matrix3;

use crate::config::{Dirs, RegisterConfig};
use crate::disk::locate_disk;
use crate::features::{draw_matches, extract_features, match_features, Correspondence};
use crate::frame::normalize_frame;
use crate::homography::{
    fit_homography_ransac, matrix3_to_array, RansacHomographyResult, MIN_CORRESPONDENCES,
};
use crate::preprocess::gray_smoothed;
use crate::reference::load_reference;
use crate::warp::warp_perspective;

use super::emit::{artifact_path, write_artifact, ALIGNED_PREFIX, VISUALIZATION_PREFIX};
use super::result::{Artifacts, RegistrationReport};
use super::RegisterError;

/// Feature extraction and matching output for a photo/reference pair.
pub struct MatchOutcome {
    /// Accepted photo-to-reference correspondences.
    pub correspondences: Vec<Correspondence>,
    /// Keypoint count on the photo side.
    pub n_keypoints_photo: usize,
    /// Keypoint count on the reference side.
    pub n_keypoints_reference: usize,
    /// Side-by-side correspondence rendering.
    pub visualization: RgbImage,
}

/// Geometry fit on top of a [`MatchOutcome`].
pub struct Registration {
    pub matches: MatchOutcome,
    /// Fitted photo-to-reference homography and consensus bookkeeping.
    pub fit: RansacHomographyResult,
    /// Photo warped onto the reference canvas.
    pub aligned: RgbImage,
}

/// Extract, match, and visualize features between a normalized photo frame
/// and its reference tile. Pure: no filesystem access.
pub fn match_frames(
    photo: &RgbImage,
    reference: &RgbImage,
    config: &RegisterConfig,
) -> MatchOutcome {
    let photo_gray = gray_smoothed(photo, &config.smoothing);
    let reference_gray = gray_smoothed(reference, &config.smoothing);

    let photo_features = extract_features(&photo_gray, &config.features);
    let reference_features = extract_features(&reference_gray, &config.features);
    tracing::info!(
        "{} photo / {} reference keypoints",
        photo_features.len(),
        reference_features.len()
    );

    let correspondences = match_features(&photo_features, &reference_features, config.features.ratio);
    let visualization = draw_matches(photo, reference, &correspondences);

    MatchOutcome {
        correspondences,
        n_keypoints_photo: photo_features.len(),
        n_keypoints_reference: reference_features.len(),
        visualization,
    }
}

/// Register a normalized photo frame against a reference frame.
///
/// Fails with `InsufficientMatches` before attempting any fit when fewer
/// than four correspondences survive the ratio test, and with `Homography`
/// when the robust fit finds no consensus.
pub fn register_frames(
    photo: &RgbImage,
    reference: &RgbImage,
    config: &RegisterConfig,
) -> Result<Registration, RegisterError> {
    let matches = match_frames(photo, reference, config);
    if matches.correspondences.len() < MIN_CORRESPONDENCES {
        return Err(RegisterError::InsufficientMatches {
            needed: MIN_CORRESPONDENCES,
            got: matches.correspondences.len(),
        });
    }

    let fit = fit_homography_ransac(&matches.correspondences, &config.ransac)?;
    tracing::info!(
        "homography fit: {} of {} correspondences inlying",
        fit.n_inliers,
        matches.correspondences.len()
    );

    let (rw, rh) = reference.dimensions();
    let aligned = warp_onto_reference(photo, &fit.h, rw, rh)?;
    Ok(Registration {
        matches,
        fit,
        aligned,
    })
}

fn warp_onto_reference(
    photo: &RgbImage,
    h: &Matrix3<f64>,
    w: u32,
    hgt: u32,
) -> Result<RgbImage, RegisterError> {
    warp_perspective(photo, h, w, hgt).ok_or_else(|| {
        RegisterError::Homography(crate::homography::HomographyError::NumericalFailure(
            "fitted homography is singular".into(),
        ))
    })
}

/// Run the full pipeline for one uploaded filename.
///
/// Reads `dirs.uploads/<filename>`, writes `registration-<filename>` and
/// `resized-<filename>` under `dirs.processed`, and returns the report.
/// The visualization is written before the geometry fit is attempted, so
/// a failed fit still leaves the correspondence rendering behind. Artifact
/// write failures are recorded in the report, never propagated.
pub fn run_request(
    filename: &str,
    dirs: &Dirs,
    config: &RegisterConfig,
) -> Result<RegistrationReport, RegisterError> {
    let photo_path = dirs.uploads.join(filename);
    tracing::info!("registering {}", photo_path.display());
    let photo = open_rgb(&photo_path)?;
    let (orig_w, orig_h) = photo.dimensions();

    let circle = locate_disk(&photo, &config.disk, &config.smoothing)
        .ok_or(RegisterError::DiskNotDetected)?;

    let frame = normalize_frame(&photo, &circle, &config.frame)
        .ok_or(RegisterError::EmptyCropRegion)?;
    let (fw, fh) = frame.dimensions();

    let tile = load_reference(&dirs.reference, fw, fh, &config.reference)
        .map_err(|e| RegisterError::Io {
            path: e.path,
            source: e.source,
        })?;

    let matches = match_frames(&frame, &tile.image, config);
    let visualization = write_artifact(
        &matches.visualization,
        artifact_path(&dirs.processed, VISUALIZATION_PREFIX, filename),
    );

    if matches.correspondences.len() < MIN_CORRESPONDENCES {
        return Err(RegisterError::InsufficientMatches {
            needed: MIN_CORRESPONDENCES,
            got: matches.correspondences.len(),
        });
    }

    let fit = fit_homography_ransac(&matches.correspondences, &config.ransac)?;
    let aligned_img = warp_onto_reference(&frame, &fit.h, fw, fh)?;
    let aligned = write_artifact(
        &aligned_img,
        artifact_path(&dirs.processed, ALIGNED_PREFIX, filename),
    );

    Ok(RegistrationReport {
        filename: filename.to_string(),
        image_size: [orig_w, orig_h],
        circle,
        frame_size: [fw, fh],
        ppd: tile.ppd,
        tier: tile.tier,
        n_keypoints_photo: matches.n_keypoints_photo,
        n_keypoints_reference: matches.n_keypoints_reference,
        n_correspondences: matches.correspondences.len(),
        homography: matrix3_to_array(&fit.h),
        ransac: fit.stats(config.ransac.inlier_threshold),
        artifacts: Artifacts {
            visualization,
            aligned,
        },
    })
}

fn open_rgb(path: &Path) -> Result<RgbImage, RegisterError> {
    image::open(path)
        .map(|img| img.to_rgb8())
        .map_err(|source| RegisterError::Io {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::draw_blob_rgb_image;
    use approx::assert_relative_eq;

    #[test]
    fn self_registration_recovers_identity() {
        let img = draw_blob_rgb_image(360, 360, 80, 7);
        let reg = register_frames(&img, &img, &RegisterConfig::default()).unwrap();

        let h = reg.fit.h;
        assert_relative_eq!(h[(0, 0)], 1.0, epsilon = 0.05);
        assert_relative_eq!(h[(1, 1)], 1.0, epsilon = 0.05);
        assert!(h[(0, 2)].abs() < 3.0, "tx = {}", h[(0, 2)]);
        assert!(h[(1, 2)].abs() < 3.0, "ty = {}", h[(1, 2)]);

        let stats = reg.fit.stats(5.0);
        assert!(stats.mean_err_px < 1.0, "mean err = {}", stats.mean_err_px);
    }

    #[test]
    fn featureless_frames_fail_with_insufficient_matches() {
        let flat = RgbImage::new(200, 200);
        match register_frames(&flat, &flat, &RegisterConfig::default()) {
            Err(RegisterError::InsufficientMatches { needed: 4, .. }) => {}
            other => panic!("expected InsufficientMatches, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn match_frames_visualization_spans_both_images() {
        let a = draw_blob_rgb_image(128, 128, 30, 1);
        let b = draw_blob_rgb_image(160, 128, 30, 2);
        let outcome = match_frames(&a, &b, &RegisterConfig::default());
        assert_eq!(outcome.visualization.dimensions(), (288, 128));
    }

    #[test]
    fn missing_upload_is_an_io_error() {
        let dirs = Dirs {
            uploads: "/nonexistent".into(),
            reference: "/nonexistent".into(),
            processed: "/nonexistent".into(),
        };
        match run_request("missing.jpg", &dirs, &RegisterConfig::default()) {
            Err(RegisterError::Io { path, .. }) => {
                assert!(path.ends_with("missing.jpg"));
            }
            other => panic!("expected Io error, got {:?}", other.map(|_| ())),
        }
    }
}
