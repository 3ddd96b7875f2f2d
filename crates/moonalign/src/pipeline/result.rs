//! Serializable outcome of one registration request.

use std::path::PathBuf;

use crate::disk::Circle;
use crate::homography::RansacStats;

/// Per-artifact write status. A failed write never aborts the sibling
/// artifact; partial success is visible here.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ArtifactStatus {
    /// Destination path the write was attempted at.
    pub path: PathBuf,
    /// Whether the file was written successfully.
    pub written: bool,
}

/// The two output artifacts of a request.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Artifacts {
    /// Side-by-side correspondence visualization.
    pub visualization: ArtifactStatus,
    /// Photo warped into the reference frame.
    pub aligned: ArtifactStatus,
}

/// Full report for a single registered photo.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RegistrationReport {
    /// Uploaded filename the request was invoked with.
    pub filename: String,
    /// Original photo dimensions [width, height].
    pub image_size: [u32; 2],
    /// Detected disk in original photo coordinates.
    pub circle: Circle,
    /// Normalized frame dimensions [width, height].
    pub frame_size: [u32; 2],
    /// Angular resolution computed from the frame width.
    pub ppd: u32,
    /// Reference tier selected for that resolution.
    pub tier: u32,
    /// Keypoints extracted from the normalized photo.
    pub n_keypoints_photo: usize,
    /// Keypoints extracted from the resampled reference.
    pub n_keypoints_reference: usize,
    /// Ratio-test survivors fed to the geometry solver.
    pub n_correspondences: usize,
    /// Fitted photo-to-reference homography (3x3, row-major).
    pub homography: [[f64; 3]; 3],
    /// Robust-fit statistics.
    pub ransac: RansacStats,
    /// Output artifact statuses.
    pub artifacts: Artifacts,
}
