//! Artifact emission: the only durably-writing stage.

use std::path::{Path, PathBuf};

use image::RgbImage;

use super::result::ArtifactStatus;

/// Prefix for the correspondence visualization artifact.
pub(super) const VISUALIZATION_PREFIX: &str = "registration-";
/// Prefix for the warped/aligned artifact.
pub(super) const ALIGNED_PREFIX: &str = "resized-";

/// Output path for an artifact derived from the uploaded filename.
pub(super) fn artifact_path(processed_dir: &Path, prefix: &str, filename: &str) -> PathBuf {
    processed_dir.join(format!("{prefix}{filename}"))
}

/// Write one artifact, reporting success or failure without propagating.
///
/// A failing write is logged and recorded; the sibling artifact's write
/// proceeds regardless.
pub(super) fn write_artifact(img: &RgbImage, path: PathBuf) -> ArtifactStatus {
    match img.save(&path) {
        Ok(()) => {
            tracing::info!("wrote {}", path.display());
            ArtifactStatus { path, written: true }
        }
        Err(e) => {
            tracing::warn!("failed to write {}: {}", path.display(), e);
            ArtifactStatus {
                path,
                written: false,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_paths_prefix_the_filename() {
        let p = artifact_path(Path::new("/out"), VISUALIZATION_PREFIX, "moon.jpg");
        assert_eq!(p, PathBuf::from("/out/registration-moon.jpg"));
        let p = artifact_path(Path::new("/out"), ALIGNED_PREFIX, "moon.jpg");
        assert_eq!(p, PathBuf::from("/out/resized-moon.jpg"));
    }

    #[test]
    fn unwritable_destination_reports_failure() {
        let img = RgbImage::new(8, 8);
        let status = write_artifact(&img, PathBuf::from("/nonexistent-dir/x.png"));
        assert!(!status.written);
    }
}
