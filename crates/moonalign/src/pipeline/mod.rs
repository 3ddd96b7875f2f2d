//! Registration pipeline glue: stage ordering, request-scoped errors,
//! artifact emission, and the report type.
//!
//! Algorithmic primitives live in `crate::disk`, `crate::frame`,
//! `crate::reference`, `crate::features`, `crate::homography`, and
//! `crate::warp`; this layer wires them together in the fixed order
//! disk → frame → reference/features → geometry → emit.
//!
//! Entry points:
//! - `run_request`: full filesystem-facing pipeline for one uploaded photo
//! - `register_frames`: pure registration of two equally-sized frames
//!   (no I/O), what the round-trip tests exercise

mod emit;
mod result;
mod run;

pub use result::{ArtifactStatus, Artifacts, RegistrationReport};
pub use run::{match_frames, register_frames, run_request, MatchOutcome, Registration};

use std::path::PathBuf;

use crate::homography::HomographyError;

/// Request-scoped pipeline failure.
///
/// Every variant is recoverable at the request boundary; nothing here may
/// terminate the host process.
#[derive(Debug)]
pub enum RegisterError {
    /// Reading the photo or a reference tile failed.
    Io {
        path: PathBuf,
        source: image::ImageError,
    },
    /// The disk locator found no circle in the photo.
    DiskNotDetected,
    /// The crop region derived from the detected circle has zero area.
    EmptyCropRegion,
    /// Fewer accepted correspondences than the geometry solver needs.
    InsufficientMatches { needed: usize, got: usize },
    /// The robust fit found no usable consensus (degenerate geometry) or
    /// failed numerically.
    Homography(HomographyError),
}

impl std::fmt::Display for RegisterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "image I/O failed for {}: {}", path.display(), source)
            }
            Self::DiskNotDetected => write!(f, "no disk detected in photo"),
            Self::EmptyCropRegion => write!(f, "crop region around detected disk is empty"),
            Self::InsufficientMatches { needed, got } => {
                write!(f, "insufficient matches: need {}, got {}", needed, got)
            }
            Self::Homography(e) => write!(f, "homography fit failed: {}", e),
        }
    }
}

impl std::error::Error for RegisterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Homography(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HomographyError> for RegisterError {
    fn from(e: HomographyError) -> Self {
        Self::Homography(e)
    }
}
