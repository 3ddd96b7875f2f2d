//! Request configuration: directory layout and per-stage tuning.

use std::path::PathBuf;

use crate::disk::DiskConfig;
use crate::features::FeatureConfig;
use crate::frame::FrameConfig;
use crate::homography::RansacHomographyConfig;
use crate::preprocess::SmoothingConfig;
use crate::reference::ReferenceConfig;

/// Resolved directory layout, injected by the caller.
///
/// The core joins filenames onto these paths itself; callers pass bare
/// filenames, never full paths.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Dirs {
    /// Directory holding uploaded photos.
    pub uploads: PathBuf,
    /// Directory holding the reference tile corpus.
    pub reference: PathBuf,
    /// Directory receiving output artifacts.
    pub processed: PathBuf,
}

/// Top-level registration configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RegisterConfig {
    /// Edge-preserving smoothing, shared by disk localization and
    /// feature detection.
    pub smoothing: SmoothingConfig,
    /// Disk locator tuning.
    pub disk: DiskConfig,
    /// Frame normalization (crop margin).
    pub frame: FrameConfig,
    /// Reference corpus parameters.
    pub reference: ReferenceConfig,
    /// Feature detection and matching tuning.
    pub features: FeatureConfig,
    /// Robust homography fitting tuning.
    pub ransac: RansacHomographyConfig,
}
