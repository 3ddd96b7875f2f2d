//! Registration of Moon photographs against a reference map.
//!
//! The pipeline takes an uploaded photo and produces a warp of it onto a
//! pre-rendered reference map tile, in fixed stages:
//!
//! 1. disk localization — circular Hough over the smoothed intensity image
//! 2. frame normalization — crop to the disk plus margin, pad clipped sides
//! 3. reference selection — pick a map tile by pixels-per-degree tier
//! 4. feature matching — oriented FAST + rotated BRIEF, ratio-test filtered
//! 5. geometry — RANSAC homography, then a perspective warp
//!
//! [`pipeline::run_request`] runs the whole thing for one uploaded
//! filename; the stage modules are public for callers that want the pieces.

pub mod config;
pub mod disk;
pub mod features;
pub mod frame;
pub mod homography;
pub mod pipeline;
pub mod preprocess;
pub mod reference;
pub mod warp;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Dirs, RegisterConfig};
pub use disk::{locate_disk, Circle, DiskConfig};
pub use features::{
    draw_matches, extract_features, match_features, Correspondence, Feature, FeatureConfig,
    Keypoint,
};
pub use frame::{crop_region, normalize_frame, pad_amounts, CropRegion, FrameConfig, PadAmounts};
pub use homography::{
    estimate_dlt, fit_homography_ransac, HomographyError, RansacHomographyConfig,
    RansacHomographyResult, RansacStats, MIN_CORRESPONDENCES,
};
pub use pipeline::{
    match_frames, register_frames, run_request, ArtifactStatus, Artifacts, MatchOutcome,
    RegisterError, Registration, RegistrationReport,
};
pub use preprocess::SmoothingConfig;
pub use reference::{
    load_reference, ppd_for_width, select_tier, LoadReferenceError, ReferenceConfig,
    ReferenceTile, PPD_TIERS,
};
pub use warp::warp_perspective;
