//! Scale/rotation-invariant feature detection, description, and matching.
//!
//! Oriented FAST keypoints over an image pyramid, 256-bit rotated BRIEF
//! descriptors, and two-nearest-neighbor Hamming matching with Lowe's
//! ratio test. Everything is seeded and deterministic: running the matcher
//! twice on the same pair of images yields the same correspondences.

mod brief;
mod detect;
mod draw;
mod matching;

pub use detect::extract_features;
pub use draw::draw_matches;
pub use matching::match_features;

/// A detected keypoint in base-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keypoint {
    /// X coordinate in the base (unscaled) image frame.
    pub x: f32,
    /// Y coordinate in the base (unscaled) image frame.
    pub y: f32,
    /// Corner response score.
    pub response: f32,
    /// Intensity-centroid orientation (radians).
    pub angle: f32,
    /// Pyramid level the keypoint was detected at.
    pub octave: u8,
    /// Scale of that level relative to the base image (>= 1).
    pub scale: f32,
}

/// A keypoint plus its 256-bit binary descriptor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Feature {
    pub keypoint: Keypoint,
    pub descriptor: [u8; 32],
}

/// An accepted photo-to-reference match.
///
/// At most one correspondence exists per photo keypoint: only the
/// ratio-test winner among its nearest reference descriptors is kept.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Correspondence {
    /// Matched point in the photo frame.
    pub photo: [f64; 2],
    /// Matched point in the reference frame.
    pub reference: [f64; 2],
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}

/// Feature detection and matching configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// FAST-9 corner threshold.
    pub fast_threshold: u8,
    /// Cap on keypoints kept per image (strongest first).
    pub max_keypoints: usize,
    /// Number of pyramid levels.
    pub n_levels: u8,
    /// Downscale factor between consecutive levels.
    pub scale_factor: f32,
    /// Keypoint NMS radius in level pixels.
    pub nms_radius: f32,
    /// Border (level pixels) inside which keypoints are discarded, so
    /// orientation and descriptor sampling stay in bounds.
    pub border: u32,
    /// Seed for the BRIEF sampling pattern.
    pub pattern_seed: u64,
    /// Lowe ratio: accept a match only if best < ratio * second_best.
    pub ratio: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            fast_threshold: 20,
            max_keypoints: 800,
            n_levels: 4,
            scale_factor: 1.2,
            nms_radius: 6.0,
            border: 20,
            pattern_seed: 0x5eed,
            ratio: 0.75,
        }
    }
}
