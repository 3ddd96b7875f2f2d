//! Reference map tile selection and resampling.
//!
//! The reference corpus is a fixed directory of pre-rendered map images,
//! one per pixels-per-degree tier, named `{tier:02}_{label}.jpg`. Tier
//! selection is a single ascending search over the ordered tier set: the
//! first tier whose resolution covers the computed ppd wins.

use std::path::{Path, PathBuf};

use image::RgbImage;

/// Available pixels-per-degree tiers, ascending.
pub const PPD_TIERS: [u32; 5] = [5, 7, 10, 15, 20];

/// Reference corpus parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ReferenceConfig {
    /// Filename label, e.g. `LRO_ref` for tiles named `05_LRO_ref.jpg`.
    pub label: String,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            label: "LRO_ref".to_string(),
        }
    }
}

/// A loaded reference tile, resampled to the requested dimensions.
#[derive(Debug, Clone)]
pub struct ReferenceTile {
    /// Tier the tile was rendered at (pixels per degree).
    pub tier: u32,
    /// Computed angular resolution of the frame the tile was selected for.
    pub ppd: u32,
    /// Tile pixels, already resized to the normalized frame's dimensions.
    pub image: RgbImage,
}

/// Angular resolution implied by a normalized frame width covering 360°.
///
/// Ties round to even, so a 3780 px frame (ppd 10.5) resolves to 10 and
/// stays on the tier-10 tile rather than jumping to tier 15.
pub fn ppd_for_width(width: u32) -> u32 {
    (width as f64 / 360.0).round_ties_even() as u32
}

/// First tier >= `ppd`, scanning ascending; the largest tier when `ppd`
/// exceeds them all.
pub fn select_tier(ppd: u32) -> u32 {
    PPD_TIERS
        .iter()
        .copied()
        .find(|&t| t >= ppd)
        .unwrap_or(PPD_TIERS[PPD_TIERS.len() - 1])
}

/// Deterministic tile filename for a tier.
pub fn tile_filename(tier: u32, label: &str) -> String {
    format!("{tier:02}_{label}.jpg")
}

/// Path of the tile for a tier under the reference directory.
pub fn tile_path(reference_dir: &Path, tier: u32, config: &ReferenceConfig) -> PathBuf {
    reference_dir.join(tile_filename(tier, &config.label))
}

/// Failure to read a tile, carrying the path that was attempted.
#[derive(Debug)]
pub struct LoadReferenceError {
    pub path: PathBuf,
    pub source: image::ImageError,
}

impl std::fmt::Display for LoadReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "failed to load reference tile {}: {}",
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for LoadReferenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Select, load, and resample the reference tile for a normalized frame.
///
/// The tile is resized to exactly `(width, height)`: the geometry solver
/// uses the reference's pixel dimensions as its warp canvas.
pub fn load_reference(
    reference_dir: &Path,
    width: u32,
    height: u32,
    config: &ReferenceConfig,
) -> Result<ReferenceTile, LoadReferenceError> {
    let ppd = ppd_for_width(width);
    let tier = select_tier(ppd);
    let path = tile_path(reference_dir, tier, config);
    tracing::info!("frame ppd {} -> tier {} ({})", ppd, tier, path.display());

    let tile = image::open(&path)
        .map_err(|source| LoadReferenceError {
            path: path.clone(),
            source,
        })?
        .to_rgb8();
    let resized = image::imageops::resize(&tile, width, height, image::imageops::FilterType::Triangle);
    Ok(ReferenceTile {
        tier,
        ppd,
        image: resized,
    })
}
