//! Shared image preprocessing: grayscale conversion and edge-preserving
//! smoothing.
//!
//! Both the disk locator and the feature matcher operate on the same
//! smoothed intensity image: a bilateral filter denoises the lunar surface
//! while keeping the limb and crater edges sharp.

use image::{GrayImage, RgbImage};

/// Bilateral smoothing parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SmoothingConfig {
    /// Filter window size in pixels (side length of the neighborhood).
    pub window_size: u32,
    /// Range (intensity) sigma.
    pub sigma_color: f32,
    /// Spatial sigma.
    pub sigma_spatial: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            window_size: 9,
            sigma_color: 75.0,
            sigma_spatial: 75.0,
        }
    }
}

/// Convert a color photo to single-channel intensity.
pub fn to_gray(img: &RgbImage) -> GrayImage {
    image::imageops::grayscale(img)
}

/// Apply edge-preserving bilateral smoothing.
pub fn smooth(gray: &GrayImage, config: &SmoothingConfig) -> GrayImage {
    imageproc::filter::bilateral_filter(
        gray,
        config.window_size,
        config.sigma_color,
        config.sigma_spatial,
    )
}

/// Grayscale + smoothing in one step.
pub fn gray_smoothed(img: &RgbImage, config: &SmoothingConfig) -> GrayImage {
    smooth(&to_gray(img), config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_preserves_dimensions() {
        let img = RgbImage::new(64, 48);
        let gray = gray_smoothed(&img, &SmoothingConfig::default());
        assert_eq!(gray.dimensions(), (64, 48));
    }

    #[test]
    fn flat_region_stays_flat() {
        let mut img = GrayImage::new(32, 32);
        for p in img.pixels_mut() {
            p.0 = [128];
        }
        let out = smooth(&img, &SmoothingConfig::default());
        for p in out.pixels() {
            assert_eq!(p.0[0], 128);
        }
    }
}
