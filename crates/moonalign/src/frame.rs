//! Frame normalization: crop the photo to the detected disk and pad out
//! the portions the original frame clipped.
//!
//! Two independent derivations from (photo, circle):
//! - crop bounds: `center ± (radius + margin)`, clamped to the image;
//! - pad amounts: overflow of `center ± radius` past each image edge.
//!
//! Crop first, then zero-filled border padding, so the disk ends up
//! centered with uniform margin regardless of clipping at source edges.

use image::RgbImage;

use crate::disk::Circle;

/// Frame normalization parameters.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FrameConfig {
    /// Margin added around the disk when cropping (pixels).
    pub margin_px: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self { margin_px: 15 }
    }
}

/// Sub-rectangle to extract, half-open per axis: columns [left, right),
/// rows [top, bottom). Always within the source extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CropRegion {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl CropRegion {
    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Border widths to synthesize on each side of the cropped image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PadAmounts {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

#[inline]
fn clamp_to(v: f32, extent: u32) -> u32 {
    v.round().clamp(0.0, extent as f32) as u32
}

/// Crop bounds around the disk, clamped to the source extents.
pub fn crop_region(circle: &Circle, width: u32, height: u32, margin_px: u32) -> CropRegion {
    let reach = circle.r + margin_px as f32;
    CropRegion {
        top: clamp_to(circle.y - reach, height),
        bottom: clamp_to(circle.y + reach, height),
        left: clamp_to(circle.x - reach, width),
        right: clamp_to(circle.x + reach, width),
    }
}

/// Border amounts compensating for disk overflow past the source edges.
pub fn pad_amounts(circle: &Circle, width: u32, height: u32) -> PadAmounts {
    let overflow = |v: f32| (-v).max(0.0).round() as u32;
    PadAmounts {
        top: overflow(circle.y - circle.r),
        bottom: overflow(height as f32 - (circle.y + circle.r)),
        left: overflow(circle.x - circle.r),
        right: overflow(width as f32 - (circle.x + circle.r)),
    }
}

/// Crop the photo around the disk, then pad with a zero-filled border.
///
/// Returns `None` when the crop region is degenerate (zero area), which
/// happens for a zero-radius circle at the image origin.
pub fn normalize_frame(photo: &RgbImage, circle: &Circle, config: &FrameConfig) -> Option<RgbImage> {
    let (w, h) = photo.dimensions();
    let crop = crop_region(circle, w, h, config.margin_px);
    if crop.is_empty() {
        return None;
    }
    let pad = pad_amounts(circle, w, h);

    let cropped = image::imageops::crop_imm(photo, crop.left, crop.top, crop.width(), crop.height())
        .to_image();

    if pad == PadAmounts::default() {
        return Some(cropped);
    }

    let out_w = crop.width() + pad.left + pad.right;
    let out_h = crop.height() + pad.top + pad.bottom;
    let mut canvas = RgbImage::new(out_w, out_h);
    image::imageops::replace(&mut canvas, &cropped, pad.left as i64, pad.top as i64);
    Some(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f32, y: f32, r: f32) -> Circle {
        Circle { x, y, r }
    }

    #[test]
    fn fully_contained_disk_crops_without_padding() {
        // 400x400 photo, centered disk r=150.
        let c = circle(200.0, 200.0, 150.0);
        let crop = crop_region(&c, 400, 400, 15);
        assert_eq!(
            crop,
            CropRegion {
                top: 35,
                bottom: 365,
                left: 35,
                right: 365
            }
        );
        assert_eq!(pad_amounts(&c, 400, 400), PadAmounts::default());

        let photo = RgbImage::new(400, 400);
        let frame = normalize_frame(&photo, &c, &FrameConfig::default()).unwrap();
        assert_eq!(frame.dimensions(), (330, 330));
    }

    #[test]
    fn clipped_disk_is_padded_back_to_square() {
        // Disk pokes 40 px past the left edge.
        let c = circle(60.0, 150.0, 100.0);
        let (w, h) = (400, 300);
        let crop = crop_region(&c, w, h, 15);
        assert_eq!(crop.left, 0);
        assert_eq!(crop.right, 175);
        let pad = pad_amounts(&c, w, h);
        assert_eq!(pad.left, 40);
        assert_eq!(pad.right, 0);

        let photo = RgbImage::new(w, h);
        let frame = normalize_frame(&photo, &c, &FrameConfig::default()).unwrap();
        // Output dims = crop dims + pads, per axis.
        assert_eq!(frame.width(), crop.width() + pad.left + pad.right);
        assert_eq!(frame.height(), crop.height() + pad.top + pad.bottom);
    }

    #[test]
    fn crop_bounds_always_within_source() {
        let c = circle(390.0, 10.0, 120.0);
        let crop = crop_region(&c, 400, 300, 15);
        assert!(crop.right <= 400);
        assert!(crop.bottom <= 300);
        assert!(!crop.is_empty());
    }

    #[test]
    fn null_circle_yields_degenerate_region() {
        let c = circle(0.0, 0.0, 0.0);
        let photo = RgbImage::new(100, 100);
        // Margin still produces a sliver; with zero margin the region is empty.
        let cfg = FrameConfig { margin_px: 0 };
        assert!(normalize_frame(&photo, &c, &cfg).is_none());
    }

    #[test]
    fn padded_border_is_zero_filled() {
        let mut photo = RgbImage::new(100, 100);
        for p in photo.pixels_mut() {
            p.0 = [200, 200, 200];
        }
        let c = circle(10.0, 50.0, 30.0);
        let frame = normalize_frame(&photo, &c, &FrameConfig::default()).unwrap();
        // Leftmost column lies in the synthesized border.
        assert_eq!(frame.get_pixel(0, frame.height() / 2).0, [0, 0, 0]);
    }
}
