//! Synthetic image renderers shared by unit tests.

use image::{GrayImage, Rgb, RgbImage};
use rand::prelude::*;

/// Render a filled antialiased disk on a uniform background.
pub(crate) fn draw_disk_image(
    width: u32,
    height: u32,
    center: [f32; 2],
    radius: f32,
    fg: u8,
    bg: u8,
) -> RgbImage {
    let mut img = RgbImage::new(width, height);
    for (x, y, p) in img.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - center[0];
        let dy = y as f32 + 0.5 - center[1];
        let d = (dx * dx + dy * dy).sqrt();
        // One-pixel soft edge so the limb has a finite gradient.
        let t = (radius + 0.5 - d).clamp(0.0, 1.0);
        let v = (bg as f32 + t * (fg as f32 - bg as f32)).round() as u8;
        p.0 = [v, v, v];
    }
    img
}

/// Render a field of random bright blobs, deterministic per seed.
///
/// Blobs overlap and vary in size and intensity, giving FAST plenty of
/// corners and BRIEF distinctive neighborhoods.
pub(crate) fn draw_blob_image(width: u32, height: u32, n_blobs: usize, seed: u64) -> GrayImage {
    let mut img = GrayImage::new(width, height);
    for p in img.pixels_mut() {
        p.0 = [30];
    }
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..n_blobs {
        let cx = rng.gen_range(0.0..width as f32);
        let cy = rng.gen_range(0.0..height as f32);
        let r = rng.gen_range(3.0..12.0f32);
        let v = rng.gen_range(120..=255u32) as u8;
        stamp(&mut img, cx, cy, r, v);
    }
    img
}

/// RGB variant of [`draw_blob_image`], same geometry per seed.
pub(crate) fn draw_blob_rgb_image(
    width: u32,
    height: u32,
    n_blobs: usize,
    seed: u64,
) -> RgbImage {
    let gray = draw_blob_image(width, height, n_blobs, seed);
    let mut img = RgbImage::new(width, height);
    for (x, y, p) in img.enumerate_pixels_mut() {
        let v = gray.get_pixel(x, y)[0];
        *p = Rgb([v, v, v]);
    }
    img
}

fn stamp(img: &mut GrayImage, cx: f32, cy: f32, r: f32, v: u8) {
    let (w, h) = img.dimensions();
    let x0 = (cx - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil() as u32).min(w.saturating_sub(1));
    let y0 = (cy - r).floor().max(0.0) as u32;
    let y1 = ((cy + r).ceil() as u32).min(h.saturating_sub(1));
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r * r {
                img.get_pixel_mut(x, y).0 = [v];
            }
        }
    }
}
