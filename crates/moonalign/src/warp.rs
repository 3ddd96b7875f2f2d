//! Perspective warp of the normalized photo into the reference frame.
//!
//! The homography maps photo → reference, so the warp inverse-maps each
//! output pixel through `H⁻¹` and bilinearly samples the photo. The output
//! canvas takes the reference's dimensions.

use image::{Rgb, RgbImage};
use nalgebra::Matrix3;

use crate::homography::project;

/// Bilinear RGB sample at a fractional position; black outside the image.
#[inline]
fn sample_bilinear(img: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (w, h) = img.dimensions();
    if !x.is_finite() || !y.is_finite() || x < 0.0 || y < 0.0 {
        return Rgb([0, 0, 0]);
    }
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    if x0 + 1 >= w || y0 + 1 >= h {
        return Rgb([0, 0, 0]);
    }
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p00 = img.get_pixel(x0, y0).0;
    let p10 = img.get_pixel(x0 + 1, y0).0;
    let p01 = img.get_pixel(x0, y0 + 1).0;
    let p11 = img.get_pixel(x0 + 1, y0 + 1).0;

    let mut out = [0u8; 3];
    for ch in 0..3 {
        let top = p00[ch] as f64 * (1.0 - fx) + p10[ch] as f64 * fx;
        let bottom = p01[ch] as f64 * (1.0 - fx) + p11[ch] as f64 * fx;
        out[ch] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Warp `photo` onto a `(out_w, out_h)` canvas using the photo→reference
/// homography `h`. Returns `None` when `h` is not invertible.
pub fn warp_perspective(
    photo: &RgbImage,
    h: &Matrix3<f64>,
    out_w: u32,
    out_h: u32,
) -> Option<RgbImage> {
    let h_inv = h.try_inverse()?;
    let mut out = RgbImage::new(out_w, out_h);
    for y in 0..out_h {
        for x in 0..out_w {
            let src = project(&h_inv, x as f64, y as f64);
            out.put_pixel(x, y, sample_bilinear(photo, src[0], src[1]));
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(w: u32, h: u32) -> RgbImage {
        let mut img = RgbImage::new(w, h);
        for (x, y, p) in img.enumerate_pixels_mut() {
            p.0 = [(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8];
        }
        img
    }

    #[test]
    fn identity_warp_preserves_pixels() {
        let img = gradient_image(64, 48);
        let out = warp_perspective(&img, &Matrix3::identity(), 64, 48).unwrap();
        // Interior pixels survive untouched; the last row/column falls
        // outside the bilinear support and goes black.
        for y in 0..47 {
            for x in 0..63 {
                assert_eq!(out.get_pixel(x, y), img.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn translation_warp_shifts_content() {
        let img = gradient_image(64, 64);
        // H maps photo -> reference with +10 px in x.
        let h = Matrix3::new(1.0, 0.0, 10.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let out = warp_perspective(&img, &h, 64, 64).unwrap();
        assert_eq!(out.get_pixel(30, 20), img.get_pixel(20, 20));
        // Pixels with no preimage are black.
        assert_eq!(out.get_pixel(5, 20).0, [0, 0, 0]);
    }

    #[test]
    fn singular_matrix_is_rejected() {
        let img = gradient_image(16, 16);
        assert!(warp_perspective(&img, &Matrix3::zeros(), 16, 16).is_none());
    }
}
