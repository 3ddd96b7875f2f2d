//! Rotated BRIEF binary descriptors.
//!
//! The 256 intensity-comparison point pairs are drawn once from a seeded
//! RNG over a 31x31 patch, so descriptors are reproducible across runs.

use image::GrayImage;
use rand::prelude::*;

/// Half-width of the sampling patch.
const PATCH_RADIUS: i32 = 15;

/// Number of intensity comparisons (descriptor bits).
const N_PAIRS: usize = 256;

/// The BRIEF test pattern: (x1, y1, x2, y2) offsets per bit.
pub(super) struct BriefPattern(Vec<[i32; 4]>);

impl BriefPattern {
    /// Generate the comparison pattern from a fixed seed.
    pub(super) fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut pairs = Vec::with_capacity(N_PAIRS);
        for _ in 0..N_PAIRS {
            pairs.push([
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
                rng.gen_range(-PATCH_RADIUS..=PATCH_RADIUS),
            ]);
        }
        Self(pairs)
    }
}

#[inline]
fn sample_clamped(img: &GrayImage, x: i32, y: i32) -> u8 {
    let px = x.clamp(0, img.width() as i32 - 1) as u32;
    let py = y.clamp(0, img.height() as i32 - 1) as u32;
    img.get_pixel(px, py)[0]
}

/// Compute the 256-bit descriptor at `(x, y)` in level coordinates,
/// rotating the test pattern by the keypoint orientation.
pub(super) fn describe(
    img: &GrayImage,
    x: f32,
    y: f32,
    angle: f32,
    pattern: &BriefPattern,
) -> [u8; 32] {
    let (sin_a, cos_a) = angle.sin_cos();
    let (xi, yi) = (x.round() as i32, y.round() as i32);

    let mut descriptor = [0u8; 32];
    for (bit, &[dx1, dy1, dx2, dy2]) in pattern.0.iter().enumerate() {
        let rotate = |dx: i32, dy: i32| -> (i32, i32) {
            let rx = dx as f32 * cos_a - dy as f32 * sin_a;
            let ry = dx as f32 * sin_a + dy as f32 * cos_a;
            (rx.round() as i32, ry.round() as i32)
        };
        let (rx1, ry1) = rotate(dx1, dy1);
        let (rx2, ry2) = rotate(dx2, dy2);

        let a = sample_clamped(img, xi + rx1, yi + ry1);
        let b = sample_clamped(img, xi + rx2, yi + ry2);
        if a < b {
            descriptor[bit / 8] |= 1 << (bit % 8);
        }
    }
    descriptor
}

/// Hamming distance between two descriptors.
#[inline]
pub(super) fn hamming(a: &[u8; 32], b: &[u8; 32]) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_is_deterministic() {
        let a = BriefPattern::new(7);
        let b = BriefPattern::new(7);
        assert_eq!(a.0, b.0);
        let c = BriefPattern::new(8);
        assert_ne!(a.0, c.0);
    }

    #[test]
    fn identical_patches_have_zero_distance() {
        let mut img = GrayImage::new(64, 64);
        for (x, y, p) in img.enumerate_pixels_mut() {
            p.0 = [((x * 7 + y * 13) % 251) as u8];
        }
        let pattern = BriefPattern::new(1);
        let d1 = describe(&img, 32.0, 32.0, 0.3, &pattern);
        let d2 = describe(&img, 32.0, 32.0, 0.3, &pattern);
        assert_eq!(hamming(&d1, &d2), 0);
    }

    #[test]
    fn distinct_patches_differ() {
        let mut img = GrayImage::new(64, 64);
        for (x, y, p) in img.enumerate_pixels_mut() {
            p.0 = [((x * 31 + y * 17) % 256) as u8];
        }
        let pattern = BriefPattern::new(1);
        let d1 = describe(&img, 20.0, 20.0, 0.0, &pattern);
        let d2 = describe(&img, 44.0, 40.0, 0.0, &pattern);
        assert!(hamming(&d1, &d2) > 0);
    }
}
