//! Gradient-voting circle accumulator and radius recovery.

use image::GrayImage;

use super::{Circle, DiskConfig};

/// Deposit a weighted vote into the accumulator using bilinear interpolation.
#[inline]
fn bilinear_add(accum: &mut [f32], stride: usize, x: f32, y: f32, weight: f32) {
    let x0 = x as usize;
    let y0 = y as usize;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let base = y0 * stride + x0;
    accum[base] += weight * (1.0 - fx) * (1.0 - fy);
    accum[base + 1] += weight * fx * (1.0 - fy);
    accum[base + stride] += weight * (1.0 - fx) * fy;
    accum[base + stride + 1] += weight * fx * fy;
}

/// Strong-gradient pixel retained for voting and radius recovery.
struct EdgePixel {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    mag: f32,
}

fn collect_edge_pixels(gray: &GrayImage, grad_threshold: f32) -> Vec<EdgePixel> {
    let (w, h) = gray.dimensions();
    let gx = imageproc::gradients::horizontal_scharr(gray);
    let gy = imageproc::gradients::vertical_scharr(gray);
    let gx_raw = gx.as_raw();
    let gy_raw = gy.as_raw();

    let mut max_mag_sq: f32 = 0.0;
    for (&gxv, &gyv) in gx_raw.iter().zip(gy_raw.iter()) {
        let (gxv, gyv) = (gxv as f32, gyv as f32);
        max_mag_sq = max_mag_sq.max(gxv * gxv + gyv * gyv);
    }
    if max_mag_sq < 1e-6 {
        return Vec::new();
    }
    let threshold_sq = (grad_threshold * grad_threshold) * max_mag_sq;

    let stride = w as usize;
    let mut edges = Vec::new();
    for y in 0..h as usize {
        for x in 0..stride {
            let idx = y * stride + x;
            let gxv = gx_raw[idx] as f32;
            let gyv = gy_raw[idx] as f32;
            let mag_sq = gxv * gxv + gyv * gyv;
            if mag_sq < threshold_sq {
                continue;
            }
            let mag = mag_sq.sqrt();
            edges.push(EdgePixel {
                x: x as f32,
                y: y as f32,
                dx: gxv / mag,
                dy: gyv / mag,
                mag,
            });
        }
    }
    edges
}

/// Detect candidate circles via gradient voting.
///
/// Returns candidates sorted by accumulator score (highest first), each with
/// its radius recovered from the edge-distance histogram. Candidates whose
/// boundary support falls below `min_arc_frac` of the circumference are
/// dropped.
pub(crate) fn find_circles(
    gray: &GrayImage,
    r_min: f32,
    r_max: f32,
    config: &DiskConfig,
) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 8 || h < 8 || r_max < r_min || r_min <= 0.0 {
        return Vec::new();
    }

    let edges = collect_edge_pixels(gray, config.grad_threshold);
    if edges.is_empty() {
        return Vec::new();
    }

    // Radii are sampled coarsely: the accumulator only localizes centers,
    // the exact radius comes from the histogram afterwards.
    let n_samples = config.n_radius_samples.max(2);
    let step = (r_max - r_min) / (n_samples - 1) as f32;
    let radii: Vec<f32> = (0..n_samples).map(|i| r_min + step * i as f32).collect();

    let stride = w as usize;
    let mut accum = vec![0.0f32; stride * h as usize];
    let x_limit = (w - 1) as f32;
    let y_limit = (h - 1) as f32;

    for e in &edges {
        for &r in &radii {
            // Vote along +gradient and -gradient directions.
            let (vx, vy) = (e.x + e.dx * r, e.y + e.dy * r);
            if vx >= 0.0 && vx < x_limit && vy >= 0.0 && vy < y_limit {
                bilinear_add(&mut accum, stride, vx, vy, e.mag);
            }
            let (vx, vy) = (e.x - e.dx * r, e.y - e.dy * r);
            if vx >= 0.0 && vx < x_limit && vy >= 0.0 && vy < y_limit {
                bilinear_add(&mut accum, stride, vx, vy, e.mag);
            }
        }
    }

    let accum_img = image::ImageBuffer::<image::Luma<f32>, Vec<f32>>::from_raw(w, h, accum)
        .expect("accumulator dimensions match");
    let smoothed = imageproc::filter::gaussian_blur_f32(&accum_img, config.accum_sigma);
    let data = smoothed.as_raw();

    let max_val = data.iter().cloned().fold(0.0f32, f32::max);
    if max_val < 1e-6 {
        return Vec::new();
    }
    let vote_threshold = config.min_vote_frac * max_val;

    // Non-maximum suppression over the accumulator.
    let nms_r = config.nms_radius.ceil() as i32;
    let mut peaks: Vec<(f32, f32, f32)> = Vec::new();
    for y in nms_r..(h as i32 - nms_r) {
        for x in nms_r..(w as i32 - nms_r) {
            let idx = y as usize * stride + x as usize;
            let val = data[idx];
            if val < vote_threshold {
                continue;
            }
            let mut is_max = true;
            'scan: for dy in -nms_r..=nms_r {
                for dx in -nms_r..=nms_r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nidx = (y + dy) as usize * stride + (x + dx) as usize;
                    if data[nidx] > val || (data[nidx] == val && nidx < idx) {
                        is_max = false;
                        break 'scan;
                    }
                }
            }
            if is_max {
                peaks.push((x as f32, y as f32, val));
            }
        }
    }
    peaks.sort_by(|a, b| b.2.partial_cmp(&a.2).unwrap());
    peaks.truncate(config.max_candidates);

    peaks
        .iter()
        .filter_map(|&(cx, cy, _)| {
            estimate_radius(&edges, cx, cy, r_min, r_max, config.min_arc_frac)
                .map(|r| Circle { x: cx, y: cy, r })
        })
        .collect()
}

/// Recover the radius at a candidate center from the mode of the
/// edge-distance histogram, with a 3-bin parabolic refinement.
fn estimate_radius(
    edges: &[EdgePixel],
    cx: f32,
    cy: f32,
    r_min: f32,
    r_max: f32,
    min_arc_frac: f32,
) -> Option<f32> {
    let n_bins = (r_max - r_min).ceil() as usize + 1;
    let mut hist = vec![0.0f32; n_bins];
    for e in edges {
        let d = ((e.x - cx).powi(2) + (e.y - cy).powi(2)).sqrt();
        if d < r_min || d > r_max {
            continue;
        }
        let bin = (d - r_min) as usize;
        hist[bin.min(n_bins - 1)] += 1.0;
    }

    // Box-smooth so boundary votes split across adjacent bins still peak.
    let smoothed: Vec<f32> = (0..n_bins)
        .map(|i| {
            let lo = i.saturating_sub(1);
            let hi = (i + 1).min(n_bins - 1);
            hist[lo..=hi].iter().sum::<f32>() / (hi - lo + 1) as f32
        })
        .collect();

    let (best_bin, &best_count) = smoothed
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())?;

    let radius = r_min + best_bin as f32;
    let min_support = min_arc_frac * 2.0 * std::f32::consts::PI * radius;
    if best_count < min_support.max(8.0) {
        return None;
    }

    // Parabolic peak interpolation for sub-bin radius.
    if best_bin > 0 && best_bin + 1 < n_bins {
        let (l, c, r) = (
            smoothed[best_bin - 1],
            smoothed[best_bin],
            smoothed[best_bin + 1],
        );
        let denom = l - 2.0 * c + r;
        if denom.abs() > 1e-6 {
            let offset = (0.5 * (l - r) / denom).clamp(-0.5, 0.5);
            return Some(radius + offset);
        }
    }
    Some(radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{self, SmoothingConfig};
    use crate::test_utils::draw_disk_image;

    #[test]
    fn tiny_image_yields_nothing() {
        let gray = GrayImage::new(4, 4);
        assert!(find_circles(&gray, 1.0, 2.0, &DiskConfig::default()).is_empty());
    }

    #[test]
    fn inverted_bounds_yield_nothing() {
        let gray = GrayImage::new(64, 64);
        assert!(find_circles(&gray, 20.0, 10.0, &DiskConfig::default()).is_empty());
    }

    #[test]
    fn bright_disk_produces_candidate_near_center() {
        let rgb = draw_disk_image(200, 200, [100.0, 100.0], 60.0, 240, 12);
        let gray = preprocess::gray_smoothed(&rgb, &SmoothingConfig::default());
        let circles = find_circles(&gray, 50.0, 100.0, &DiskConfig::default());
        assert!(!circles.is_empty());
        let best = circles[0];
        assert!((best.x - 100.0).abs() < 5.0);
        assert!((best.y - 100.0).abs() < 5.0);
        assert!((best.r - 60.0).abs() < 4.0);
    }
}
