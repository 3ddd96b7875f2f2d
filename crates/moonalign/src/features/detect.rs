//! Oriented FAST keypoint detection over an image pyramid.

use image::GrayImage;
use imageproc::corners::{corners_fast9, Corner};

use super::brief::{describe, BriefPattern};
use super::{Feature, FeatureConfig, Keypoint};

/// Radius of the intensity-centroid orientation window.
const ORIENTATION_RADIUS: i32 = 15;

/// Detect keypoints and compute descriptors for one image.
///
/// FAST-9 corners are extracted at each pyramid level, suppressed by
/// response within `nms_radius`, oriented by intensity centroid, and
/// described with rotated BRIEF on the level they were found at. Keypoint
/// coordinates are mapped back to the base image frame. The result is
/// sorted by response, strongest first, capped at `max_keypoints`.
pub fn extract_features(gray: &GrayImage, config: &FeatureConfig) -> Vec<Feature> {
    let pattern = BriefPattern::new(config.pattern_seed);
    let mut features = Vec::new();

    let mut level_img = gray.clone();
    let mut scale = 1.0f32;
    for octave in 0..config.n_levels {
        if octave > 0 {
            let new_w = (level_img.width() as f32 / config.scale_factor) as u32;
            let new_h = (level_img.height() as f32 / config.scale_factor) as u32;
            if new_w < 64 || new_h < 64 {
                break;
            }
            level_img = image::imageops::resize(
                &level_img,
                new_w,
                new_h,
                image::imageops::FilterType::Triangle,
            );
            scale *= config.scale_factor;
        }

        let corners = detect_level_corners(&level_img, config);
        for c in corners {
            let angle = intensity_centroid_angle(&level_img, c.x, c.y);
            let descriptor = describe(&level_img, c.x as f32, c.y as f32, angle, &pattern);
            features.push(Feature {
                keypoint: Keypoint {
                    x: c.x as f32 * scale,
                    y: c.y as f32 * scale,
                    response: c.score,
                    angle,
                    octave,
                    scale,
                },
                descriptor,
            });
        }
    }

    features.sort_by(|a, b| {
        b.keypoint
            .response
            .partial_cmp(&a.keypoint.response)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    features.truncate(config.max_keypoints);
    tracing::debug!("{} keypoints extracted", features.len());
    features
}

/// FAST corners on one level, border-filtered and radius-suppressed.
fn detect_level_corners(img: &GrayImage, config: &FeatureConfig) -> Vec<Corner> {
    let (w, h) = img.dimensions();
    let border = config.border;
    if w <= 2 * border || h <= 2 * border {
        return Vec::new();
    }

    let mut corners: Vec<Corner> = corners_fast9(img, config.fast_threshold)
        .into_iter()
        .filter(|c| c.x >= border && c.y >= border && c.x < w - border && c.y < h - border)
        .collect();
    corners.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    // Greedy radius NMS: accept strongest-first, reject anything closer
    // than nms_radius to an accepted corner.
    let r_sq = config.nms_radius * config.nms_radius;
    let mut kept: Vec<Corner> = Vec::new();
    'outer: for c in corners {
        for k in &kept {
            let dx = c.x as f32 - k.x as f32;
            let dy = c.y as f32 - k.y as f32;
            if dx * dx + dy * dy < r_sq {
                continue 'outer;
            }
        }
        kept.push(c);
    }
    kept
}

/// Orientation from first image moments within a circular window.
fn intensity_centroid_angle(img: &GrayImage, x: u32, y: u32) -> f32 {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let (xi, yi) = (x as i32, y as i32);
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        for dx in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
            if dx * dx + dy * dy > ORIENTATION_RADIUS * ORIENTATION_RADIUS {
                continue;
            }
            let px = xi + dx;
            let py = yi + dy;
            if px < 0 || py < 0 || px >= w || py >= h {
                continue;
            }
            let v = img.get_pixel(px as u32, py as u32)[0] as f32;
            m10 += v * dx as f32;
            m01 += v * dy as f32;
        }
    }
    m01.atan2(m10)
}
