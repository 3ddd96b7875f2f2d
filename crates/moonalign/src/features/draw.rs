//! Match visualization: photo and reference side by side with connecting
//! lines for accepted correspondences. Drawn output only, no geometric
//! meaning beyond inspection.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

use super::Correspondence;

const LINE_COLOR: Rgb<u8> = Rgb([0, 220, 60]);
const POINT_COLOR: Rgb<u8> = Rgb([255, 180, 0]);
const POINT_RADIUS: i32 = 3;

/// Render the side-by-side correspondence visualization.
///
/// Photo on the left, reference on the right; each accepted match is a
/// ring at both endpoints plus a connecting line.
pub fn draw_matches(
    photo: &RgbImage,
    reference: &RgbImage,
    correspondences: &[Correspondence],
) -> RgbImage {
    let (pw, ph) = photo.dimensions();
    let (rw, rh) = reference.dimensions();
    let mut canvas = RgbImage::new(pw + rw, ph.max(rh));
    image::imageops::replace(&mut canvas, photo, 0, 0);
    image::imageops::replace(&mut canvas, reference, pw as i64, 0);

    let offset = pw as f32;
    for c in correspondences {
        let (px, py) = (c.photo[0] as f32, c.photo[1] as f32);
        let (rx, ry) = (c.reference[0] as f32 + offset, c.reference[1] as f32);

        draw_hollow_circle_mut(
            &mut canvas,
            (px.round() as i32, py.round() as i32),
            POINT_RADIUS,
            POINT_COLOR,
        );
        draw_hollow_circle_mut(
            &mut canvas,
            (rx.round() as i32, ry.round() as i32),
            POINT_RADIUS,
            POINT_COLOR,
        );
        draw_line_segment_mut(&mut canvas, (px, py), (rx, ry), LINE_COLOR);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_is_side_by_side() {
        let photo = RgbImage::new(100, 80);
        let reference = RgbImage::new(120, 90);
        let viz = draw_matches(&photo, &reference, &[]);
        assert_eq!(viz.dimensions(), (220, 90));
    }

    #[test]
    fn matches_leave_marks() {
        let photo = RgbImage::new(64, 64);
        let reference = RgbImage::new(64, 64);
        let corr = Correspondence {
            photo: [20.0, 20.0],
            reference: [40.0, 40.0],
            distance: 0,
        };
        let viz = draw_matches(&photo, &reference, &[corr]);
        let painted = viz.pixels().filter(|p| p.0 != [0, 0, 0]).count();
        assert!(painted > 0);
    }
}
