//! Perspective rectification of the located quadrilateral.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use imageproc::point::Point;

use super::trace::round_coord;
use super::{distance, CornerPosition, LShape};

/// Pixels each corner moves outward before warping.
const GROW: i32 = 2;

/// Grow the quadrilateral `{p1, p0, p2, px}` outward per corner. Fails when
/// a grown corner leaves the image.
pub(crate) fn enlarge_l_shape(l: &mut LShape, width: u32, height: u32) -> bool {
    let mut corners = [l.p1.point, l.p0.point, l.p2.point, l.px];
    let deltas: [(i32, i32); 4] = match l.position {
        CornerPosition::TopLeft => [(GROW, -GROW), (-GROW, -GROW), (-GROW, GROW), (GROW, GROW)],
        CornerPosition::BottomLeft => [(-GROW, -GROW), (-GROW, GROW), (GROW, GROW), (GROW, -GROW)],
        CornerPosition::BottomRight => [(-GROW, GROW), (GROW, GROW), (GROW, -GROW), (-GROW, -GROW)],
        CornerPosition::TopRight => [(GROW, GROW), (GROW, -GROW), (-GROW, -GROW), (-GROW, GROW)],
    };
    for (corner, (dx, dy)) in corners.iter_mut().zip(deltas) {
        corner.x += dx;
        corner.y += dy;
        if corner.x < 0 || corner.x >= width as i32 || corner.y < 0 || corner.y >= height as i32 {
            return false;
        }
    }
    l.p1.point = corners[0];
    l.p0.point = corners[1];
    l.p2.point = corners[2];
    l.px = corners[3];
    true
}

/// Warp the quadrilateral onto a square crop.
///
/// The destination side defaults to the longest quadrilateral side. Corners
/// map `p1→(0,0)`, `p0→(0,s)`, `p2→(s,s)`, `px→(s,0)`, which puts the L on
/// the left and bottom of the crop.
pub(crate) fn warp_l_shape(
    src: &GrayImage,
    l: &LShape,
    side: Option<u32>,
) -> Option<(GrayImage, u32)> {
    let quad = [l.p1.point, l.p0.point, l.p2.point, l.px];
    let side = match side {
        Some(s) => s,
        None => {
            let mut longest = 0.0f64;
            for i in 0..4 {
                longest = longest.max(distance(quad[i], quad[(i + 1) % 4]));
            }
            round_coord(longest).max(0) as u32
        }
    };
    if side == 0 {
        return None;
    }

    let from = quad.map(|p| (p.x as f32, p.y as f32));
    let s = side as f32;
    let to = [(0.0, 0.0), (0.0, s), (s, s), (s, 0.0)];
    let projection = Projection::from_control_points(from, to)?;

    let mut out = GrayImage::new(side, side);
    warp_into(src, &projection, Interpolation::Bilinear, Luma([0u8]), &mut out);
    Some((out, side))
}
