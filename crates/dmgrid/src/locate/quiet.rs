//! Quiet-zone verification and dashed-side tracking.
//!
//! A genuine symbol has a dark quiet zone just outside its two solid sides
//! and alternating (dashed) borders on the two opposite sides. The blank-L
//! check confirms the former; the dashed tracker sweeps rays outward from
//! each leg end to find the ray that clears the symbol while a parallel
//! track one step inside still crosses at least three dashes. The two
//! winning rays intersect at the corner opposite the L.

use image::GrayImage;

use super::calibrate::{intersect, recompute_p0};
use super::trace::{bright_fraction, dash_count, move_pixel, round_coord};
use super::{distance, LShape};

/// Steps a leg end may move outward while looking for the quiet zone.
const BLANK_STEPS: i32 = 10;
/// A ray is clear of the symbol below this bright fraction.
const CLEAR_RATE: f64 = 0.05;
/// Outward offsets tried when tracking a dashed side.
const TRACK_LIMIT: i32 = 15;
/// Angular sweep around the perpendicular, degrees.
const ROTATE_LIMIT: i32 = 15;
/// A dashed side must show at least this many bright runs.
const MIN_DASHES: i32 = 3;
/// Legs are padded inward until this bright fraction is met.
const PAD_RATE: f64 = 0.6;
const PAD_TRIES: i32 = 5;

/// Confirm the quiet zone beside both solid sides, settling `p1`/`p2` onto
/// its inner edge and recomputing the corner.
pub(crate) fn check_blank_l(binary: &GrayImage, l: &mut LShape) -> bool {
    let p0 = l.p0.point;
    let length1 = round_coord(distance(p0, l.p1.point));
    let length2 = round_coord(distance(p0, l.p2.point));
    let out1 = l.angle1 + 90.0;
    let out2 = l.angle2 - 90.0;

    let mut p1 = l.p1.point;
    let mut moved1 = 0;
    for i in 0..BLANK_STEPS {
        p1 = move_pixel(p1, out1, 1, -1);
        moved1 += 1;
        if bright_fraction(binary, p1, l.angle1, length1 + i, 1) < CLEAR_RATE {
            break;
        }
    }
    if moved1 == BLANK_STEPS {
        return false;
    }

    let mut p2 = l.p2.point;
    let mut moved2 = 0;
    for i in 0..BLANK_STEPS {
        p2 = move_pixel(p2, out2, 1, -1);
        moved2 += 1;
        if bright_fraction(binary, p2, l.angle2, length2 + i, 1) < CLEAR_RATE {
            break;
        }
    }
    if moved2 == BLANK_STEPS {
        return false;
    }

    l.p1.point = p1;
    l.p2.point = p2;
    recompute_p0(l);
    true
}

/// Track both dashed sides and set `px`. `padding` pulls the leg ends
/// inward along their legs before the sweep starts.
pub(crate) fn track_dashed_sides(binary: &GrayImage, padding: i32, l: &mut LShape) -> bool {
    let p0 = l.p0.point;
    let length1 = distance(p0, l.p1.point);
    let length2 = distance(p0, l.p2.point);

    let p1 = move_pixel(l.p1.point, l.angle1, padding, 1);
    let first = sweep_side(binary, p1, l.angle1, length2, false);
    let (offset1, angle_x1) = match first {
        Some(found) => found,
        None => return false,
    };
    l.p1.point = move_pixel(p1, l.angle1, offset1 + 1, -1);

    let p2 = move_pixel(l.p2.point, l.angle2, padding, 1);
    let second = sweep_side(binary, p2, l.angle2, length1, true);
    let (offset2, angle_x2) = match second {
        Some(found) => found,
        None => return false,
    };
    l.p2.point = move_pixel(p2, l.angle2, offset2 + 1, -1);

    l.px = intersect(l.p2.point, angle_x2, l.p1.point, angle_x1);
    true
}

/// Sweep outward offsets from a leg end. At each offset, rotate around the
/// perpendicular until a ray two steps further out clears the symbol; count
/// dashes on the parallel track at the offset itself. The offset with the
/// most dashes wins.
fn sweep_side(
    binary: &GrayImage,
    leg_end: imageproc::point::Point<i32>,
    leg_angle: f64,
    track_length: f64,
    reverse_sweep: bool,
) -> Option<(i32, f64)> {
    let mut angles = [0.0f64; TRACK_LIMIT as usize];
    let mut dashes = [-1i32; TRACK_LIMIT as usize];

    for j in 0..TRACK_LIMIT {
        let track_origin = move_pixel(leg_end, leg_angle, j, -1);
        let clear_origin = move_pixel(leg_end, leg_angle, j + 2, -1);

        let sweep: Box<dyn Iterator<Item = i32>> = if reverse_sweep {
            Box::new((-ROTATE_LIMIT..=ROTATE_LIMIT).rev())
        } else {
            Box::new(-ROTATE_LIMIT..=ROTATE_LIMIT)
        };
        for rotate in sweep {
            let angle = if reverse_sweep {
                leg_angle + 90.0 + rotate as f64
            } else {
                leg_angle - 90.0 + rotate as f64
            };
            let length = round_coord(track_length / (rotate as f64).to_radians().cos());
            if bright_fraction(binary, clear_origin, angle, length, -1) < CLEAR_RATE {
                angles[j as usize] = angle;
                dashes[j as usize] = dash_count(binary, track_origin, angle, length, -1) as i32;
                break;
            }
        }
    }

    let mut best = 0i32;
    let mut best_j = 0usize;
    for (j, &d) in dashes.iter().enumerate() {
        if d > best {
            best = d;
            best_j = j;
        }
    }
    if best < MIN_DASHES {
        return None;
    }
    Some((best_j as i32, angles[best_j]))
}

/// Push both legs inward until they sit on the solid border, optionally
/// backing out one pixel afterwards, then recompute the corner.
pub(crate) fn pad_l_shape(binary: &GrayImage, padding_back: bool, l: &mut LShape) {
    let p0 = l.p0.point;
    let length1 = round_coord(distance(p0, l.p1.point));
    let length2 = round_coord(distance(p0, l.p2.point));
    let in1 = l.angle1 + 90.0;
    let in2 = l.angle2 - 90.0;

    let mut p1 = l.p1.point;
    for i in 0..PAD_TRIES {
        if bright_fraction(binary, p1, l.angle1, length1 + i, 1) >= PAD_RATE {
            break;
        }
        p1 = move_pixel(p1, in1, 1, 1);
    }
    if padding_back {
        p1 = move_pixel(p1, in1, 1, -1);
    }

    let mut p2 = l.p2.point;
    for i in 0..PAD_TRIES {
        if bright_fraction(binary, p2, l.angle2, length2 + i, 1) >= PAD_RATE {
            break;
        }
        p2 = move_pixel(p2, in2, 1, 1);
    }
    if padding_back {
        p2 = move_pixel(p2, in2, 1, -1);
    }

    l.p1.point = p1;
    l.p2.point = p2;
    recompute_p0(l);
}
