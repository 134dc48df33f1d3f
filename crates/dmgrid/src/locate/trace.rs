//! Pixel ray walking over binary images.
//!
//! Rays are parameterized the way the locator reasons about them: a start
//! point, an angle in degrees, a step count and a direction sign. A step
//! moves `(-cos θ, +sin θ)` scaled by the direction, so angle 0 with
//! direction −1 walks right and angle 90 with direction +1 walks down.

use image::GrayImage;
use imageproc::point::Point;

/// Round half-up, matching integer pixel snapping throughout the locator.
#[inline]
pub(crate) fn round_coord(v: f64) -> i32 {
    (v + 0.5).floor() as i32
}

/// Sample a pixel, treating everything outside the image as dark.
#[inline]
pub(crate) fn pixel_value(image: &GrayImage, point: Point<i32>) -> u8 {
    if point.x < 0 || point.y < 0 {
        return 0;
    }
    let (x, y) = (point.x as u32, point.y as u32);
    if x >= image.width() || y >= image.height() {
        return 0;
    }
    image.get_pixel(x, y).0[0]
}

/// Walk `step` pixels from `p0` along `angle_deg` with the given direction
/// sign.
pub(crate) fn move_pixel(p0: Point<i32>, angle_deg: f64, step: i32, direction: i32) -> Point<i32> {
    let rad = angle_deg.to_radians();
    let x = p0.x as f64 - direction as f64 * rad.cos() * step as f64;
    let y = p0.y as f64 + direction as f64 * rad.sin() * step as f64;
    Point::new(round_coord(x), round_coord(y))
}

/// Fraction of bright pixels along a ray of `length` steps.
pub(crate) fn bright_fraction(
    binary: &GrayImage,
    p0: Point<i32>,
    angle_deg: f64,
    length: i32,
    direction: i32,
) -> f64 {
    if length <= 0 {
        return 0.0;
    }
    let mut bright = 0;
    for i in 0..length {
        if pixel_value(binary, move_pixel(p0, angle_deg, i, direction)) == 255 {
            bright += 1;
        }
    }
    bright as f64 / length as f64
}

/// Count bright runs longer than one pixel along a ray.
pub(crate) fn dash_count(
    binary: &GrayImage,
    p0: Point<i32>,
    angle_deg: f64,
    length: i32,
    direction: i32,
) -> usize {
    let mut islands = Vec::new();
    let mut is_bright = false;
    let mut start = 0i32;
    for i in 0..length {
        let bright = pixel_value(binary, move_pixel(p0, angle_deg, i, direction)) == 255;
        if !is_bright && bright {
            is_bright = true;
            start = i;
        }
        if is_bright && (!bright || i == length - 1) {
            is_bright = false;
            islands.push(i - start);
        }
    }
    islands.into_iter().filter(|&run| run > 1).count()
}
