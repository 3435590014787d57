use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A position in overlay-container pixels, y pointing down.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Grows or shrinks by `delta`, never below `min` on either side.
    pub fn resized_by(self, delta: Point, min: f64) -> Size {
        Size::new(
            clamp_min(self.width + delta.x, min),
            clamp_min(self.height + delta.y, min),
        )
    }
}

/// Unrotated box of an overlay. Rotation happens about its center, so the
/// center is also the visual center on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

/// Angle of `at` seen from `center`, in degrees. 0 points right and positive
/// values turn clockwise on screen.
pub fn pointer_angle(center: Point, at: Point) -> f64 {
    (at.y - center.y).atan2(at.x - center.x).to_degrees()
}

/// Folds an angle difference into [-180, 180).
pub fn normalize_angle_delta(delta: f64) -> f64 {
    ((delta + 180.0).rem_euclid(360.0)) - 180.0
}

/// `value.max(min)`, with NaN collapsing to `min`.
pub fn clamp_min(value: f64, min: f64) -> f64 {
    if value.is_nan() {
        min
    } else {
        value.max(min)
    }
}

pub fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_angle_turns_clockwise_with_y_down() {
        let center = Point::new(100.0, 100.0);
        assert_eq!(pointer_angle(center, Point::new(150.0, 100.0)), 0.0);
        assert!((pointer_angle(center, Point::new(100.0, 150.0)) - 90.0).abs() < 1e-9);
        assert!((pointer_angle(center, Point::new(100.0, 50.0)) + 90.0).abs() < 1e-9);
    }

    #[test]
    fn angle_delta_takes_the_short_way_round() {
        assert_eq!(normalize_angle_delta(350.0), -10.0);
        assert_eq!(normalize_angle_delta(-350.0), 10.0);
        assert_eq!(normalize_angle_delta(45.0), 45.0);
    }

    #[test]
    fn resize_never_goes_below_minimum() {
        let size = Size::new(100.0, 80.0).resized_by(Point::new(-500.0, 10.0), 40.0);
        assert_eq!(size, Size::new(40.0, 90.0));
        assert_eq!(clamp_min(f64::NAN, 40.0), 40.0);
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_to_tenth(4.56), 4.6);
        assert_eq!(round_to_tenth(4.8), 4.8);
        assert_eq!(round_to_tenth(0.0), 0.0);
    }
}
