//! Plain geometry values carried by map-view properties.

use std::ops::Add;

use serde::{Deserialize, Serialize};

/// A spatial reference, identified by its well-known ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpatialReference {
    pub wkid: u32,
}

impl SpatialReference {
    /// WGS 84 geographic coordinates.
    pub const WGS84: Self = Self { wkid: 4326 };
    /// Web Mercator, the default for basemaps.
    pub const WEB_MERCATOR: Self = Self { wkid: 3857 };
}

/// A map location in the view's spatial reference.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotate around `origin` by `degrees`, counter-clockwise.
    pub fn rotated_around(self, origin: Point, degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let dx = self.x - origin.x;
        let dy = self.y - origin.y;
        Self {
            x: origin.x + dx * cos - dy * sin,
            y: origin.y + dx * sin + dy * cos,
        }
    }
}

/// A location on screen, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Insets from each edge of the view, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeInsets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl EdgeInsets {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(top: f64, left: f64, bottom: f64, right: f64) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }
}

impl Add for EdgeInsets {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            top: self.top + rhs.top,
            left: self.left + rhs.left,
            bottom: self.bottom + rhs.bottom,
            right: self.right + rhs.right,
        }
    }
}

/// Axis-aligned bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Envelope {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Point {
        Point::new((self.x_min + self.x_max) / 2.0, (self.y_min + self.y_max) / 2.0)
    }
}

/// A closed ring of points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Bounding envelope, or `None` for an empty ring.
    pub fn extent(&self) -> Option<Envelope> {
        let first = self.points.first()?;
        let init = Envelope {
            x_min: first.x,
            y_min: first.y,
            x_max: first.x,
            y_max: first.y,
        };
        Some(self.points.iter().fold(init, |env, p| Envelope {
            x_min: env.x_min.min(p.x),
            y_min: env.y_min.min(p.y),
            x_max: env.x_max.max(p.x),
            y_max: env.y_max.max(p.y),
        }))
    }
}

/// Where the view looks: center, scale and rotation (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub center: Point,
    pub scale: f64,
    pub rotation: f64,
}

/// A time window, in milliseconds since the Unix epoch. Open ends are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeExtent {
    pub start_ms: Option<i64>,
    pub end_ms: Option<i64>,
}

/// Normalize an angle to `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if normalized >= 360.0 { 0.0 } else { normalized }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let p = Point::new(1.0, 0.0).rotated_around(Point::default(), 90.0);
        assert!((p.x - 0.0).abs() < 1e-9);
        assert!((p.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygon_extent() {
        let polygon = Polygon::new(vec![Point::new(-1.0, 2.0), Point::new(3.0, -4.0), Point::new(0.0, 0.0)]);
        let env = polygon.extent().unwrap();
        assert_eq!((env.x_min, env.y_min, env.x_max, env.y_max), (-1.0, -4.0, 3.0, 2.0));
        assert_eq!(env.center(), Point::new(1.0, -1.0));
        assert!(Polygon::default().extent().is_none());
    }
}
