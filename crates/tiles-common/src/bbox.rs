//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

/// A geographic or projected bounding box.
///
/// Dataset bounds from metadata are in WGS84 degrees; tile bounds are in
/// Web Mercator meters. The struct itself is unit-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Expand all four sides outward by `margin` coordinate units.
    ///
    /// A margin of zero returns the box unchanged.
    pub fn expand(&self, margin: f64) -> BoundingBox {
        BoundingBox {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_height() {
        let bbox = BoundingBox::new(-125.0, 24.0, -66.0, 50.0);
        assert_eq!(bbox.width(), 59.0);
        assert_eq!(bbox.height(), 26.0);
    }

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_expand() {
        let bbox = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let grown = bbox.expand(2.5);
        assert_eq!(grown, BoundingBox::new(-2.5, -2.5, 12.5, 12.5));
    }

    #[test]
    fn test_expand_zero_is_identity() {
        let bbox = BoundingBox::new(-100.0, 35.0, -99.0, 36.0);
        assert_eq!(bbox.expand(0.0), bbox);
    }
}
