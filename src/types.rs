//! Common types and traits for 3D geometry.
//!
//! Positions and dimensions throughout the planner use the same axis convention:
//! x runs along the length of the owning volume, y along its width and z upwards.

use std::ops::Add;

/// Global numerical tolerance for floating-point comparisons.
///
/// Every boundary check (position + dimension ≤ volume) is performed with this slack.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Represents a 3D vector or point in space.
///
/// # Examples
/// ```ignore
/// let position = Vec3::new(30.0, 0.0, 15.0);
/// let dims = Vec3::new(30.0, 20.0, 15.0);
/// let far_corner = position + dims;
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    ///
    /// # Parameters
    /// * `x` - Length axis component
    /// * `y` - Width axis component
    /// * `z` - Height axis component
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Creates from tuple format.
    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    /// Product of all components. Useful for dimension vectors.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0
            && self.y > 0.0
            && self.z > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `bounds` - The outer vector (e.g. container dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, bounds: &Self, tolerance: f64) -> bool {
        self.x <= bounds.x + tolerance
            && self.y <= bounds.y + tolerance
            && self.z <= bounds.z + tolerance
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions as (length, width, height).
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + dimensions)
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from position and dimensions.
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Vec3) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    /// Checks if two bounding boxes intersect.
    ///
    /// Separating Axis Theorem for AABBs; boxes that only share a face do not intersect.
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.max.x <= other.min.x
            || other.max.x <= self.min.x
            || self.max.y <= other.min.y
            || other.max.y <= self.min.y
            || self.max.z <= other.min.z
            || other.max.z <= self.min.z)
    }

    /// Checks that the box lies inside `[0, bounds]` on every axis.
    #[inline]
    pub fn is_inside(&self, bounds: &Vec3, tolerance: f64) -> bool {
        self.min.x >= -tolerance
            && self.min.y >= -tolerance
            && self.min.z >= -tolerance
            && self.max.fits_within(bounds, tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(Vec3::from_tuple(a.as_tuple()), a);
        assert!(a.fits_within(&b, 0.0));
        assert!(!b.fits_within(&a, 0.5));
    }

    #[test]
    fn test_vec3_volume() {
        let dims = Vec3::new(30.0, 20.0, 15.0);
        assert!((dims.volume() - 9000.0).abs() < EPSILON_GENERAL);
    }

    #[test]
    fn test_vec3_valid_dimension() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(0.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, -2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, 2.0, f64::NAN).is_valid_dimension());
        assert!(!Vec3::new(f64::INFINITY, 2.0, 3.0).is_valid_dimension());
    }

    #[test]
    fn test_bounding_box_touching_faces_do_not_intersect() {
        let a = BoundingBox::from_position_and_dims(Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 10.0, 10.0));
        let touching = BoundingBox::from_position_and_dims(
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        let overlapping = BoundingBox::from_position_and_dims(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::new(10.0, 10.0, 10.0),
        );

        assert!(!a.intersects(&touching));
        assert!(a.intersects(&overlapping));
    }

    #[test]
    fn test_bounding_box_is_inside() {
        let bounds = Vec3::new(20.0, 20.0, 20.0);
        let inside = BoundingBox::from_position_and_dims(
            Vec3::new(10.0, 10.0, 10.0),
            Vec3::new(10.0, 10.0, 10.0),
        );
        let sticking_out = BoundingBox::from_position_and_dims(
            Vec3::new(15.0, 0.0, 0.0),
            Vec3::new(10.0, 10.0, 10.0),
        );

        assert!(inside.is_inside(&bounds, EPSILON_GENERAL));
        assert!(!sticking_out.is_inside(&bounds, EPSILON_GENERAL));
    }
}
