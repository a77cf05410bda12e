//! Geometric helpers for boundary checks and layout verification.
//!
//! The placement engine only ever needs `fits_in_bounds`: overlap freedom follows from
//! its index arithmetic. The pairwise checks below verify that claim independently and
//! are used by the test suites of the placement modules.

use crate::model::CartonPlacement;
use crate::types::{BoundingBox, Vec3};

/// Checks `position + dims <= bounds` on every axis (with tolerance).
///
/// # Parameters
/// * `position` - Lower corner of the item inside the owning volume
/// * `dims` - Effective item dimensions
/// * `bounds` - Dimensions of the owning volume
/// * `epsilon` - Numerical tolerance
pub fn fits_in_bounds(position: Vec3, dims: Vec3, bounds: Vec3, epsilon: f64) -> bool {
    BoundingBox::from_position_and_dims(position, dims).is_inside(&bounds, epsilon)
}

/// Checks whether two placed cartons overlap in space.
///
/// Cartons that merely touch along a face do not count as overlapping.
#[cfg_attr(not(test), allow(dead_code))]
pub fn intersects(a: &CartonPlacement, b: &CartonPlacement) -> bool {
    a.bounding_box().intersects(&b.bounding_box())
}

/// Returns the first pair of overlapping placements, if any.
#[cfg_attr(not(test), allow(dead_code))]
pub fn find_overlap(placements: &[CartonPlacement]) -> Option<(usize, usize)> {
    for (i, a) in placements.iter().enumerate() {
        for (offset, b) in placements[i + 1..].iter().enumerate() {
            if intersects(a, b) {
                return Some((i, i + 1 + offset));
            }
        }
    }
    None
}

/// Returns the index of the first placement that leaves `bounds`, if any.
#[cfg_attr(not(test), allow(dead_code))]
pub fn find_out_of_bounds(
    placements: &[CartonPlacement],
    bounds: Vec3,
    epsilon: f64,
) -> Option<usize> {
    placements.iter().position(|p| {
        !fits_in_bounds(
            p.position_vec3(),
            Vec3::new(p.length, p.width, p.height),
            bounds,
            epsilon,
        )
    })
}
