//! Carton orientations and their ranking for a given base.

use std::cmp::Ordering;

use crate::layout::{count_along, layer_capacity};
use crate::model::{AxisOrder, Constraints, Orientation};
use crate::types::Vec3;

/// Lists the legal orientations of a carton, identity first.
///
/// Base rotation adds the swapped footprint; vertical rotation (unless the carton is
/// marked "this side up") adds the tipped variants. Invalid dimensions yield the single
/// fallback unit orientation.
///
/// # Parameters
/// * `dims` - Carton (length, width, height)
/// * `constraints` - Rotation permissions
pub fn enumerate_orientations(dims: Vec3, constraints: &Constraints) -> Vec<Orientation> {
    if !dims.is_valid_dimension() {
        return vec![Orientation::fallback()];
    }

    let Vec3 {
        x: l,
        y: w,
        z: h,
    } = dims;
    let base = constraints.allow_rotation_on_base;

    let mut orientations = vec![Orientation::new(l, w, h, AxisOrder::Lwh)];
    if base {
        orientations.push(Orientation::new(w, l, h, AxisOrder::Wlh));
    }
    if constraints.allows_tipping() {
        orientations.push(Orientation::new(l, h, w, AxisOrder::Lhw));
        if base {
            orientations.push(Orientation::new(h, l, w, AxisOrder::Hlw));
        }
        orientations.push(Orientation::new(w, h, l, AxisOrder::Whl));
        if base {
            orientations.push(Orientation::new(h, w, l, AxisOrder::Hwl));
        }
    }
    orientations
}

/// One orientation evaluated against a base.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RankedOrientation {
    /// Orientation as it will be placed (footprint already swapped if that fit better).
    pub orientation: Orientation,
    pub cartons_per_layer: usize,
    pub layers: usize,
    pub total_capacity: usize,
    pub floor_footprint: f64,
    /// `None` when nothing fits.
    pub units_needed: Option<usize>,
}

impl RankedOrientation {
    pub fn is_viable(&self) -> bool {
        self.total_capacity > 0
    }
}

/// Evaluates one orientation on a base of `base_length` × `base_width`.
pub fn evaluate_orientation(
    orientation: &Orientation,
    base_length: f64,
    base_width: f64,
    available_height: f64,
    quantity: usize,
    allow_base_rotation: bool,
) -> RankedOrientation {
    let fit = layer_capacity(
        base_length,
        base_width,
        orientation.length,
        orientation.width,
        allow_base_rotation,
    );
    let placed = if fit.swapped {
        orientation.swapped()
    } else {
        *orientation
    };
    let layers = count_along(available_height, placed.height);
    let total_capacity = fit.count.saturating_mul(layers);
    let units_needed = (total_capacity > 0).then(|| quantity.div_ceil(total_capacity));

    RankedOrientation {
        orientation: placed,
        cartons_per_layer: fit.count,
        layers,
        total_capacity,
        floor_footprint: fit.count as f64 * placed.length * placed.width,
        units_needed,
    }
}

/// Orders orientations by expected packing efficiency.
///
/// Fewest units first; then the smaller floor footprint; then higher capacity; then
/// more layers. Orientations that do not fit sort last. The sort is stable, so
/// enumeration order breaks the remaining ties.
pub fn rank_orientations(
    orientations: &[Orientation],
    base_length: f64,
    base_width: f64,
    available_height: f64,
    quantity: usize,
    allow_base_rotation: bool,
) -> Vec<RankedOrientation> {
    let mut ranked: Vec<RankedOrientation> = orientations
        .iter()
        .map(|o| {
            evaluate_orientation(
                o,
                base_length,
                base_width,
                available_height,
                quantity,
                allow_base_rotation,
            )
        })
        .collect();
    ranked.sort_by(compare_ranked);
    ranked
}

fn compare_ranked(a: &RankedOrientation, b: &RankedOrientation) -> Ordering {
    compare_units(a.units_needed, b.units_needed)
        .then_with(|| a.floor_footprint.total_cmp(&b.floor_footprint))
        .then_with(|| b.total_capacity.cmp(&a.total_capacity))
        .then_with(|| b.layers.cmp(&a.layers))
}

fn compare_units(a: Option<usize>, b: Option<usize>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
