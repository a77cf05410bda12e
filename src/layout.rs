//! Layer capacity and deterministic index → position mapping.
//!
//! Two fill orders share the same grid:
//! - height-first columnar: a column is filled bottom to top before the next column
//!   along the width starts; a full width-row of columns advances along the length.
//! - floor-first layered: the whole floor plan is covered before the next layer starts.
//!
//! Positions are a pure function of the index, which keeps every placement of a unit on
//! its own grid cell. The only runtime check is the boundary test in `fill_positions`.

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::fits_in_bounds;
use crate::model::PlacementStrategy;
use crate::types::{EPSILON_GENERAL, Vec3};

/// Result of fitting one footprint onto a rectangular base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct LayerFit {
    /// Items per layer; zero when the footprint does not fit.
    pub count: usize,
    /// Whether the swapped footprint (width along the base length) won.
    pub swapped: bool,
    pub along_length: usize,
    pub along_width: usize,
}

impl LayerFit {
    const NONE: LayerFit = LayerFit {
        count: 0,
        swapped: false,
        along_length: 0,
        along_width: 0,
    };
}

/// How many items of one size fit next to each other along an edge.
///
/// Counts and the products built from them saturate at `usize::MAX`.
pub fn count_along(edge: f64, item: f64) -> usize {
    if !(edge.is_finite() && item.is_finite()) || edge <= 0.0 || item <= 0.0 {
        return 0;
    }
    ((edge + EPSILON_GENERAL) / item).floor() as usize
}

/// Items per layer for a footprint on a base, optionally testing the swapped footprint.
///
/// # Parameters
/// * `base_length`, `base_width` - The floor being covered
/// * `item_length`, `item_width` - The footprint as currently oriented
/// * `allow_rotation` - Also try `item_width` along the base length
///
/// # Returns
/// The larger of the two counts; the original footprint wins ties.
pub fn layer_capacity(
    base_length: f64,
    base_width: f64,
    item_length: f64,
    item_width: f64,
    allow_rotation: bool,
) -> LayerFit {
    let normal_length = count_along(base_length, item_length);
    let normal_width = count_along(base_width, item_width);
    let normal = LayerFit {
        count: normal_length.saturating_mul(normal_width),
        swapped: false,
        along_length: normal_length,
        along_width: normal_width,
    };

    if !allow_rotation {
        return if normal.count > 0 { normal } else { LayerFit::NONE };
    }

    let rotated_length = count_along(base_length, item_width);
    let rotated_width = count_along(base_width, item_length);
    let rotated = LayerFit {
        count: rotated_length.saturating_mul(rotated_width),
        swapped: true,
        along_length: rotated_length,
        along_width: rotated_width,
    };

    if rotated.count > normal.count {
        rotated
    } else if normal.count > 0 {
        normal
    } else {
        LayerFit::NONE
    }
}

/// A regular grid of equally sized cells inside one unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    strategy: PlacementStrategy,
    cell: Vec3,
    along_length: usize,
    along_width: usize,
    /// Cartons per column (height-first) or number of layers (floor-first).
    tiers: usize,
    base_z: f64,
}

impl GridLayout {
    /// Column-first grid filling `bounds` from the floor.
    pub fn height_first(bounds: Vec3, cell: Vec3) -> Self {
        Self {
            strategy: PlacementStrategy::HeightFirstColumnar,
            cell,
            along_length: count_along(bounds.x, cell.x),
            along_width: count_along(bounds.y, cell.y),
            tiers: count_along(bounds.z, cell.z),
            base_z: 0.0,
        }
    }

    /// Layer-first grid on a floor of `floor_length` × `floor_width`.
    ///
    /// Layers start at `base_z` and may rise to `stack_limit`.
    pub fn floor_first(
        floor_length: f64,
        floor_width: f64,
        base_z: f64,
        stack_limit: f64,
        cell: Vec3,
    ) -> Self {
        Self {
            strategy: PlacementStrategy::FloorFirstLayered,
            cell,
            along_length: count_along(floor_length, cell.x),
            along_width: count_along(floor_width, cell.y),
            tiers: count_along(stack_limit - base_z, cell.z),
            base_z,
        }
    }

    /// Replaces the tier count, e.g. after a capacity clamp.
    pub fn with_tiers(mut self, tiers: usize) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn per_layer(&self) -> usize {
        self.along_length.saturating_mul(self.along_width)
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn tiers(&self) -> usize {
        self.tiers
    }

    /// Theoretical number of cells.
    pub fn capacity(&self) -> usize {
        self.per_layer().saturating_mul(self.tiers)
    }

    /// Lower corner of cell `index` (zero-based, `index < capacity()`).
    pub fn position(&self, index: usize) -> Vec3 {
        let (length_index, width_index, height_index) = match self.strategy {
            PlacementStrategy::HeightFirstColumnar => {
                let column_index = index / self.tiers;
                let height_index = index % self.tiers;
                (
                    column_index / self.along_width,
                    column_index % self.along_width,
                    height_index,
                )
            }
            PlacementStrategy::FloorFirstLayered => {
                let per_layer = self.per_layer();
                let layer_index = index / per_layer;
                let position_in_layer = index % per_layer;
                (
                    position_in_layer / self.along_width,
                    position_in_layer % self.along_width,
                    layer_index,
                )
            }
        };

        Vec3::new(
            length_index as f64 * self.cell.x,
            width_index as f64 * self.cell.y,
            self.base_z + height_index as f64 * self.cell.z,
        )
    }

    pub fn cell(&self) -> Vec3 {
        self.cell
    }
}

/// Upper bound on the up-front allocation of `fill_positions`; larger fills grow on demand.
const MAX_PREALLOCATED_POSITIONS: usize = 4096;

/// Walks the grid in fill order and returns up to `limit` positions.
///
/// Stops at the first position whose cell would leave `bounds`; everything returned
/// before that point stays valid.
pub fn fill_positions(layout: &GridLayout, bounds: Vec3, limit: usize, epsilon: f64) -> Vec<Vec3> {
    let target = layout.capacity().min(limit);
    let mut positions = Vec::with_capacity(target.min(MAX_PREALLOCATED_POSITIONS));
    for index in 0..target {
        let position = layout.position(index);
        if !fits_in_bounds(position, layout.cell(), bounds, epsilon) {
            break;
        }
        positions.push(position);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{find_out_of_bounds, find_overlap};
    use crate::model::{AxisOrder, CartonPlacement, Orientation};

    fn placements(positions: &[Vec3], cell: Vec3) -> Vec<CartonPlacement> {
        let orientation = Orientation::new(cell.x, cell.y, cell.z, AxisOrder::Lwh);
        positions
            .iter()
            .map(|p| CartonPlacement::new(*p, &orientation))
            .collect()
    }

    #[test]
    fn test_layer_capacity_prefers_rotated_layout_when_larger() {
        // 100 x 50 base, 40 x 20 item: normal 2 x 2 = 4, rotated 5 x 1 = 5
        let fit = layer_capacity(100.0, 50.0, 40.0, 20.0, true);
        assert_eq!(fit.count, 5);
        assert!(fit.swapped);
        assert_eq!((fit.along_length, fit.along_width), (5, 1));

        let fixed = layer_capacity(100.0, 50.0, 40.0, 20.0, false);
        assert_eq!(fixed.count, 4);
        assert!(!fixed.swapped);
    }

    #[test]
    fn test_layer_capacity_keeps_original_on_tie() {
        let fit = layer_capacity(120.0, 80.0, 40.0, 40.0, true);
        assert_eq!(fit.count, 6);
        assert!(!fit.swapped);
    }

    #[test]
    fn test_layer_capacity_zero_when_footprint_too_large() {
        let fit = layer_capacity(120.0, 80.0, 130.0, 90.0, true);
        assert_eq!(fit.count, 0);
        assert_eq!(layer_capacity(120.0, 80.0, 0.0, 10.0, true).count, 0);
    }

    #[test]
    fn test_height_first_fills_columns_before_advancing() {
        let bounds = Vec3::new(1200.0, 240.0, 260.0);
        let cell = Vec3::new(30.0, 20.0, 15.0);
        let layout = GridLayout::height_first(bounds, cell);
        assert_eq!(layout.tiers(), 17);
        assert_eq!(layout.per_layer(), 40 * 12);

        assert_eq!(layout.position(0), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(layout.position(16), Vec3::new(0.0, 0.0, 16.0 * 15.0));
        // carton #18 opens the second column along the width
        assert_eq!(layout.position(17), Vec3::new(0.0, 20.0, 0.0));
        // a full width-row of 12 columns (204 cartons) advances along the length
        assert_eq!(layout.position(12 * 17), Vec3::new(30.0, 0.0, 0.0));
    }

    #[test]
    fn test_floor_first_covers_floor_before_next_layer() {
        let cell = Vec3::new(40.0, 20.0, 10.0);
        let layout = GridLayout::floor_first(120.0, 80.0, 14.5, 60.0, cell);
        assert_eq!(layout.per_layer(), 12);
        assert_eq!(layout.tiers(), 4);

        assert_eq!(layout.position(0), Vec3::new(0.0, 0.0, 14.5));
        assert_eq!(layout.position(3), Vec3::new(0.0, 60.0, 14.5));
        assert_eq!(layout.position(4), Vec3::new(40.0, 0.0, 14.5));
        assert_eq!(layout.position(12), Vec3::new(0.0, 0.0, 24.5));
    }

    #[test]
    fn test_fill_positions_stops_at_limit_and_capacity() {
        let bounds = Vec3::new(60.0, 40.0, 30.0);
        let layout = GridLayout::height_first(bounds, Vec3::new(30.0, 20.0, 15.0));
        assert_eq!(layout.capacity(), 8);
        assert_eq!(fill_positions(&layout, bounds, 5, EPSILON_GENERAL).len(), 5);
        assert_eq!(fill_positions(&layout, bounds, 100, EPSILON_GENERAL).len(), 8);
    }

    #[test]
    fn test_capacity_saturates_for_tiny_cells() {
        let fit = layer_capacity(1200.0, 240.0, 1e-6, 1e-6, true);
        assert_eq!(fit.count, usize::MAX);

        let bounds = Vec3::new(1200.0, 240.0, 260.0);
        let layout = GridLayout::height_first(bounds, Vec3::new(1e-6, 1e-6, 1e-6));
        assert_eq!(layout.capacity(), usize::MAX);
        let positions = fill_positions(&layout, bounds, 3, EPSILON_GENERAL);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions[0], Vec3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_fill_positions_beyond_preallocation_bound() {
        let bounds = Vec3::new(100.0, 100.0, 100.0);
        let layout = GridLayout::floor_first(100.0, 100.0, 0.0, 100.0, Vec3::new(1.0, 1.0, 1.0));
        let wanted = MAX_PREALLOCATED_POSITIONS * 2 + 7;
        let positions = fill_positions(&layout, bounds, wanted, EPSILON_GENERAL);
        assert_eq!(positions.len(), wanted);
        assert_eq!(positions[wanted - 1], layout.position(wanted - 1));
    }

    #[test]
    fn test_fill_positions_stops_early_on_boundary_overrun() {
        // tiers forced above what the bounds allow
        let bounds = Vec3::new(60.0, 40.0, 30.0);
        let layout = GridLayout::floor_first(60.0, 40.0, 0.0, 30.0, Vec3::new(30.0, 20.0, 15.0))
            .with_tiers(3);
        let positions = fill_positions(&layout, bounds, usize::MAX, EPSILON_GENERAL);
        assert_eq!(positions.len(), 8);
    }

    #[test]
    fn test_both_strategies_produce_disjoint_in_bounds_cells() {
        let cases = [
            (Vec3::new(100.0, 50.0, 40.0), Vec3::new(30.0, 20.0, 15.0)),
            (Vec3::new(1203.0, 235.0, 239.0), Vec3::new(60.0, 40.0, 35.0)),
            (Vec3::new(45.0, 45.0, 45.0), Vec3::new(14.5, 7.25, 11.0)),
        ];

        for (bounds, cell) in cases {
            let layouts = [
                GridLayout::height_first(bounds, cell),
                GridLayout::floor_first(bounds.x, bounds.y, 0.0, bounds.z, cell),
            ];
            for layout in layouts {
                let positions = fill_positions(&layout, bounds, 400, EPSILON_GENERAL);
                assert_eq!(positions.len(), layout.capacity().min(400));
                let placed = placements(&positions, cell);
                assert_eq!(find_overlap(&placed), None, "{:?}", layout);
                assert_eq!(find_out_of_bounds(&placed, bounds, EPSILON_GENERAL), None);
            }
        }
    }
}
