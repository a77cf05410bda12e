//! Realistic pallet-per-container limits.
//!
//! Geometry alone would stack loaded pallets as high as the container allows. Real loads
//! are limited by crush strength and carrier rules, so the geometric count is clamped
//! twice:
//! 1. the number of pallet tiers is capped per container size class;
//! 2. the total is capped by `SAFE_PALLET_LIMITS`, keyed by container size class and
//!    pallet footprint class.
//!
//! Footprints that match no named class have no table entry; for them the tier-clamped
//! geometric count is final.

use serde::Serialize;
use utoipa::ToSchema;

use crate::layout::{LayerFit, count_along, layer_capacity};
use crate::model::ContainerSpec;

/// Containers at least this long (inner length, cm) belong to the 40-foot class.
pub const LARGE_CONTAINER_MIN_LENGTH: f64 = 900.0;

/// Allowed deviation (cm) when matching a pallet footprint to a named class.
pub const FOOTPRINT_TOLERANCE: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContainerSizeClass {
    /// 20-foot class.
    Small,
    /// 40-foot class (including high cube).
    Large,
}

impl ContainerSizeClass {
    pub fn classify(container: &ContainerSpec) -> Self {
        if container.length >= LARGE_CONTAINER_MIN_LENGTH {
            ContainerSizeClass::Large
        } else {
            ContainerSizeClass::Small
        }
    }

    /// Upper bound on stacked pallet tiers.
    pub fn max_tiers(&self) -> usize {
        match self {
            ContainerSizeClass::Small => 1,
            ContainerSizeClass::Large => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PalletFootprintClass {
    /// About 120 × 80.
    Euro,
    /// About 120 × 100.
    Us,
    Generic,
}

impl PalletFootprintClass {
    pub fn classify(length: f64, width: f64) -> Self {
        if footprint_matches(length, width, 120.0, 80.0) {
            PalletFootprintClass::Euro
        } else if footprint_matches(length, width, 120.0, 100.0) {
            PalletFootprintClass::Us
        } else {
            PalletFootprintClass::Generic
        }
    }
}

fn footprint_matches(length: f64, width: f64, target_length: f64, target_width: f64) -> bool {
    let close = |a: f64, b: f64| (a - b).abs() <= FOOTPRINT_TOLERANCE;
    (close(length, target_length) && close(width, target_width))
        || (close(length, target_width) && close(width, target_length))
}

/// Known-safe pallet counts per container.
pub const SAFE_PALLET_LIMITS: &[(ContainerSizeClass, PalletFootprintClass, usize)] = &[
    (ContainerSizeClass::Small, PalletFootprintClass::Euro, 11),
    (ContainerSizeClass::Small, PalletFootprintClass::Us, 10),
    (ContainerSizeClass::Large, PalletFootprintClass::Euro, 48),
    (ContainerSizeClass::Large, PalletFootprintClass::Us, 40),
];

pub fn safe_pallet_limit(
    size: ContainerSizeClass,
    footprint: PalletFootprintClass,
) -> Option<usize> {
    SAFE_PALLET_LIMITS
        .iter()
        .find(|(s, f, _)| *s == size && *f == footprint)
        .map(|(_, _, limit)| *limit)
}

/// How many loaded pallets one container takes, and why.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct PalletCapacity {
    /// Pallets per tier on the container floor.
    pub floor: LayerFit,
    pub geometric_tiers: usize,
    pub allowed_tiers: usize,
    /// floor × geometric tiers.
    pub theoretical: usize,
    /// Final per-container limit after both clamps.
    pub limit: usize,
    pub size_class: ContainerSizeClass,
    pub footprint_class: PalletFootprintClass,
}

/// Clamps the geometric pallet capacity of a container to realistic limits.
///
/// # Parameters
/// * `container` - The container being filled
/// * `pallet_length`, `pallet_width` - Pallet footprint
/// * `loaded_height` - Pallet deck plus cargo
/// * `allow_rotation` - Pallets may be turned a quarter turn on the floor
pub fn advise_pallet_capacity(
    container: &ContainerSpec,
    pallet_length: f64,
    pallet_width: f64,
    loaded_height: f64,
    allow_rotation: bool,
) -> PalletCapacity {
    let floor = layer_capacity(
        container.length,
        container.width,
        pallet_length,
        pallet_width,
        allow_rotation,
    );
    let geometric_tiers = count_along(container.height, loaded_height);
    let size_class = ContainerSizeClass::classify(container);
    let footprint_class = PalletFootprintClass::classify(pallet_length, pallet_width);

    let allowed_tiers = geometric_tiers.min(size_class.max_tiers());
    let stacked = floor.count.saturating_mul(allowed_tiers);
    let limit = match safe_pallet_limit(size_class, footprint_class) {
        Some(cap) => stacked.min(cap),
        None => stacked,
    };

    PalletCapacity {
        floor,
        geometric_tiers,
        allowed_tiers,
        theoretical: floor.count.saturating_mul(geometric_tiers),
        limit,
        size_class,
        footprint_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container(length: f64, height: f64) -> ContainerSpec {
        ContainerSpec {
            length,
            width: 235.0,
            height,
            max_weight: 26_000.0,
        }
    }

    #[test]
    fn test_classifies_container_sizes() {
        assert_eq!(
            ContainerSizeClass::classify(&container(589.0, 239.0)),
            ContainerSizeClass::Small
        );
        assert_eq!(
            ContainerSizeClass::classify(&container(1203.0, 239.0)),
            ContainerSizeClass::Large
        );
    }

    #[test]
    fn test_classifies_footprints_in_either_orientation() {
        assert_eq!(PalletFootprintClass::classify(120.0, 80.0), PalletFootprintClass::Euro);
        assert_eq!(PalletFootprintClass::classify(80.0, 122.0), PalletFootprintClass::Euro);
        assert_eq!(PalletFootprintClass::classify(120.0, 100.0), PalletFootprintClass::Us);
        assert_eq!(PalletFootprintClass::classify(116.0, 116.0), PalletFootprintClass::Generic);
    }

    #[test]
    fn test_tiny_footprints_saturate_counts() {
        let capacity = advise_pallet_capacity(&container(1203.0, 239.0), 1e-6, 1e-6, 1e-6, false);
        assert_eq!(capacity.floor.count, usize::MAX);
        assert_eq!(capacity.theoretical, usize::MAX);
        assert_eq!(capacity.footprint_class, PalletFootprintClass::Generic);
        assert_eq!(capacity.limit, usize::MAX);
    }

    #[test]
    fn test_table_has_no_generic_entries() {
        for size in [ContainerSizeClass::Small, ContainerSizeClass::Large] {
            assert_eq!(safe_pallet_limit(size, PalletFootprintClass::Generic), None);
        }
        assert_eq!(
            safe_pallet_limit(ContainerSizeClass::Small, PalletFootprintClass::Euro),
            Some(11)
        );
    }

    #[test]
    fn test_small_container_never_stacks_pallets() {
        // 589 x 235 x 239 with short Euro pallets: 8 per tier, 4 geometric tiers
        let capacity = advise_pallet_capacity(&container(589.0, 239.0), 120.0, 80.0, 50.0, true);
        assert_eq!(capacity.floor.count, 8);
        assert_eq!(capacity.geometric_tiers, 4);
        assert_eq!(capacity.theoretical, 32);
        assert_eq!(capacity.allowed_tiers, 1);
        assert_eq!(capacity.limit, 8);
    }

    #[test]
    fn test_large_container_stacks_at_most_two_tiers() {
        // 1203 x 235 x 239 with Euro pallets: 20 per tier, 4 geometric tiers
        let capacity = advise_pallet_capacity(&container(1203.0, 239.0), 120.0, 80.0, 50.0, true);
        assert_eq!(capacity.floor.count, 20);
        assert_eq!(capacity.theoretical, 80);
        assert_eq!(capacity.allowed_tiers, 2);
        assert_eq!(capacity.limit, 40);
    }

    #[test]
    fn test_safe_table_clamps_below_geometry() {
        let long = ContainerSpec {
            length: 1500.0,
            width: 250.0,
            height: 239.0,
            max_weight: 30_000.0,
        };
        // 12 along the length x 3 across = 36 per tier, 2 tiers -> 72, table caps at 48
        let capacity = advise_pallet_capacity(&long, 120.0, 80.0, 100.0, false);
        assert_eq!(capacity.floor.count, 36);
        assert_eq!(capacity.allowed_tiers, 2);
        assert_eq!(capacity.limit, 48);
        assert_eq!(capacity.footprint_class, PalletFootprintClass::Euro);
    }

    #[test]
    fn test_generic_footprint_uses_tier_clamped_geometry() {
        let capacity = advise_pallet_capacity(&container(1203.0, 239.0), 110.0, 110.0, 100.0, true);
        // 10 along the length x 2 across = 20 per tier, 2 tiers
        assert_eq!(capacity.footprint_class, PalletFootprintClass::Generic);
        assert_eq!(capacity.limit, 40);
    }

    #[test]
    fn test_pallet_taller_than_container_yields_zero() {
        let capacity = advise_pallet_capacity(&container(1203.0, 239.0), 120.0, 80.0, 250.0, true);
        assert_eq!(capacity.limit, 0);
    }
}
