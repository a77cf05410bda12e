//! Generates as many pallets and containers as a quantity needs.
//!
//! A `UnitFiller` knows how to fill one unit (pallet or container) with at most
//! `remaining` items. The `Distributor` drives it as an iterator until nothing is left,
//! a unit comes back empty, or the safety cap on generated units trips. Counts always
//! come from what a unit actually received, never from its theoretical capacity.

use std::collections::VecDeque;

use crate::capacity::{PalletCapacity, advise_pallet_capacity};
use crate::layout::{GridLayout, fill_positions};
use crate::model::{
    CartonPlacement, CartonSpec, ContainerContents, ContainerSpec, Orientation, PackedContainer,
    PackedPallet, PalletSpec,
};
use crate::optimizer::PackingConfig;
use crate::types::{Dimensional, Vec3};

/// Items placed into one unit.
#[derive(Clone, Debug, PartialEq)]
pub struct FilledUnit<T> {
    pub items: Vec<T>,
    pub consumed: usize,
}

/// Fills one unit at a time.
pub trait UnitFiller {
    type Item;

    /// Fills the next unit with at most `remaining` items.
    ///
    /// Returns `None` when no further unit can take anything.
    fn next_unit(&mut self, remaining: usize) -> Option<FilledUnit<Self::Item>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DistributorState {
    Filling,
    Exhausted,
}

/// Iterator over filled units.
pub struct Distributor<F: UnitFiller> {
    filler: F,
    remaining: usize,
    generated: usize,
    max_units: usize,
    state: DistributorState,
    capped: bool,
}

impl<F: UnitFiller> Distributor<F> {
    pub fn new(filler: F, quantity: usize, max_units: usize) -> Self {
        Self {
            filler,
            remaining: quantity,
            generated: 0,
            max_units,
            state: DistributorState::Filling,
            capped: false,
        }
    }

    /// Items not yet placed.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Whether generation stopped because of the unit cap.
    pub fn hit_unit_cap(&self) -> bool {
        self.capped
    }
}

impl<F: UnitFiller> Iterator for Distributor<F> {
    type Item = FilledUnit<F::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == DistributorState::Exhausted {
            return None;
        }
        if self.remaining == 0 {
            self.state = DistributorState::Exhausted;
            return None;
        }
        if self.generated >= self.max_units {
            self.capped = true;
            self.state = DistributorState::Exhausted;
            return None;
        }

        match self.filler.next_unit(self.remaining) {
            Some(unit) if unit.consumed > 0 => {
                self.remaining -= unit.consumed.min(self.remaining);
                self.generated += 1;
                Some(unit)
            }
            _ => {
                self.state = DistributorState::Exhausted;
                None
            }
        }
    }
}

/// Fills identical units with cartons on a fixed grid.
pub struct CartonGridFiller {
    layout: GridLayout,
    bounds: Vec3,
    orientation: Orientation,
    epsilon: f64,
}

impl CartonGridFiller {
    pub fn new(layout: GridLayout, bounds: Vec3, orientation: Orientation, epsilon: f64) -> Self {
        Self {
            layout,
            bounds,
            orientation,
            epsilon,
        }
    }
}

impl UnitFiller for CartonGridFiller {
    type Item = CartonPlacement;

    fn next_unit(&mut self, remaining: usize) -> Option<FilledUnit<CartonPlacement>> {
        let items: Vec<CartonPlacement> =
            fill_positions(&self.layout, self.bounds, remaining, self.epsilon)
                .into_iter()
                .map(|position| CartonPlacement::new(position, &self.orientation))
                .collect();
        if items.is_empty() {
            return None;
        }
        Some(FilledUnit {
            consumed: items.len(),
            items,
        })
    }
}

/// Moves loaded pallets into containers, up to a per-container limit.
pub struct PalletGroupFiller {
    pallets: VecDeque<PackedPallet>,
    layout: GridLayout,
    bounds: Vec3,
    per_container: usize,
    turned: bool,
    epsilon: f64,
}

impl UnitFiller for PalletGroupFiller {
    type Item = PackedPallet;

    fn next_unit(&mut self, remaining: usize) -> Option<FilledUnit<PackedPallet>> {
        let wanted = self.per_container.min(remaining).min(self.pallets.len());
        let positions = fill_positions(&self.layout, self.bounds, wanted, self.epsilon);
        let mut items = Vec::with_capacity(positions.len());
        for position in positions {
            let Some(pallet) = self.pallets.pop_front() else {
                break;
            };
            items.push(pallet.placed_at(position, self.turned));
        }
        if items.is_empty() {
            return None;
        }
        Some(FilledUnit {
            consumed: items.len(),
            items,
        })
    }
}

/// Containers generated for one orientation.
#[derive(Clone, Debug, PartialEq)]
pub struct Distribution {
    pub containers: Vec<PackedContainer>,
    pub cartons_packed: usize,
    pub pallets_used: usize,
    pub capacity_per_unit: usize,
    pub unit_cap_reached: bool,
    pub pallet_capacity: Option<PalletCapacity>,
}

impl Distribution {
    fn from_containers(
        containers: Vec<PackedContainer>,
        capacity_per_unit: usize,
        unit_cap_reached: bool,
        pallet_capacity: Option<PalletCapacity>,
    ) -> Self {
        let cartons_packed = containers.iter().map(|c| c.carton_count).sum();
        let pallets_used = containers
            .iter()
            .map(|c| match &c.contents {
                ContainerContents::Pallets(pallets) => pallets.len(),
                ContainerContents::Cartons(_) => 0,
            })
            .sum();
        Self {
            containers,
            cartons_packed,
            pallets_used,
            capacity_per_unit,
            unit_cap_reached,
            pallet_capacity,
        }
    }

    /// Physical units generated: pallets for pallet loading, containers otherwise.
    pub fn units_used(&self) -> usize {
        if self.pallet_capacity.is_some() {
            self.pallets_used
        } else {
            self.containers.len()
        }
    }
}

fn container_offset(index: usize, container: &ContainerSpec, config: &PackingConfig) -> Vec3 {
    Vec3::new(
        index as f64 * (container.length + config.container_gap),
        0.0,
        0.0,
    )
}

/// Loads cartons straight onto container floors, column by column.
pub fn distribute_direct(
    carton: &CartonSpec,
    container: &ContainerSpec,
    orientation: &Orientation,
    config: &PackingConfig,
) -> Distribution {
    let bounds = container.dimensions();
    let layout = GridLayout::height_first(bounds, orientation.dimensions());
    let filler = CartonGridFiller::new(layout, bounds, *orientation, config.general_epsilon);
    let mut units = Distributor::new(filler, carton.quantity, config.max_units);

    let containers: Vec<PackedContainer> = units
        .by_ref()
        .enumerate()
        .map(|(index, unit)| {
            PackedContainer::new(
                *container,
                container_offset(index, container, config),
                ContainerContents::Cartons(unit.items),
                carton.weight,
            )
        })
        .collect();

    Distribution::from_containers(containers, layout.capacity(), units.hit_unit_cap(), None)
}

/// Height available for pallet deck plus cargo.
pub fn pallet_stack_limit(max_stack_height: f64, container: &ContainerSpec) -> f64 {
    if max_stack_height.is_finite() && max_stack_height > 0.0 {
        max_stack_height.min(container.height)
    } else {
        container.height
    }
}

/// Builds pallets layer by layer, then groups them into containers.
pub fn distribute_palletized(
    carton: &CartonSpec,
    pallet: &PalletSpec,
    container: &ContainerSpec,
    max_stack_height: f64,
    orientation: &Orientation,
    config: &PackingConfig,
) -> Distribution {
    let stack_limit = pallet_stack_limit(max_stack_height, container);
    let pallet_bounds = Vec3::new(pallet.length, pallet.width, stack_limit);
    let layout = GridLayout::floor_first(
        pallet.length,
        pallet.width,
        pallet.height,
        stack_limit,
        orientation.dimensions(),
    );
    let filler = CartonGridFiller::new(layout, pallet_bounds, *orientation, config.general_epsilon);
    let mut pallet_units = Distributor::new(filler, carton.quantity, config.max_units);
    let pallets: VecDeque<PackedPallet> = pallet_units
        .by_ref()
        .map(|unit| PackedPallet::new(*pallet, unit.items, carton.weight))
        .collect();
    let pallet_cap_reached = pallet_units.hit_unit_cap();

    if pallets.is_empty() {
        return Distribution::from_containers(Vec::new(), layout.capacity(), false, None);
    }

    let loaded_height = pallets
        .iter()
        .map(|p| p.loaded_height)
        .fold(pallet.height, f64::max);
    let capacity = advise_pallet_capacity(
        container,
        pallet.length,
        pallet.width,
        loaded_height,
        true,
    );

    let turned = capacity.floor.swapped;
    let footprint = if turned { pallet.turned() } else { *pallet };
    let cell = Vec3::new(footprint.length, footprint.width, loaded_height);
    let container_bounds = container.dimensions();
    let container_layout =
        GridLayout::floor_first(container.length, container.width, 0.0, container.height, cell)
            .with_tiers(capacity.allowed_tiers);

    let pallet_count = pallets.len();
    let group_filler = PalletGroupFiller {
        pallets,
        layout: container_layout,
        bounds: container_bounds,
        per_container: capacity.limit,
        turned,
        epsilon: config.general_epsilon,
    };
    let mut container_units = Distributor::new(group_filler, pallet_count, config.max_units);
    let containers: Vec<PackedContainer> = container_units
        .by_ref()
        .enumerate()
        .map(|(index, unit)| {
            PackedContainer::new(
                *container,
                container_offset(index, container, config),
                ContainerContents::Pallets(unit.items),
                carton.weight,
            )
        })
        .collect();

    Distribution::from_containers(
        containers,
        layout.capacity(),
        pallet_cap_reached || container_units.hit_unit_cap(),
        Some(capacity),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{find_out_of_bounds, find_overlap};
    use crate::model::AxisOrder;
    use crate::types::EPSILON_GENERAL;

    struct CountingFiller {
        per_unit: usize,
    }

    impl UnitFiller for CountingFiller {
        type Item = usize;

        fn next_unit(&mut self, remaining: usize) -> Option<FilledUnit<usize>> {
            let take = self.per_unit.min(remaining);
            Some(FilledUnit {
                items: (0..take).collect(),
                consumed: take,
            })
        }
    }

    fn carton(quantity: usize) -> CartonSpec {
        CartonSpec {
            length: 30.0,
            width: 20.0,
            height: 15.0,
            weight: 2.0,
            quantity,
        }
    }

    fn euro_pallet() -> PalletSpec {
        PalletSpec {
            length: 120.0,
            width: 80.0,
            height: 14.5,
            max_weight: 1500.0,
        }
    }

    fn forty_foot() -> ContainerSpec {
        ContainerSpec {
            length: 1203.0,
            width: 235.0,
            height: 239.0,
            max_weight: 26_500.0,
        }
    }

    #[test]
    fn test_distributor_stops_when_quantity_is_placed() {
        let mut units = Distributor::new(CountingFiller { per_unit: 4 }, 10, 100);
        let consumed: Vec<usize> = units.by_ref().map(|u| u.consumed).collect();
        assert_eq!(consumed, vec![4, 4, 2]);
        assert_eq!(units.remaining(), 0);
        assert!(!units.hit_unit_cap());
        assert!(units.next().is_none());
    }

    #[test]
    fn test_distributor_respects_unit_cap() {
        let mut units = Distributor::new(CountingFiller { per_unit: 1 }, 1_000_000, 25);
        assert_eq!(units.by_ref().count(), 25);
        assert!(units.hit_unit_cap());
        assert_eq!(units.remaining(), 1_000_000 - 25);
    }

    #[test]
    fn test_distributor_stops_on_empty_unit() {
        let mut units = Distributor::new(CountingFiller { per_unit: 0 }, 10, 100);
        assert!(units.next().is_none());
        assert_eq!(units.remaining(), 10);
        assert!(!units.hit_unit_cap());
    }

    #[test]
    fn test_direct_loading_splits_across_containers() {
        let container = ContainerSpec {
            length: 60.0,
            width: 40.0,
            height: 30.0,
            max_weight: 100.0,
        };
        let orientation = Orientation::new(30.0, 20.0, 15.0, AxisOrder::Lwh);
        let config = PackingConfig::default();
        let plan = distribute_direct(&carton(19), &container, &orientation, &config);

        assert_eq!(plan.capacity_per_unit, 8);
        assert_eq!(plan.containers.len(), 3);
        assert_eq!(plan.cartons_packed, 19);
        assert_eq!(plan.units_used(), 3);
        let counts: Vec<usize> = plan.containers.iter().map(|c| c.carton_count).collect();
        assert_eq!(counts, vec![8, 8, 3]);
        assert_eq!(plan.containers[1].position.0, 60.0 + config.container_gap);
        assert_eq!(plan.containers[2].position.1, 0.0);
    }

    #[test]
    fn test_direct_loading_honours_unit_cap() {
        let container = ContainerSpec {
            length: 30.0,
            width: 20.0,
            height: 15.0,
            max_weight: 100.0,
        };
        let orientation = Orientation::new(30.0, 20.0, 15.0, AxisOrder::Lwh);
        let config = PackingConfig::builder().max_units(5).build();
        let plan = distribute_direct(&carton(50), &container, &orientation, &config);
        assert_eq!(plan.containers.len(), 5);
        assert_eq!(plan.cartons_packed, 5);
        assert!(plan.unit_cap_reached);
    }

    #[test]
    fn test_palletized_loading_builds_layers_and_groups_pallets() {
        let orientation = Orientation::new(40.0, 40.0, 30.0, AxisOrder::Lwh);
        let config = PackingConfig::default();
        // stack limit 120: (120 - 14.5) / 30 = 3 layers of 6 -> 18 per pallet
        let plan = distribute_palletized(
            &carton(100),
            &euro_pallet(),
            &forty_foot(),
            120.0,
            &orientation,
            &config,
        );

        assert_eq!(plan.capacity_per_unit, 18);
        assert_eq!(plan.cartons_packed, 100);
        assert_eq!(plan.pallets_used, 6);
        assert_eq!(plan.containers.len(), 1);

        let ContainerContents::Pallets(pallets) = &plan.containers[0].contents else {
            panic!("expected pallets");
        };
        let counts: Vec<usize> = pallets.iter().map(|p| p.carton_count).collect();
        assert_eq!(counts, vec![18, 18, 18, 18, 18, 10]);
        assert!((pallets[0].loaded_height - 104.5).abs() < 1e-9);
        for pallet in pallets {
            let bounds = Vec3::new(
                pallet.pallet_dimensions.length,
                pallet.pallet_dimensions.width,
                120.0,
            );
            assert_eq!(find_overlap(&pallet.cartons), None);
            assert_eq!(find_out_of_bounds(&pallet.cartons, bounds, EPSILON_GENERAL), None);
            assert!(pallet.cartons.iter().all(|c| c.position.2 >= 14.5));
        }
        // the second pallet sits next to the first along the container width
        assert_eq!(pallets[1].position, (0.0, 80.0, 0.0));
    }

    #[test]
    fn test_palletized_loading_opens_new_container_at_limit() {
        let small = ContainerSpec {
            length: 589.0,
            width: 235.0,
            height: 239.0,
            max_weight: 21_000.0,
        };
        let orientation = Orientation::new(40.0, 40.0, 30.0, AxisOrder::Lwh);
        let plan = distribute_palletized(
            &carton(200),
            &euro_pallet(),
            &small,
            120.0,
            &orientation,
            &PackingConfig::default(),
        );
        // 12 pallets needed, 8 per 20-foot container (single tier)
        assert_eq!(plan.pallets_used, 12);
        assert_eq!(plan.containers.len(), 2);
        assert_eq!(plan.cartons_packed, 200);
        assert_eq!(plan.pallet_capacity.map(|c| c.limit), Some(8));
        assert_eq!(plan.containers[0].contents.len(), 8);
        assert_eq!(plan.containers[1].contents.len(), 4);
    }

    #[test]
    fn test_stack_limit_falls_back_to_container_height() {
        assert_eq!(pallet_stack_limit(300.0, &forty_foot()), 239.0);
        assert_eq!(pallet_stack_limit(200.0, &forty_foot()), 200.0);
        assert_eq!(pallet_stack_limit(0.0, &forty_foot()), 239.0);
        assert_eq!(pallet_stack_limit(f64::NAN, &forty_foot()), 239.0);
        assert_eq!(pallet_stack_limit(150.0, &forty_foot()), 150.0);
    }

    #[test]
    fn test_pallets_are_turned_when_that_fits_more() {
        // 250 x 130 floor: lengthwise 2 x 1 = 2, turned 3 x 1 = 3
        let narrow = ContainerSpec {
            length: 250.0,
            width: 130.0,
            height: 239.0,
            max_weight: 10_000.0,
        };
        let orientation = Orientation::new(40.0, 40.0, 30.0, AxisOrder::Lwh);
        let plan = distribute_palletized(
            &carton(40),
            &euro_pallet(),
            &narrow,
            120.0,
            &orientation,
            &PackingConfig::default(),
        );
        assert_eq!(plan.pallets_used, 3);
        assert_eq!(plan.containers.len(), 1);
        let ContainerContents::Pallets(pallets) = &plan.containers[0].contents else {
            panic!("expected pallets");
        };
        for (index, pallet) in pallets.iter().enumerate() {
            assert!(pallet.turned);
            assert_eq!(pallet.pallet_dimensions.length, 80.0);
            assert_eq!(pallet.position, (index as f64 * 80.0, 0.0, 0.0));
            let bounds = Vec3::new(80.0, 120.0, 120.0);
            assert_eq!(find_out_of_bounds(&pallet.cartons, bounds, EPSILON_GENERAL), None);
            assert_eq!(find_overlap(&pallet.cartons), None);
        }
    }

    #[test]
    fn test_pallet_that_does_not_fit_container_packs_nothing() {
        let short = ContainerSpec {
            length: 70.0,
            width: 235.0,
            height: 239.0,
            max_weight: 26_500.0,
        };
        let orientation = Orientation::new(40.0, 40.0, 30.0, AxisOrder::Lwh);
        let plan = distribute_palletized(
            &carton(10),
            &euro_pallet(),
            &short,
            120.0,
            &orientation,
            &PackingConfig::default(),
        );
        assert_eq!(plan.cartons_packed, 0);
        assert_eq!(plan.pallets_used, 0);
        assert!(plan.containers.is_empty());
        assert_eq!(plan.pallet_capacity.map(|c| c.limit), Some(0));
    }
}
