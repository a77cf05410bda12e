//! Load plan optimization.
//!
//! For every legal carton orientation the optimizer generates a complete plan (direct
//! container loading or pallets in containers) and keeps the one that places the most
//! cartons. Ties go to fewer units, then to the smaller floor footprint, then to the
//! better space utilization of the first unit.
//!
//! The computation is synchronous and depends only on its inputs; invalid inputs give
//! an empty plan instead of an error.

use serde::Serialize;

use crate::distributor::{Distribution, distribute_direct, distribute_palletized, pallet_stack_limit};
use crate::model::{
    AxisOrder, CandidateSummary, CartonSpec, ContainerContents, ContainerSpec, ContentType,
    LoadRequest, OptimizationResult, PackedContainer, PalletSpec, percent,
};
use crate::orientation::{RankedOrientation, enumerate_orientations, rank_orientations};
use crate::types::{Dimensional, EPSILON_GENERAL, Weighted};

/// Configuration for the optimizer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Tolerance for boundary comparisons
    pub general_epsilon: f64,
    /// Safety cap on generated pallets and on generated containers
    pub max_units: usize,
    /// Spacing between containers in the side-by-side layout
    pub container_gap: f64,
}

impl PackingConfig {
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;
    pub const DEFAULT_MAX_UNITS: usize = 500;
    pub const DEFAULT_CONTAINER_GAP: f64 = 50.0;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
            max_units: Self::DEFAULT_MAX_UNITS,
            container_gap: Self::DEFAULT_CONTAINER_GAP,
        }
    }
}

/// Builder for `PackingConfig`.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    pub fn max_units(mut self, max_units: usize) -> Self {
        self.config.max_units = max_units;
        self
    }

    pub fn container_gap(mut self, gap: f64) -> Self {
        self.config.container_gap = gap;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Progress events for live views.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum OptimizeEvent {
    /// A complete plan was generated for one orientation.
    CandidateEvaluated {
        orientation: AxisOrder,
        dims: (f64, f64, f64),
        cartons_packed: usize,
        units_used: usize,
        space_utilization: f64,
    },
    /// A container of the selected plan.
    ContainerLoaded {
        index: usize,
        content_type: ContentType,
        carton_count: usize,
        utilization: f64,
        weight_utilization: f64,
    },
    /// Optimization finished.
    Finished {
        total_cartons_packed: usize,
        remaining_cartons: usize,
        containers: usize,
    },
}

/// Optimizes a load with the default configuration.
#[cfg_attr(not(test), allow(dead_code))]
pub fn optimize(request: &LoadRequest) -> OptimizationResult {
    optimize_with_config(request, PackingConfig::default())
}

/// Optimizes a load with a custom configuration.
pub fn optimize_with_config(request: &LoadRequest, config: PackingConfig) -> OptimizationResult {
    optimize_with_progress(request, config, |_| {})
}

/// The loading mode after validation.
enum Loading<'a> {
    Direct,
    Palletized { pallet: &'a PalletSpec, stack_limit: f64 },
}

impl Loading<'_> {
    /// Floor and stacking height the cartons are ranked against.
    fn base(&self, container: &ContainerSpec) -> (f64, f64, f64) {
        match self {
            Loading::Direct => (container.length, container.width, container.height),
            Loading::Palletized {
                pallet,
                stack_limit,
            } => (pallet.length, pallet.width, stack_limit - pallet.height),
        }
    }
}

fn validated_loading(request: &LoadRequest) -> Option<Loading<'_>> {
    request.carton.validate().ok()?;
    request.container.validate().ok()?;
    if !request.use_pallets {
        return Some(Loading::Direct);
    }
    let pallet = request.pallet.as_ref()?;
    pallet.validate().ok()?;
    let stack_limit = pallet_stack_limit(request.constraints.max_stack_height, &request.container);
    Some(Loading::Palletized {
        pallet,
        stack_limit,
    })
}

/// Optimizes a load and reports progress through `on_event`.
pub fn optimize_with_progress(
    request: &LoadRequest,
    config: PackingConfig,
    mut on_event: impl FnMut(&OptimizeEvent),
) -> OptimizationResult {
    let carton = &request.carton;
    let container = &request.container;
    let pattern = request.strategy();

    let Some(loading) = validated_loading(request) else {
        let result = OptimizationResult::empty(carton.quantity, pattern, request.fragile);
        emit_finished(&result, &mut on_event);
        return result;
    };

    let orientations = enumerate_orientations(carton.dimensions(), &request.constraints);
    let (base_length, base_width, available_height) = loading.base(container);
    let ranked = rank_orientations(
        &orientations,
        base_length,
        base_width,
        available_height,
        carton.quantity,
        request.constraints.allow_rotation_on_base,
    );

    let mut summaries = Vec::new();
    let mut best: Option<Candidate> = None;

    for entry in ranked.iter().filter(|r| r.is_viable()) {
        let distribution = match &loading {
            Loading::Direct => distribute_direct(carton, container, &entry.orientation, &config),
            Loading::Palletized { pallet, .. } => distribute_palletized(
                carton,
                pallet,
                container,
                request.constraints.max_stack_height,
                &entry.orientation,
                &config,
            ),
        };
        let sample = sample_first_unit(&distribution, carton, &loading);
        let candidate = Candidate {
            ranked: *entry,
            distribution,
            sample,
        };

        let summary = candidate.summary();
        on_event(&OptimizeEvent::CandidateEvaluated {
            orientation: summary.orientation.label,
            dims: summary.orientation.dimensions().as_tuple(),
            cartons_packed: summary.cartons_packed,
            units_used: summary.units_used,
            space_utilization: summary.space_utilization,
        });
        summaries.push(summary);

        if best.as_ref().is_none_or(|current| candidate.beats(current)) {
            best = Some(candidate);
        }
    }

    let result = match best {
        Some(best) => build_result(request, &loading, best, summaries),
        None => OptimizationResult::empty(carton.quantity, pattern, request.fragile),
    };

    for (index, packed) in result.containers.iter().enumerate() {
        on_event(&OptimizeEvent::ContainerLoaded {
            index: index + 1,
            content_type: packed.content_type,
            carton_count: packed.carton_count,
            utilization: packed.utilization,
            weight_utilization: packed.weight_utilization,
        });
    }
    emit_finished(&result, &mut on_event);
    result
}

fn emit_finished(result: &OptimizationResult, on_event: &mut impl FnMut(&OptimizeEvent)) {
    on_event(&OptimizeEvent::Finished {
        total_cartons_packed: result.total_cartons_packed,
        remaining_cartons: result.remaining_cartons,
        containers: result.containers.len(),
    });
}

/// Space and weight utilization of the first generated unit, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct UnitSample {
    space: f64,
    weight: f64,
}

fn sample_first_unit(distribution: &Distribution, carton: &CartonSpec, loading: &Loading<'_>) -> UnitSample {
    let Some(first) = distribution.containers.first() else {
        return UnitSample::default();
    };

    match (&first.contents, loading) {
        (
            ContainerContents::Pallets(pallets),
            Loading::Palletized {
                pallet,
                stack_limit,
            },
        ) => {
            let Some(first_pallet) = pallets.first() else {
                return UnitSample::default();
            };
            let usable_volume = pallet.length * pallet.width * (stack_limit - pallet.height);
            let pallet_weight = percent(
                first_pallet.carton_count as f64 * carton.weight(),
                pallet.max_weight,
            );
            // The container payload limit binds too.
            UnitSample {
                space: percent(first_pallet.carton_volume(), usable_volume).min(100.0),
                weight: pallet_weight.max(first.weight_utilization),
            }
        }
        _ => UnitSample {
            space: first.utilization,
            weight: first.weight_utilization,
        },
    }
}

/// One orientation with its generated plan.
struct Candidate {
    ranked: RankedOrientation,
    distribution: Distribution,
    sample: UnitSample,
}

impl Candidate {
    /// More cartons; then fewer units; then less floor; then better space use.
    fn beats(&self, other: &Candidate) -> bool {
        let (mine, theirs) = (&self.distribution, &other.distribution);
        if mine.cartons_packed != theirs.cartons_packed {
            return mine.cartons_packed > theirs.cartons_packed;
        }
        if mine.units_used() != theirs.units_used() {
            return mine.units_used() < theirs.units_used();
        }
        let footprint_delta = self.ranked.floor_footprint - other.ranked.floor_footprint;
        if footprint_delta.abs() > EPSILON_GENERAL {
            return footprint_delta < 0.0;
        }
        self.sample.space > other.sample.space + EPSILON_GENERAL
    }

    fn summary(&self) -> CandidateSummary {
        CandidateSummary {
            orientation: self.ranked.orientation,
            cartons_per_layer: self.ranked.cartons_per_layer,
            layers: self.ranked.layers,
            capacity_per_unit: self.distribution.capacity_per_unit,
            units_needed: self.ranked.units_needed,
            cartons_packed: self.distribution.cartons_packed,
            units_used: self.distribution.units_used(),
            space_utilization: self.sample.space,
        }
    }
}

fn build_result(
    request: &LoadRequest,
    loading: &Loading<'_>,
    best: Candidate,
    candidates: Vec<CandidateSummary>,
) -> OptimizationResult {
    let carton = &request.carton;
    let Candidate {
        ranked,
        distribution,
        sample,
    } = best;

    let packed = distribution.cartons_packed.min(carton.quantity);
    let weight_warning = weight_warning(&distribution.containers, sample, loading);

    OptimizationResult {
        total_cartons_packed: packed,
        remaining_cartons: carton.quantity - packed,
        total_pallets_used: distribution.pallets_used,
        containers_used: distribution.containers.len(),
        total_weight: packed as f64 * carton.weight(),
        space_utilization: sample.space,
        weight_utilization: sample.weight,
        selected_pattern: request.strategy(),
        best_orientation: Some(ranked.orientation),
        weight_warning,
        fragile: request.fragile,
        candidates,
        pallet_capacity: distribution.pallet_capacity,
        unit_cap_reached: distribution.unit_cap_reached,
        containers: distribution.containers,
    }
}

/// Collects every weight problem of the plan into one message.
fn weight_warning(
    containers: &[PackedContainer],
    sample: UnitSample,
    loading: &Loading<'_>,
) -> Option<String> {
    let mut messages = Vec::new();

    if sample.weight > 100.0 {
        messages.push(format!(
            "Weight utilization is {:.1}% of the allowed load",
            sample.weight
        ));
    }

    let overweight_containers = containers.iter().filter(|c| c.is_overweight()).count();
    if overweight_containers > 0 {
        messages.push(format!(
            "{} of {} containers exceed their maximum payload",
            overweight_containers,
            containers.len()
        ));
    }

    if let Loading::Palletized { pallet, .. } = loading {
        let (overweight_pallets, total_pallets) = containers
            .iter()
            .filter_map(|c| match &c.contents {
                ContainerContents::Pallets(pallets) => Some(pallets),
                ContainerContents::Cartons(_) => None,
            })
            .flatten()
            .fold((0usize, 0usize), |(over, total), p| {
                (over + usize::from(p.cargo_weight > pallet.max_weight), total + 1)
            });
        if overweight_pallets > 0 {
            messages.push(format!(
                "{} of {} pallets exceed their maximum load of {} kg",
                overweight_pallets, total_pallets, pallet.max_weight
            ));
        }
    }

    if messages.is_empty() {
        None
    } else {
        Some(messages.join(". "))
    }
}
