//! Data models for the load planner.
//!
//! This module defines the inputs and outputs of one optimization run:
//! - `CartonSpec`, `PalletSpec`, `ContainerSpec`, `Constraints`: immutable inputs
//! - `Orientation` / `AxisOrder`: how a carton is turned before it is placed
//! - `CartonPlacement`, `PackedPallet`, `PackedContainer`: the concrete placement plan
//! - `OptimizationResult`: the aggregate handed to reporting and rendering
//!
//! All lengths are centimetres and all weights kilograms. Positions are measured from
//! the origin of the owning volume with x along its length, y along its width and z up.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::capacity::PalletCapacity;
use crate::types::{BoundingBox, Dimensional, Vec3, Weighted};

/// Validation error for input data.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    InvalidDimension(String),
    InvalidWeight(String),
    InvalidQuantity(String),
    MissingPallet,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidDimension(msg) => write!(f, "Invalid dimension: {}", msg),
            ValidationError::InvalidWeight(msg) => write!(f, "Invalid weight: {}", msg),
            ValidationError::InvalidQuantity(msg) => write!(f, "Invalid quantity: {}", msg),
            ValidationError::MissingPallet => {
                write!(f, "Pallet loading was selected but no pallet was given")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_weight_value(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_box(
    prefix: &str,
    (length, width, height): (f64, f64, f64),
) -> Result<(), ValidationError> {
    validate_dimension(length, &format!("{prefix} length"))?;
    validate_dimension(width, &format!("{prefix} width"))?;
    validate_dimension(height, &format!("{prefix} height"))?;
    Ok(())
}

/// The carton to be loaded; all cartons of one request are identical.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"length": 30.0, "width": 20.0, "height": 15.0, "weight": 4.5, "quantity": 50}))]
pub struct CartonSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub quantity: usize,
}

impl CartonSpec {
    /// Checks dimensions, weight and quantity.
    ///
    /// # Examples
    /// ```ignore
    /// let carton = CartonSpec { length: 30.0, width: 20.0, height: 15.0, weight: 4.5, quantity: 50 };
    /// assert!(carton.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_box("Carton", (self.length, self.width, self.height))?;
        validate_weight_value(self.weight, "Carton weight")?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(
                "Quantity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Dimensional for CartonSpec {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

impl Weighted for CartonSpec {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// A pallet; `height` is the height of the empty pallet deck.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"length": 120.0, "width": 80.0, "height": 14.5, "max_weight": 1500.0}))]
pub struct PalletSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub max_weight: f64,
}

impl PalletSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_box("Pallet", (self.length, self.width, self.height))?;
        validate_weight_value(self.max_weight, "Pallet max weight")
    }

    /// The same pallet turned by a quarter turn on the floor.
    pub fn turned(&self) -> Self {
        Self {
            length: self.width,
            width: self.length,
            ..*self
        }
    }
}

impl Dimensional for PalletSpec {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Inner dimensions and payload limit of a shipping container.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"length": 1203.0, "width": 235.0, "height": 239.0, "max_weight": 26500.0}))]
pub struct ContainerSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub max_weight: f64,
}

impl ContainerSpec {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_box("Container", (self.length, self.width, self.height))?;
        validate_weight_value(self.max_weight, "Container max weight")
    }
}

impl Dimensional for ContainerSpec {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// Rotation and stacking rules for the cartons.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Constraints {
    /// Upper bound for pallet deck plus cargo; ignored for direct container loading.
    pub max_stack_height: f64,
    /// Allows swapping length and width.
    pub allow_rotation_on_base: bool,
    /// Allows swapping the height with a horizontal axis.
    pub allow_vertical_rotation: bool,
    /// Disables every orientation that would tip the carton.
    pub this_side_up: bool,
}

impl Constraints {
    pub const DEFAULT_MAX_STACK_HEIGHT: f64 = 180.0;

    /// Whether tipped orientations may be generated.
    pub fn allows_tipping(&self) -> bool {
        self.allow_vertical_rotation && !self.this_side_up
    }
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_stack_height: Self::DEFAULT_MAX_STACK_HEIGHT,
            allow_rotation_on_base: true,
            allow_vertical_rotation: false,
            this_side_up: false,
        }
    }
}

/// Which original carton axis ends up on which placed axis.
///
/// `WLH` reads as: the original width lies along the placed length, the original
/// length along the placed width, the original height stays vertical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum AxisOrder {
    #[serde(rename = "LWH")]
    Lwh,
    #[serde(rename = "WLH")]
    Wlh,
    #[serde(rename = "LHW")]
    Lhw,
    #[serde(rename = "HLW")]
    Hlw,
    #[serde(rename = "WHL")]
    Whl,
    #[serde(rename = "HWL")]
    Hwl,
}

impl AxisOrder {
    pub fn code(&self) -> &'static str {
        match self {
            AxisOrder::Lwh => "LWH",
            AxisOrder::Wlh => "WLH",
            AxisOrder::Lhw => "LHW",
            AxisOrder::Hlw => "HLW",
            AxisOrder::Whl => "WHL",
            AxisOrder::Hwl => "HWL",
        }
    }

    /// The label after exchanging the two horizontal axes.
    pub fn swapped(&self) -> Self {
        match self {
            AxisOrder::Lwh => AxisOrder::Wlh,
            AxisOrder::Wlh => AxisOrder::Lwh,
            AxisOrder::Lhw => AxisOrder::Hlw,
            AxisOrder::Hlw => AxisOrder::Lhw,
            AxisOrder::Whl => AxisOrder::Hwl,
            AxisOrder::Hwl => AxisOrder::Whl,
        }
    }

    /// Whether the original height axis is no longer vertical.
    pub fn is_tipped(&self) -> bool {
        !matches!(self, AxisOrder::Lwh | AxisOrder::Wlh)
    }
}

impl std::fmt::Display for AxisOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Effective carton dimensions after turning it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct Orientation {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub label: AxisOrder,
}

impl Orientation {
    pub const fn new(length: f64, width: f64, height: f64, label: AxisOrder) -> Self {
        Self {
            length,
            width,
            height,
            label,
        }
    }

    /// Unit cube used when the carton dimensions are unusable.
    pub const fn fallback() -> Self {
        Self::new(1.0, 1.0, 1.0, AxisOrder::Lwh)
    }

    /// Same orientation with length and width exchanged.
    pub fn swapped(&self) -> Self {
        Self::new(self.width, self.length, self.height, self.label.swapped())
    }
}

impl Dimensional for Orientation {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// One carton in the plan.
///
/// Invariant: `position + (length, width, height)` stays inside the owning volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct CartonPlacement {
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    pub rotation: AxisOrder,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl CartonPlacement {
    pub fn new(position: Vec3, orientation: &Orientation) -> Self {
        Self {
            position: position.as_tuple(),
            rotation: orientation.label,
            length: orientation.length,
            width: orientation.width,
            height: orientation.height,
        }
    }

    #[inline]
    pub fn position_vec3(&self) -> Vec3 {
        Vec3::from_tuple(self.position)
    }

    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(self.position_vec3(), self.dimensions())
    }

    /// Mirrors the placement across the floor diagonal of its volume.
    ///
    /// Applied to every carton of a pallet, the result is a valid layout for the
    /// same pallet turned by a quarter turn.
    pub fn transposed(&self) -> Self {
        let (x, y, z) = self.position;
        Self {
            position: (y, x, z),
            rotation: self.rotation.swapped(),
            length: self.width,
            width: self.length,
            height: self.height,
        }
    }
}

impl Dimensional for CartonPlacement {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// A loaded pallet.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedPallet {
    /// Footprint as placed; length and width are exchanged when `turned` is set.
    pub pallet_dimensions: PalletSpec,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    pub turned: bool,
    /// Cartons in placement order; z starts at the pallet deck.
    pub cartons: Vec<CartonPlacement>,
    pub carton_count: usize,
    pub cargo_weight: f64,
    /// Deck height plus the top of the highest carton layer.
    pub loaded_height: f64,
}

impl PackedPallet {
    pub fn new(pallet: PalletSpec, cartons: Vec<CartonPlacement>, carton_weight: f64) -> Self {
        let loaded_height = cartons
            .iter()
            .map(|c| c.position.2 + c.height)
            .fold(pallet.height, f64::max);
        let carton_count = cartons.len();
        Self {
            pallet_dimensions: pallet,
            position: (0.0, 0.0, 0.0),
            turned: false,
            cartons,
            carton_count,
            cargo_weight: carton_count as f64 * carton_weight,
            loaded_height,
        }
    }

    /// Places the pallet at `position`, turning it (and its cargo) when requested.
    pub fn placed_at(mut self, position: Vec3, turned: bool) -> Self {
        if turned {
            self.pallet_dimensions = self.pallet_dimensions.turned();
            self.cartons = self.cartons.iter().map(CartonPlacement::transposed).collect();
            self.turned = !self.turned;
        }
        self.position = position.as_tuple();
        self
    }

    pub fn carton_volume(&self) -> f64 {
        self.cartons.iter().map(Dimensional::volume).sum()
    }
}

/// What a container holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Cartons,
    Pallets,
}

/// Homogeneous container contents.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ContainerContents {
    Cartons(Vec<CartonPlacement>),
    Pallets(Vec<PackedPallet>),
}

impl ContainerContents {
    pub fn content_type(&self) -> ContentType {
        match self {
            ContainerContents::Cartons(_) => ContentType::Cartons,
            ContainerContents::Pallets(_) => ContentType::Pallets,
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn len(&self) -> usize {
        match self {
            ContainerContents::Cartons(items) => items.len(),
            ContainerContents::Pallets(items) => items.len(),
        }
    }

    pub fn carton_count(&self) -> usize {
        match self {
            ContainerContents::Cartons(items) => items.len(),
            ContainerContents::Pallets(pallets) => pallets.iter().map(|p| p.carton_count).sum(),
        }
    }

    pub fn carton_volume(&self) -> f64 {
        match self {
            ContainerContents::Cartons(items) => items.iter().map(Dimensional::volume).sum(),
            ContainerContents::Pallets(pallets) => {
                pallets.iter().map(PackedPallet::carton_volume).sum()
            }
        }
    }
}

/// A loaded container.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedContainer {
    pub container_dimensions: ContainerSpec,
    /// Side-by-side layout for display; only x is used.
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub position: (f64, f64, f64),
    pub content_type: ContentType,
    pub contents: ContainerContents,
    pub carton_count: usize,
    pub cargo_weight: f64,
    /// Carton volume over container volume, in percent.
    pub utilization: f64,
    /// Cargo weight over container payload, in percent. Not capped.
    pub weight_utilization: f64,
}

impl PackedContainer {
    pub fn new(
        container: ContainerSpec,
        position: Vec3,
        contents: ContainerContents,
        carton_weight: f64,
    ) -> Self {
        let carton_count = contents.carton_count();
        let cargo_weight = carton_count as f64 * carton_weight;
        let utilization = percent(contents.carton_volume(), container.volume()).min(100.0);
        let weight_utilization = percent(cargo_weight, container.max_weight);
        Self {
            container_dimensions: container,
            position: position.as_tuple(),
            content_type: contents.content_type(),
            contents,
            carton_count,
            cargo_weight,
            utilization,
            weight_utilization,
        }
    }

    pub fn is_overweight(&self) -> bool {
        self.cargo_weight > self.container_dimensions.max_weight
    }
}

/// Fill order used by the placement engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStrategy {
    /// Column by column, bottom to top; direct container loading.
    HeightFirstColumnar,
    /// Layer by layer over the whole floor; pallets and pallets in containers.
    FloorFirstLayered,
}

impl PlacementStrategy {
    pub fn for_loading(use_pallets: bool) -> Self {
        if use_pallets {
            PlacementStrategy::FloorFirstLayered
        } else {
            PlacementStrategy::HeightFirstColumnar
        }
    }
}

/// How one orientation fared, for reporting.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CandidateSummary {
    pub orientation: Orientation,
    pub cartons_per_layer: usize,
    pub layers: usize,
    pub capacity_per_unit: usize,
    pub units_needed: Option<usize>,
    pub cartons_packed: usize,
    pub units_used: usize,
    pub space_utilization: f64,
}

/// Everything one optimization run produces.
///
/// Invariant: `total_cartons_packed + remaining_cartons == quantity`.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct OptimizationResult {
    pub containers: Vec<PackedContainer>,
    pub total_cartons_packed: usize,
    pub remaining_cartons: usize,
    pub total_pallets_used: usize,
    pub containers_used: usize,
    pub total_weight: f64,
    /// Sampled from the first generated unit, capped at 100.
    pub space_utilization: f64,
    /// Sampled from the first generated unit, not capped.
    pub weight_utilization: f64,
    pub selected_pattern: PlacementStrategy,
    pub best_orientation: Option<Orientation>,
    pub weight_warning: Option<String>,
    pub fragile: bool,
    pub candidates: Vec<CandidateSummary>,
    /// How many pallets one container takes, and why; pallet loading only.
    pub pallet_capacity: Option<PalletCapacity>,
    /// Generation stopped at the unit cap; `remaining_cartons` may be non-zero.
    pub unit_cap_reached: bool,
}

impl OptimizationResult {
    /// Result for a run that placed nothing.
    pub fn empty(quantity: usize, pattern: PlacementStrategy, fragile: bool) -> Self {
        Self {
            containers: Vec::new(),
            total_cartons_packed: 0,
            remaining_cartons: quantity,
            total_pallets_used: 0,
            containers_used: 0,
            total_weight: 0.0,
            space_utilization: 0.0,
            weight_utilization: 0.0,
            selected_pattern: pattern,
            best_orientation: None,
            weight_warning: None,
            fragile,
            candidates: Vec::new(),
            pallet_capacity: None,
            unit_cap_reached: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_cartons == 0
    }
}

/// The four inputs of one run plus the loading mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "carton": {"length": 30.0, "width": 20.0, "height": 15.0, "weight": 4.5, "quantity": 50},
        "container": {"length": 1200.0, "width": 240.0, "height": 260.0, "max_weight": 26000.0},
        "use_pallets": false,
        "constraints": {"allow_rotation_on_base": false}
    })
)]
pub struct LoadRequest {
    pub carton: CartonSpec,
    pub container: ContainerSpec,
    #[serde(default)]
    #[schema(nullable = true)]
    pub pallet: Option<PalletSpec>,
    #[serde(default)]
    pub use_pallets: bool,
    #[serde(default)]
    pub constraints: Constraints,
    /// Accepted and echoed; placement does not depend on it.
    #[serde(default)]
    pub fragile: bool,
}

impl LoadRequest {
    /// Structural checks only; degenerate dimensions are left to the optimizer.
    pub fn check_structure(&self) -> Result<(), ValidationError> {
        if self.use_pallets && self.pallet.is_none() {
            return Err(ValidationError::MissingPallet);
        }
        Ok(())
    }

    pub fn strategy(&self) -> PlacementStrategy {
        PlacementStrategy::for_loading(self.use_pallets)
    }
}

/// `part / whole` in percent; zero when `whole` is not positive.
pub fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}
