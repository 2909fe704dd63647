//! Inventory materials (flowers, wrapping, ribbons...).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Patch, Searchable, SortOrder};
use crate::types::MaterialCategory;

/// A stocked material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub category: MaterialCategory,
    pub quantity: i64,
    pub unit: String,
    pub unit_cost: Decimal,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub reorder_level: Option<i64>,
}

impl Material {
    /// Whether stock is at or below the reorder level.
    #[must_use]
    pub fn needs_reorder(&self) -> bool {
        self.reorder_level.is_some_and(|level| self.quantity <= level)
    }
}

/// Mutable material fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaterialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<MaterialCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_cost: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<i64>,
}

impl Patch for MaterialPatch {}

impl Entity for Material {
    const COLLECTION: &'static str = "materials";
    const NATURAL_ORDER: SortOrder = SortOrder::ascending("name");
    type Patch = MaterialPatch;
}

impl Searchable for Material {
    const SEARCH_FIELD: &'static str = "name";
}
