//! Per-district delivery fees.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Patch, Searchable, SortOrder};

/// Delivery fee charged for one district.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFee {
    pub district: String,
    pub fee: Decimal,
    #[serde(default)]
    pub memo: Option<String>,
}

/// Mutable delivery fee fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryFeePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Patch for DeliveryFeePatch {}

impl Entity for DeliveryFee {
    const COLLECTION: &'static str = "delivery_fees";
    const NATURAL_ORDER: SortOrder = SortOrder::ascending("district");
    type Patch = DeliveryFeePatch;
}

impl Searchable for DeliveryFee {
    const SEARCH_FIELD: &'static str = "district";
}
