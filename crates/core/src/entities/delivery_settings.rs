//! Delivery defaults (single document).

use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{CREATED_AT, Entity, Patch, Singleton, SortOrder};

/// Fees and cut-offs applied when a district has no specific fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySettings {
    pub base_fee: Decimal,
    #[serde(default)]
    pub free_delivery_threshold: Option<Decimal>,
    pub same_day_cutoff: NaiveTime,
}

impl DeliverySettings {
    /// Fee to charge for an order.
    ///
    /// Orders at or above the free-delivery threshold ship free; otherwise the
    /// district's fee applies, falling back to the base fee.
    #[must_use]
    pub fn fee_for(&self, district_fee: Option<Decimal>, subtotal: Decimal) -> Decimal {
        if self
            .free_delivery_threshold
            .is_some_and(|threshold| subtotal >= threshold)
        {
            return Decimal::ZERO;
        }
        district_fee.unwrap_or(self.base_fee)
    }

    /// Whether an order placed at `time` can still be delivered the same day.
    #[must_use]
    pub fn accepts_same_day(&self, time: NaiveTime) -> bool {
        time < self.same_day_cutoff
    }
}

/// Mutable delivery settings fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeliverySettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub free_delivery_threshold: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_day_cutoff: Option<NaiveTime>,
}

impl Patch for DeliverySettingsPatch {}

impl Entity for DeliverySettings {
    const COLLECTION: &'static str = "delivery_settings";
    const NATURAL_ORDER: SortOrder = SortOrder::ascending(CREATED_AT);
    type Patch = DeliverySettingsPatch;
}

impl Singleton for DeliverySettings {
    const DOCUMENT_ID: &'static str = "delivery";

    fn defaults() -> Self {
        Self {
            base_fee: Decimal::new(5_000, 0),
            free_delivery_threshold: Some(Decimal::new(100_000, 0)),
            same_day_cutoff: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fee_for_uses_district_then_base() {
        let settings = DeliverySettings::defaults();
        let small = Decimal::new(30_000, 0);
        assert_eq!(
            settings.fee_for(Some(Decimal::new(8_000, 0)), small),
            Decimal::new(8_000, 0)
        );
        assert_eq!(settings.fee_for(None, small), Decimal::new(5_000, 0));
    }

    #[test]
    fn test_fee_for_free_above_threshold() {
        let settings = DeliverySettings::defaults();
        assert_eq!(
            settings.fee_for(Some(Decimal::new(8_000, 0)), Decimal::new(100_000, 0)),
            Decimal::ZERO
        );

        let no_threshold = DeliverySettings {
            free_delivery_threshold: None,
            ..DeliverySettings::defaults()
        };
        assert_eq!(
            no_threshold.fee_for(None, Decimal::new(1_000_000, 0)),
            Decimal::new(5_000, 0)
        );
    }

    #[test]
    fn test_same_day_cutoff() {
        let settings = DeliverySettings::defaults();
        let before = NaiveTime::from_hms_opt(13, 59, 0).unwrap_or(NaiveTime::MIN);
        let after = NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN);
        assert!(settings.accepts_same_day(before));
        assert!(!settings.accepts_same_day(after));
    }
}
