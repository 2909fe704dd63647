//! Shop-wide settings (single document).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::entity::{CREATED_AT, Entity, Patch, Singleton, SortOrder};
use crate::types::CurrencyCode;

/// Shop identity, hours and currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopSettings {
    pub shop_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    #[serde(default)]
    pub currency: CurrencyCode,
}

impl ShopSettings {
    /// Whether the shop is open at `time`.
    ///
    /// Hours that wrap past midnight (close before open) are supported.
    #[must_use]
    pub fn is_open_at(&self, time: NaiveTime) -> bool {
        if self.open_time <= self.close_time {
            self.open_time <= time && time < self.close_time
        } else {
            time >= self.open_time || time < self.close_time
        }
    }
}

/// Mutable shop settings fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShopSettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shop_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
}

impl Patch for ShopSettingsPatch {}

impl Entity for ShopSettings {
    const COLLECTION: &'static str = "shop_settings";
    const NATURAL_ORDER: SortOrder = SortOrder::ascending(CREATED_AT);
    type Patch = ShopSettingsPatch;
}

impl Singleton for ShopSettings {
    const DOCUMENT_ID: &'static str = "shop";

    fn defaults() -> Self {
        Self {
            shop_name: "Flower Shop".to_owned(),
            phone: String::new(),
            address: String::new(),
            open_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            close_time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN),
            currency: CurrencyCode::KRW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap_or(NaiveTime::MIN)
    }

    #[test]
    fn test_default_hours() {
        let settings = ShopSettings::defaults();
        assert!(settings.is_open_at(at(9, 0)));
        assert!(settings.is_open_at(at(19, 59)));
        assert!(!settings.is_open_at(at(20, 0)));
        assert!(!settings.is_open_at(at(8, 59)));
    }

    #[test]
    fn test_overnight_hours() {
        let settings = ShopSettings {
            open_time: at(22, 0),
            close_time: at(2, 0),
            ..ShopSettings::defaults()
        };
        assert!(settings.is_open_at(at(23, 30)));
        assert!(settings.is_open_at(at(1, 0)));
        assert!(!settings.is_open_at(at(12, 0)));
    }

    #[test]
    fn test_patch_accepts_short_time_format() {
        let patch: ShopSettingsPatch =
            serde_json::from_str(r#"{"open_time": "10:30"}"#).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(patch.open_time, Some(at(10, 30)));
    }
}
