//! Money amounts and display formatting.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount paired with the currency it is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (won, dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, e.g. `₩45,000` or `$19.99`.
    ///
    /// The amount is rounded to the currency's minor units and the integer
    /// part is grouped in thousands.
    #[must_use]
    pub fn display(&self) -> String {
        let scale = self.currency_code.minor_units();
        let rounded = self
            .amount
            .abs()
            .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{rounded:.prec$}", prec = scale as usize);
        let (int_part, frac_part) = text
            .split_once('.')
            .map_or((text.as_str(), None), |(i, f)| (i, Some(f)));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.amount.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let symbol = self.currency_code.symbol();
        match frac_part {
            Some(frac) => format!("{sign}{symbol}{grouped}.{frac}"),
            None => format!("{sign}{symbol}{grouped}"),
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted in shop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    KRW,
    USD,
    EUR,
    JPY,
}

impl CurrencyCode {
    /// Currency symbol used for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::KRW => "₩",
            Self::USD => "$",
            Self::EUR => "€",
            Self::JPY => "¥",
        }
    }

    /// Number of decimal places used by the currency.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::KRW | Self::JPY => 0,
            Self::USD | Self::EUR => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_krw_groups_thousands() {
        let price = Price::new(Decimal::new(45_000, 0), CurrencyCode::KRW);
        assert_eq!(price.display(), "₩45,000");

        let price = Price::new(Decimal::new(1_234_567, 0), CurrencyCode::KRW);
        assert_eq!(price.display(), "₩1,234,567");
    }

    #[test]
    fn test_display_usd_keeps_cents() {
        let price = Price::new(Decimal::new(1999, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$19.99");

        let price = Price::new(Decimal::new(5, 0), CurrencyCode::USD);
        assert_eq!(price.display(), "$5.00");
    }

    #[test]
    fn test_display_negative_and_small() {
        let price = Price::new(Decimal::new(-3000, 0), CurrencyCode::KRW);
        assert_eq!(price.display(), "-₩3,000");

        let price = Price::new(Decimal::new(999, 0), CurrencyCode::KRW);
        assert_eq!(price.display(), "₩999");
    }
}
