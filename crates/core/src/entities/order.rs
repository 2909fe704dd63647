//! Customer orders.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Entity, Patch};
use crate::types::{
    CurrencyCode, DeliveryMethod, DocumentId, OrderStatus, PaymentStatus, PhoneNumber, Price,
};

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderItem {
    /// Quantity times unit price, or `None` if it overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// A bouquet/arrangement order.
///
/// `customer_id` is a loose reference: deleting the customer leaves it
/// dangling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub customer_id: Option<DocumentId>,
    pub customer_name: String,
    pub customer_phone: PhoneNumber,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub delivery_fee: Decimal,
    #[serde(default)]
    pub ribbon_message: Option<String>,
    #[serde(default)]
    pub memo: Option<String>,
}

impl Order {
    /// Document field holding the order status.
    pub const STATUS_FIELD: &'static str = "status";

    /// Sum of all line totals, or `None` if it overflows.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
    }

    /// Subtotal plus delivery fee, or `None` if it overflows.
    #[must_use]
    pub fn total(&self) -> Option<Decimal> {
        self.subtotal()?.checked_add(self.delivery_fee)
    }

    /// Total as a displayable price in the shop currency.
    #[must_use]
    pub fn total_price(&self, currency: CurrencyCode) -> Option<Price> {
        self.total().map(|total| Price::new(total, currency))
    }
}

/// Mutable order fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_phone: Option<PhoneNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<OrderItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_fee: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ribbon_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl Patch for OrderPatch {}

impl Entity for Order {
    const COLLECTION: &'static str = "orders";
    type Patch = OrderPatch;
}
