//! Shop entities stored by the admin service.
//!
//! Each entity has a matching `*Patch` type listing the fields that may be
//! changed after creation.

pub mod customer;
pub mod delivery_fee;
pub mod delivery_settings;
pub mod material;
pub mod order;
pub mod shop_settings;

pub use customer::{Customer, CustomerPatch};
pub use delivery_fee::{DeliveryFee, DeliveryFeePatch};
pub use delivery_settings::{DeliverySettings, DeliverySettingsPatch};
pub use material::{Material, MaterialPatch};
pub use order::{Order, OrderItem, OrderPatch};
pub use shop_settings::{ShopSettings, ShopSettingsPatch};
