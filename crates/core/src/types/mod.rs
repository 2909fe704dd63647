//! Core value types for the florist admin backend.

pub mod id;
pub mod phone;
pub mod price;
pub mod status;
pub mod timestamp;

pub use id::*;
pub use phone::{PhoneNumber, PhoneNumberError};
pub use price::{CurrencyCode, Price};
pub use status::*;
pub use timestamp::Timestamp;
