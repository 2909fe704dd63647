//! Florist Core - Shared domain types.
//!
//! This crate provides the types shared by the admin service, the CLI and the
//! integration tests:
//! - [`types`] - IDs, timestamps, money, statuses and phone numbers
//! - [`entity`] - the traits every stored entity implements and the
//!   [`Record`] envelope that adds an ID and write timestamps
//! - [`entities`] - the concrete shop entities and their typed patches
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod entities;
pub mod entity;
pub mod types;

pub use entities::*;
pub use entity::*;
pub use types::*;
