//! Campick Core - Shared types library.
//!
//! This crate provides common types used across all Campick components:
//! - `storefront` - Client library for shoppers and shop owners
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no storage,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, roles, and statuses
//! - [`cart`] - The single-shop cart value and its mutation rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{AddOutcome, Cart, CartConflict, CartLineItem, RemoveOutcome};
pub use types::*;
