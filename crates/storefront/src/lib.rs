//! Campick Storefront library.
//!
//! Client-side building blocks for the campus food-ordering storefront and
//! the shop-owner console: a persistent single-shop cart with change
//! notifications, a bearer-token gate, a typed REST client for the backend,
//! checkout, an orders view that reconciles by refetching, and a bridge that
//! turns push notifications into toasts and refreshes.
//!
//! # Example
//!
//! ```rust,ignore
//! use campick_storefront::{config::ClientConfig, state::ClientState};
//!
//! let config = ClientConfig::from_env()?;
//! let state = ClientState::open(config)?;
//!
//! let mut events = state.cart().subscribe();
//! state.cart().add_item(line_item)?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod console;
pub mod error;
pub mod notifications;
pub mod orders;
pub mod state;
pub mod storage;
