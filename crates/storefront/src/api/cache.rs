//! Cached values for public backend reads.

use super::types::{MenuItem, Shop};

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Shops(Vec<Shop>),
    Menu(Vec<MenuItem>),
}
