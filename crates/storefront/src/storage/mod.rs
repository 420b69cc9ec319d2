//! Durable client-side key/value storage.
//!
//! Mirrors the semantics of browser local storage: string keys, string
//! values, synchronous access, no transactions. Every component that needs
//! to persist state shares one [`Storage`] handle.
//!
//! Storage is a best-effort cache, never a system of record. Callers treat a
//! failing backend as "nothing persisted" and carry on with in-memory state.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Well-known storage keys.
pub mod keys {
    /// Cart line items (JSON array).
    pub const CART_ITEMS: &str = "cartItems";

    /// Cart sidebar open/closed flag (JSON boolean).
    pub const CART_SIDEBAR_STATE: &str = "cartSidebarState";

    /// Bearer token issued by the auth backend.
    pub const TOKEN: &str = "token";

    /// Snapshot of the shop the shopper last opened (JSON object).
    pub const SELECTED_SHOP: &str = "selectedShop";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document is not valid JSON.
    #[error("storage document is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A synchronous string key/value store.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn clear(&self) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON value, treating failures as absent.
///
/// Unreadable or malformed values are logged and reported as `None`.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(raw) => raw?,
        Err(e) => {
            tracing::warn!(key, error = %e, "Storage read failed, using defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding malformed stored value");
            None
        }
    }
}

/// Serialize and write a JSON value, logging instead of failing.
///
/// Returns whether the value was persisted.
pub(crate) fn write_json<T: serde::Serialize + ?Sized>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> bool {
    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to serialize value for storage");
            return false;
        }
    };

    match storage.set(key, &raw) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "Storage write failed, keeping in-memory state only");
            false
        }
    }
}
