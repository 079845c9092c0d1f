//! Durable key-value storage.
//!
//! The cart session and favorites persist small JSON strings under fixed
//! keys. Backends:
//!
//! - [`FileStore`] - one JSON object file on disk, survives restarts
//! - [`MemoryStore`] - process-local map, with failure injection for tests
//!
//! Callers treat every [`StoreError`] as "key absent" on reads and ignore it
//! (after logging) on writes.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use thiserror::Error;

/// Key holding the current cart's Shopify ID.
pub const CART_ID_KEY: &str = "@wildenflower/cart_id";

/// Key holding the JSON array of `{variantId, quantity}` line snapshots.
pub const CART_SNAPSHOT_KEY: &str = "@wildenflower/cart_snapshot";

/// Key holding the JSON array of favorite snapshots.
pub const FAVORITES_KEY: &str = "wildenflower_favorites";

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// String key-value storage that outlives the process.
///
/// No ordering or atomicity is promised across keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never set or was removed.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove several keys.
    async fn remove_all(&self, keys: &[&str]) -> Result<()>;
}
