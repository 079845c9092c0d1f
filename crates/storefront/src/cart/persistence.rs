//! Reading and writing the persisted cart identity.
//!
//! Two keys: the cart ID as a raw string and the line snapshot as a JSON
//! array. They are written independently, so after a crash they may disagree;
//! hydration only trusts the ID and treats the snapshot as a recovery hint.

use tracing::warn;
use wildenflower_core::{CartId, CartLineSnapshot};

use crate::shopify::Cart;
use crate::storage::{CART_ID_KEY, CART_SNAPSHOT_KEY, KeyValueStore};

/// What a previous session left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct PersistedCart {
    pub cart_id: Option<CartId>,
    pub snapshot: Vec<CartLineSnapshot>,
}

/// Read the persisted cart. Storage failures read as absent.
pub(crate) async fn load(store: &dyn KeyValueStore) -> PersistedCart {
    let cart_id = read(store, CART_ID_KEY)
        .await
        .filter(|id| !id.trim().is_empty())
        .map(CartId::new);

    let snapshot = match read(store, CART_SNAPSHOT_KEY).await {
        Some(raw) => parse_snapshot(&raw),
        None => Vec::new(),
    };

    PersistedCart { cart_id, snapshot }
}

/// Persist the cart ID and a fresh line snapshot. Best effort.
pub(crate) async fn save(store: &dyn KeyValueStore, cart: &Cart) {
    if let Err(e) = store.set(CART_ID_KEY, cart.id.as_str()).await {
        warn!(error = %e, key = CART_ID_KEY, "Failed to persist cart id");
    }

    match serde_json::to_string(&cart.snapshot()) {
        Ok(json) => {
            if let Err(e) = store.set(CART_SNAPSHOT_KEY, &json).await {
                warn!(error = %e, key = CART_SNAPSHOT_KEY, "Failed to persist cart snapshot");
            }
        }
        Err(e) => warn!(error = %e, "Failed to serialize cart snapshot"),
    }
}

/// Remove both keys. Best effort.
pub(crate) async fn forget(store: &dyn KeyValueStore) {
    if let Err(e) = store.remove_all(&[CART_ID_KEY, CART_SNAPSHOT_KEY]).await {
        warn!(error = %e, "Failed to clear persisted cart");
    }
}

/// Parse a stored snapshot; anything unparseable is an empty snapshot.
pub(crate) fn parse_snapshot(raw: &str) -> Vec<CartLineSnapshot> {
    serde_json::from_str(raw).unwrap_or_else(|e| {
        warn!(error = %e, "Discarding unparseable cart snapshot");
        Vec::new()
    })
}

async fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, key, "Failed to read persisted cart");
            None
        }
    }
}
