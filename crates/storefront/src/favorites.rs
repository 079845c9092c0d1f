//! Saved products, persisted as display snapshots.
//!
//! Each favorite carries everything needed to render it (title, image, price,
//! vendor) so the list shows without a catalog round trip. Newest first.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::warn;
use wildenflower_core::FavoriteSnapshot;

use crate::storage::{FAVORITES_KEY, KeyValueStore};

/// Persisted ordered set of favorite products, keyed by product ID.
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
    items: RwLock<Vec<FavoriteSnapshot>>,
}

impl Favorites {
    /// Create an empty list. Call [`load`](Self::load) to read saved entries.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            items: RwLock::new(Vec::new()),
        }
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// Missing, unreadable or malformed data loads as an empty list. Returns
    /// the number of favorites loaded.
    pub async fn load(&self) -> usize {
        let loaded = match self.store.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<Vec<FavoriteSnapshot>>(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "Discarding unparseable favorites");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read favorites");
                Vec::new()
            }
        };

        let count = loaded.len();
        *self.items.write().await = loaded;
        count
    }

    /// Remove the product if saved, otherwise save it at the front.
    ///
    /// Returns whether the product is a favorite afterwards. Persisting is
    /// best effort; the in-memory list changes regardless.
    pub async fn toggle(&self, snapshot: FavoriteSnapshot) -> bool {
        // Held through the save so overlapping toggles persist in order
        let mut items = self.items.write().await;
        let saved = if items.iter().any(|f| f.id == snapshot.id) {
            items.retain(|f| f.id != snapshot.id);
            false
        } else {
            items.insert(0, snapshot);
            true
        };

        self.save(&items).await;
        saved
    }

    pub async fn is_favorite(&self, product_id: &str) -> bool {
        self.items.read().await.iter().any(|f| f.id == product_id)
    }

    /// Saved favorites, newest first.
    pub async fn favorites(&self) -> Vec<FavoriteSnapshot> {
        self.items.read().await.clone()
    }

    pub async fn count(&self) -> usize {
        self.items.read().await.len()
    }

    async fn save(&self, items: &[FavoriteSnapshot]) {
        let json = match serde_json::to_string(items) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize favorites");
                return;
            }
        };
        if let Err(e) = self.store.set(FAVORITES_KEY, &json).await {
            warn!(error = %e, "Failed to persist favorites");
        }
    }
}
