//! Application state shared by everything that drives a storefront session.

use std::sync::Arc;

use crate::cart::CartSession;
use crate::checkout::navigator_for;
use crate::config::StorefrontConfig;
use crate::favorites::Favorites;
use crate::shopify::{ShopifyError, StorefrontClient};
use crate::storage::{FileStore, KeyValueStore};

/// Wired-up storefront: one Shopify client, one durable store, and the cart
/// session and favorites built on them.
///
/// Cheaply cloneable via `Arc`. Construct one per process.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storefront: StorefrontClient,
    cart: CartSession,
    favorites: Favorites,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// Storage lives at [`StorefrontConfig::store_path`]. Nothing is read
    /// until the session is hydrated and favorites are loaded.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, ShopifyError> {
        let storefront = StorefrontClient::new(&config.shopify)?;
        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(config.store_path()));
        Ok(Self::with_parts(config, storefront, store))
    }

    /// Build the state around an existing client and store.
    #[must_use]
    pub fn with_parts(
        config: StorefrontConfig,
        storefront: StorefrontClient,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let cart = CartSession::new(
            Arc::new(storefront.clone()),
            store.clone(),
            navigator_for(config.checkout_mode),
        );
        let favorites = Favorites::new(store);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                storefront,
                cart,
                favorites,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Shopify Storefront API client, for catalog lookups.
    #[must_use]
    pub fn storefront(&self) -> &StorefrontClient {
        &self.inner.storefront
    }

    #[must_use]
    pub fn cart(&self) -> &CartSession {
        &self.inner.cart
    }

    #[must_use]
    pub fn favorites(&self) -> &Favorites {
        &self.inner.favorites
    }
}
