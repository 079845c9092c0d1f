//! Startup hydration support: cancellation and expired-cart recovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, warn};
use wildenflower_core::CartLineSnapshot;

use super::persistence;
use super::remote::CartService;
use crate::shopify::Cart;
use crate::storage::KeyValueStore;

/// Cancels an in-progress hydration.
///
/// Clones share the flag. Once cancelled, hydration stops writing session
/// state at its next suspension point.
#[derive(Debug, Clone, Default)]
pub struct HydrationGuard {
    cancelled: Arc<AtomicBool>,
}

impl HydrationGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Result of trying to replace an expired cart.
#[derive(Debug)]
pub(crate) enum Recovery {
    /// A new cart was created from the snapshot and persisted.
    Recovered(Cart),
    /// Creation failed; persisted keys were cleared.
    Abandoned,
    /// The guard was cancelled while creating.
    Cancelled,
}

/// Recreate an expired cart from its line snapshot.
///
/// Never fails: on any error the persisted cart is forgotten so the next
/// start begins empty.
pub(crate) async fn recover_expired_cart(
    service: &dyn CartService,
    store: &dyn KeyValueStore,
    snapshot: &[CartLineSnapshot],
    guard: &HydrationGuard,
) -> Recovery {
    match service.create_cart(snapshot).await {
        Ok(cart) => {
            if guard.is_cancelled() {
                return Recovery::Cancelled;
            }
            persistence::save(store, &cart).await;
            info!(cart_id = %cart.id, lines = snapshot.len(), "Recovered expired cart");
            Recovery::Recovered(cart)
        }
        Err(e) => {
            warn!(error = %e, "Cart recovery failed, starting empty");
            persistence::forget(store).await;
            if guard.is_cancelled() {
                Recovery::Cancelled
            } else {
                Recovery::Abandoned
            }
        }
    }
}
