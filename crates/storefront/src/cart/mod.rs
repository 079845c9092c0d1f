//! Cart session: the locally held view of one Shopify cart.
//!
//! Shopify owns the cart. The session keeps the latest cart returned by
//! Shopify, persists just enough to find it again (the cart ID and a
//! `{variantId, quantity}` snapshot), and recreates it from the snapshot when
//! the persisted ID has expired.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized -> Hydrating -> Ready
//!                      |    \-> Recovering -> Ready | Empty
//!                      \-> Empty
//! ```
//!
//! Mutations are serialized per session. Each one snapshots the state, calls
//! Shopify, then either adopts and persists the returned cart or restores the
//! snapshot. They report success as a `bool` and never return errors.

mod hydration;
#[cfg(test)]
pub(crate) mod mock;
mod persistence;
mod remote;
mod state;

pub use hydration::HydrationGuard;
pub use remote::CartService;
pub use state::{Activity, CartState, InFlight, SessionPhase};

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, info, instrument, warn};
use wildenflower_core::{CartId, CartLineId, CartLineSnapshot, VariantId};

use crate::checkout::{self, CheckoutNavigator};
use crate::shopify::{Cart, CartLineUpdateInput, ShopifyError};
use crate::storage::KeyValueStore;

use hydration::{Recovery, recover_expired_cart};
use state::{Baseline, InFlightGuard};

/// Handle to a cart session. Clones share the same session.
#[derive(Clone)]
pub struct CartSession {
    inner: Arc<CartSessionInner>,
}

struct CartSessionInner {
    service: Arc<dyn CartService>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn CheckoutNavigator>,
    state: watch::Sender<CartState>,
    // Held for the whole of every hydration and mutation
    gate: Mutex<()>,
}

impl CartSession {
    /// Create an uninitialized session. Call [`hydrate`](Self::hydrate) next.
    #[must_use]
    pub fn new(
        service: Arc<dyn CartService>,
        store: Arc<dyn KeyValueStore>,
        navigator: Arc<dyn CheckoutNavigator>,
    ) -> Self {
        let (state, _) = watch::channel(CartState::default());
        Self {
            inner: Arc::new(CartSessionInner {
                service,
                store,
                navigator,
                state,
                gate: Mutex::new(()),
            }),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Snapshot of the full session state.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.subscribe()
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase
    }

    #[must_use]
    pub fn cart_id(&self) -> Option<CartId> {
        self.inner.state.borrow().cart_id.clone()
    }

    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.inner.state.borrow().cart.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading()
    }

    #[must_use]
    pub fn is_adding(&self) -> bool {
        self.inner.state.borrow().is_adding()
    }

    #[must_use]
    pub fn is_removing(&self) -> bool {
        self.inner.state.borrow().is_removing()
    }

    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.inner.state.borrow().is_updating()
    }

    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.inner.state.borrow().item_count()
    }

    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.inner.state.borrow().subtotal()
    }

    #[must_use]
    pub fn checkout_url(&self) -> Option<String> {
        self.inner.state.borrow().checkout_url().map(str::to_string)
    }

    // =========================================================================
    // Hydration
    // =========================================================================

    /// Restore the persisted cart. See [`hydrate_with`](Self::hydrate_with).
    pub async fn hydrate(&self) -> SessionPhase {
        self.hydrate_with(&HydrationGuard::new()).await
    }

    /// Restore the persisted cart, stopping without further state writes once
    /// `guard` is cancelled.
    ///
    /// Never fails. Returns the phase the session ended in.
    #[instrument(skip_all)]
    pub async fn hydrate_with(&self, guard: &HydrationGuard) -> SessionPhase {
        let inner = &self.inner;
        let _flag = InFlightGuard::begin(&inner.state, Activity::Hydrate);
        let _gate = inner.gate.lock().await;

        if guard.is_cancelled() {
            return self.phase();
        }
        inner.state.send_modify(|s| s.phase = SessionPhase::Hydrating);

        let persisted = persistence::load(inner.store.as_ref()).await;
        if guard.is_cancelled() {
            return self.phase();
        }

        let Some(cart_id) = persisted.cart_id else {
            debug!("No persisted cart");
            inner.state.send_modify(CartState::reset);
            return SessionPhase::Empty;
        };

        let fetched = inner.service.get_cart(&cart_id).await;
        if guard.is_cancelled() {
            return self.phase();
        }

        match fetched {
            Ok(Some(cart)) => {
                debug!(cart_id = %cart.id, lines = cart.lines.len(), "Adopted persisted cart");
                inner.state.send_modify(|s| s.adopt(cart));
                SessionPhase::Ready
            }
            Ok(None) => {
                info!(cart_id = %cart_id, "Persisted cart expired, recovering");
                inner.state.send_modify(|s| s.phase = SessionPhase::Recovering);

                match recover_expired_cart(
                    inner.service.as_ref(),
                    inner.store.as_ref(),
                    &persisted.snapshot,
                    guard,
                )
                .await
                {
                    Recovery::Recovered(cart) => {
                        inner.state.send_modify(|s| s.adopt(cart));
                        SessionPhase::Ready
                    }
                    Recovery::Abandoned => {
                        inner.state.send_modify(CartState::reset);
                        SessionPhase::Empty
                    }
                    Recovery::Cancelled => self.phase(),
                }
            }
            Err(e) => {
                warn!(error = %e, cart_id = %cart_id, "Failed to fetch persisted cart, starting empty");
                inner.state.send_modify(CartState::reset);
                SessionPhase::Empty
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add `quantity` of a variant, creating the cart if there is none.
    ///
    /// The quantity is forwarded as given; stock limits are the caller's
    /// concern.
    #[instrument(skip(self, variant_id))]
    pub async fn add_to_cart(&self, variant_id: impl Into<VariantId>, quantity: i64) -> bool {
        let line = [CartLineSnapshot::new(variant_id, quantity)];
        let inner = &self.inner;

        let _flag = InFlightGuard::begin(&inner.state, Activity::Add);
        let _gate = inner.gate.lock().await;
        let baseline = self.baseline();

        let result = match &baseline.cart_id {
            Some(cart_id) => inner.service.add_lines(cart_id, &line).await,
            None => inner.service.create_cart(&line).await,
        };

        self.settle(Activity::Add, baseline, result).await
    }

    /// Remove a line. Returns `false` without calling Shopify when there is
    /// no cart.
    #[instrument(skip(self, line_id))]
    pub async fn remove_from_cart(&self, line_id: impl Into<CartLineId>) -> bool {
        let line_id = line_id.into();
        if self.cart_id().is_none() {
            return false;
        }

        let inner = &self.inner;
        let _flag = InFlightGuard::begin(&inner.state, Activity::Remove);
        let _gate = inner.gate.lock().await;
        let baseline = self.baseline();

        // A queued clear may have run first
        let Some(cart_id) = baseline.cart_id.clone() else {
            return false;
        };

        let result = inner.service.remove_lines(&cart_id, &[line_id]).await;
        self.settle(Activity::Remove, baseline, result).await
    }

    /// Set a line's quantity. Zero or less removes the line instead, since
    /// Shopify rejects zero-quantity updates.
    #[instrument(skip(self, line_id))]
    pub async fn update_quantity(&self, line_id: impl Into<CartLineId>, quantity: i64) -> bool {
        let line_id = line_id.into();
        if self.cart_id().is_none() {
            return false;
        }

        let inner = &self.inner;
        let _flag = InFlightGuard::begin(&inner.state, Activity::Update);
        let _gate = inner.gate.lock().await;
        let baseline = self.baseline();

        let Some(cart_id) = baseline.cart_id.clone() else {
            return false;
        };

        let result = if quantity <= 0 {
            inner.service.remove_lines(&cart_id, &[line_id]).await
        } else {
            inner
                .service
                .update_lines(&cart_id, &[CartLineUpdateInput::new(line_id, quantity)])
                .await
        };

        self.settle(Activity::Update, baseline, result).await
    }

    /// Forget the cart locally. The remote cart is abandoned, not deleted.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        let inner = &self.inner;
        let _flag = InFlightGuard::begin(&inner.state, Activity::Clear);
        let _gate = inner.gate.lock().await;

        persistence::forget(inner.store.as_ref()).await;
        inner.state.send_modify(CartState::reset);
        info!("Cart cleared");
    }

    /// Send the shopper to hosted checkout. No-op without a checkout URL.
    pub fn open_checkout(&self) {
        let url = self.checkout_url();
        checkout::hand_off(self.inner.navigator.as_ref(), url.as_deref());
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn baseline(&self) -> Baseline {
        self.inner.state.borrow().baseline()
    }

    /// Adopt and persist a successful result, or roll back to `baseline`.
    async fn settle(
        &self,
        activity: Activity,
        baseline: Baseline,
        result: Result<Cart, ShopifyError>,
    ) -> bool {
        match result {
            Ok(cart) => {
                persistence::save(self.inner.store.as_ref(), &cart).await;
                debug!(
                    ?activity,
                    cart_id = %cart.id,
                    total_quantity = cart.total_quantity,
                    "Cart mutation applied"
                );
                self.inner.state.send_modify(|s| s.adopt(cart));
                true
            }
            Err(e) => {
                warn!(?activity, error = %e, status = ?e.status(), "Cart mutation failed, rolling back");
                self.inner.state.send_modify(|s| s.restore(baseline));
                false
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::cart::mock::{Call, MockCartService, Op};
    use crate::checkout::RedirectNavigator;
    use crate::storage::{CART_ID_KEY, CART_SNAPSHOT_KEY, MemoryStore};

    const VARIANT_1: &str = "gid://shopify/ProductVariant/1";
    const VARIANT_2: &str = "gid://shopify/ProductVariant/2";

    struct Harness {
        session: CartSession,
        service: Arc<MockCartService>,
        store: Arc<MemoryStore>,
        navigator: Arc<RedirectNavigator>,
    }

    fn harness_with(store: MemoryStore) -> Harness {
        let service = Arc::new(MockCartService::new());
        let store = Arc::new(store);
        let navigator = Arc::new(RedirectNavigator::new());
        let session = CartSession::new(service.clone(), store.clone(), navigator.clone());
        Harness {
            session,
            service,
            store,
            navigator,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryStore::new())
    }

    /// Session hydrated onto a seeded cart with the given lines.
    async fn ready_harness(lines: &[(&str, &str, i64)]) -> Harness {
        let h = harness_with(MemoryStore::with_entries([(CART_ID_KEY, "gid://shopify/Cart/c1")]));
        h.service.seed_cart("gid://shopify/Cart/c1", lines).await;
        assert_eq!(h.session.hydrate().await, SessionPhase::Ready);
        h.service.clear_calls().await;
        h
    }

    fn multiset(lines: &[CartLineSnapshot]) -> Vec<(String, i64)> {
        let mut pairs: Vec<_> = lines
            .iter()
            .map(|l| (l.variant_id.to_string(), l.quantity))
            .collect();
        pairs.sort();
        pairs
    }

    async fn persisted_snapshot(store: &MemoryStore) -> Vec<CartLineSnapshot> {
        serde_json::from_str(&store.peek(CART_SNAPSHOT_KEY).await.unwrap()).unwrap()
    }

    async fn wait_until(rx: &mut watch::Receiver<CartState>, f: impl Fn(&CartState) -> bool) {
        rx.wait_for(|s| f(s)).await.unwrap();
    }

    // -------------------------------------------------------------------------
    // Hydration
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_hydrate_without_persisted_cart() {
        let h = harness();
        assert!(h.session.is_loading());

        assert_eq!(h.session.hydrate().await, SessionPhase::Empty);

        assert_eq!(h.session.cart_id(), None);
        assert_eq!(h.session.cart(), None);
        assert!(!h.session.is_loading());
        assert!(h.service.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_hydrate_is_idempotent() {
        let h = harness_with(MemoryStore::with_entries([(CART_ID_KEY, "gid://shopify/Cart/c1")]));
        h.service
            .seed_cart("gid://shopify/Cart/c1", &[("L1", VARIANT_1, 2)])
            .await;

        h.session.hydrate().await;
        let first = h.session.cart();
        h.session.hydrate().await;
        let second = h.session.cart();

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(h.session.phase(), SessionPhase::Ready);
        assert!(
            h.service
                .calls()
                .await
                .iter()
                .all(|c| matches!(c, Call::Get(_)))
        );
    }

    #[tokio::test]
    async fn test_hydrate_recovers_expired_cart() {
        let snapshot = vec![
            CartLineSnapshot::new(VARIANT_1, 2),
            CartLineSnapshot::new(VARIANT_2, 1),
            CartLineSnapshot::new("gid://shopify/ProductVariant/3", 4),
        ];
        let h = harness_with(MemoryStore::with_entries([
            (CART_ID_KEY, "gid://shopify/Cart/expired".to_string()),
            (CART_SNAPSHOT_KEY, serde_json::to_string(&snapshot).unwrap()),
        ]));

        assert_eq!(h.session.hydrate().await, SessionPhase::Ready);

        let calls = h.service.calls().await;
        assert_eq!(
            calls,
            vec![
                Call::Get(CartId::new("gid://shopify/Cart/expired")),
                Call::Create(snapshot.clone()),
            ]
        );

        let new_id = h.session.cart_id().unwrap();
        assert_ne!(new_id.as_str(), "gid://shopify/Cart/expired");
        assert_eq!(h.store.peek(CART_ID_KEY).await.as_deref(), Some(new_id.as_str()));
        assert_eq!(h.session.item_count(), 7);
    }

    #[tokio::test]
    async fn test_hydrate_recovery_failure_falls_back_to_empty() {
        let h = harness_with(MemoryStore::with_entries([
            (CART_ID_KEY, "gid://shopify/Cart/expired"),
            (CART_SNAPSHOT_KEY, r#"[{"variantId":"gid://shopify/ProductVariant/1","quantity":1}]"#),
        ]));
        h.service.fail(Op::Create).await;

        assert_eq!(h.session.hydrate().await, SessionPhase::Empty);

        assert_eq!(h.session.cart_id(), None);
        assert_eq!(h.session.cart(), None);
        assert!(!h.store.contains(CART_ID_KEY).await);
        assert!(!h.store.contains(CART_SNAPSHOT_KEY).await);
    }

    #[tokio::test]
    async fn test_hydrate_fetch_error_falls_back_to_empty() {
        let h = harness_with(MemoryStore::with_entries([(CART_ID_KEY, "gid://shopify/Cart/c1")]));
        h.service.fail(Op::Get).await;

        assert_eq!(h.session.hydrate().await, SessionPhase::Empty);
        assert_eq!(h.session.cart(), None);
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_hydrate_storage_read_failure_starts_empty() {
        let store = MemoryStore::with_entries([(CART_ID_KEY, "gid://shopify/Cart/c1")]);
        store.set_fail_reads(true).await;
        let h = harness_with(store);

        assert_eq!(h.session.hydrate().await, SessionPhase::Empty);
        assert!(h.service.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_hydration_writes_no_state() {
        let h = harness_with(MemoryStore::with_entries([(CART_ID_KEY, "gid://shopify/Cart/c1")]));
        h.service
            .seed_cart("gid://shopify/Cart/c1", &[("L1", VARIANT_1, 1)])
            .await;
        h.service.hold();

        let guard = HydrationGuard::new();
        let task = {
            let session = h.session.clone();
            let guard = guard.clone();
            tokio::spawn(async move { session.hydrate_with(&guard).await })
        };

        // Wait for the fetch to be issued, then tear down.
        while h.service.calls().await.is_empty() {
            tokio::task::yield_now().await;
        }
        guard.cancel();
        h.service.release();
        task.await.unwrap();

        assert_eq!(h.session.cart_id(), None);
        assert_eq!(h.session.cart(), None);
        assert_ne!(h.session.phase(), SessionPhase::Ready);
        assert!(!h.session.is_loading());
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_first_add_creates_cart() {
        let h = harness();
        h.session.hydrate().await;

        assert!(h.session.add_to_cart(VARIANT_1, 2).await);

        assert_eq!(
            h.service.calls().await,
            vec![Call::Create(vec![CartLineSnapshot::new(VARIANT_1, 2)])]
        );
        let cart = h.session.cart().unwrap();
        assert_eq!(h.session.phase(), SessionPhase::Ready);
        assert_eq!(
            h.store.peek(CART_ID_KEY).await.as_deref(),
            Some(cart.id.as_str())
        );
        assert_eq!(h.session.item_count(), cart.total_quantity);
        assert_eq!(h.session.item_count(), 2);
        assert!((h.session.subtotal() - 30.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_add_to_existing_cart() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;

        assert!(h.session.add_to_cart(VARIANT_2, 3).await);

        assert_eq!(
            h.service.calls().await,
            vec![Call::Add(
                CartId::new("gid://shopify/Cart/c1"),
                vec![CartLineSnapshot::new(VARIANT_2, 3)]
            )]
        );
        assert_eq!(h.session.cart().unwrap().lines.len(), 2);
        assert_eq!(h.session.item_count(), 4);
    }

    #[tokio::test]
    async fn test_failed_add_rolls_back() {
        let h = ready_harness(&[("L1", VARIANT_1, 3)]).await;
        let before = h.session.cart();
        h.service.fail(Op::Add).await;

        assert!(!h.session.add_to_cart(VARIANT_2, 1).await);

        assert_eq!(h.session.cart(), before);
        assert_eq!(
            h.session.cart_id(),
            Some(CartId::new("gid://shopify/Cart/c1"))
        );
        assert!(!h.session.is_adding());
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_failed_first_add_stays_empty() {
        let h = harness();
        h.session.hydrate().await;
        h.service.fail(Op::Create).await;

        assert!(!h.session.add_to_cart(VARIANT_1, 1).await);

        assert_eq!(h.session.phase(), SessionPhase::Empty);
        assert_eq!(h.session.cart_id(), None);
        assert!(!h.store.contains(CART_ID_KEY).await);
    }

    #[tokio::test]
    async fn test_user_error_rolls_back() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;
        let before = h.session.cart();

        // The mock rejects unknown line IDs with a user error
        assert!(!h.session.update_quantity("gid://shopify/CartLine/missing", 2).await);

        assert_eq!(h.session.cart(), before);
    }

    #[tokio::test]
    async fn test_update_quantity_calls_update() {
        let h = ready_harness(&[("L1", VARIANT_1, 3)]).await;

        assert!(h.session.update_quantity("L1", 1).await);

        assert_eq!(
            h.service.calls().await,
            vec![Call::Update(
                CartId::new("gid://shopify/Cart/c1"),
                vec![CartLineUpdateInput::new("L1", 1)]
            )]
        );
        assert_eq!(h.session.item_count(), 1);
    }

    #[tokio::test]
    async fn test_zero_quantity_update_removes_line() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;

        assert!(h.session.update_quantity("L1", 0).await);

        assert_eq!(
            h.service.calls().await,
            vec![Call::Remove(
                CartId::new("gid://shopify/Cart/c1"),
                vec![CartLineId::new("L1")]
            )]
        );
        assert!(h.session.cart().unwrap().lines.is_empty());
        assert_eq!(h.session.item_count(), 0);
    }

    #[tokio::test]
    async fn test_negative_quantity_update_removes_line() {
        let h = ready_harness(&[("L1", VARIANT_1, 2)]).await;

        assert!(h.session.update_quantity("L1", -3).await);

        assert!(
            h.service
                .calls()
                .await
                .iter()
                .all(|c| !matches!(c, Call::Update(..)))
        );
    }

    #[tokio::test]
    async fn test_remove_from_cart() {
        let h = ready_harness(&[("L1", VARIANT_1, 1), ("L2", VARIANT_2, 2)]).await;

        assert!(h.session.remove_from_cart("L1").await);

        let cart = h.session.cart().unwrap();
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].id, CartLineId::new("L2"));
        assert_eq!(
            multiset(&persisted_snapshot(&h.store).await),
            vec![(VARIANT_2.to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_failed_remove_rolls_back() {
        let h = ready_harness(&[("L1", VARIANT_1, 1), ("L2", VARIANT_2, 2)]).await;
        let before = h.session.state();
        h.service.fail(Op::Remove).await;

        assert!(!h.session.remove_from_cart("L1").await);

        assert_eq!(h.session.state(), before);
        assert_eq!(h.session.cart().unwrap().lines.len(), 2);
        assert!(!h.session.is_removing());
    }

    #[tokio::test]
    async fn test_failed_zero_quantity_update_rolls_back() {
        let h = ready_harness(&[("L1", VARIANT_1, 3)]).await;
        let before = h.session.state();
        h.service.fail(Op::Remove).await;

        assert!(!h.session.update_quantity("L1", 0).await);

        assert_eq!(h.session.state(), before);
        assert_eq!(
            h.service.calls().await,
            vec![Call::Remove(
                CartId::new("gid://shopify/Cart/c1"),
                vec![CartLineId::new("L1")]
            )]
        );
        assert!(!h.session.is_updating());
    }

    #[tokio::test]
    async fn test_retry_after_failure_succeeds() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;
        h.service.fail(Op::Add).await;
        assert!(!h.session.add_to_cart(VARIANT_2, 1).await);

        h.service.succeed(Op::Add).await;
        assert!(h.session.add_to_cart(VARIANT_2, 1).await);
        assert_eq!(h.session.item_count(), 2);
    }

    #[tokio::test]
    async fn test_line_mutations_without_cart_are_rejected() {
        let h = harness();
        h.session.hydrate().await;

        assert!(!h.session.remove_from_cart("L1").await);
        assert!(!h.session.update_quantity("L1", 2).await);
        assert!(h.service.calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_cart_forgets_locally() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;
        h.store.set(CART_SNAPSHOT_KEY, "[]").await.unwrap();

        h.session.clear_cart().await;

        assert_eq!(h.session.phase(), SessionPhase::Empty);
        assert_eq!(h.session.cart(), None);
        assert!(!h.store.contains(CART_ID_KEY).await);
        assert!(!h.store.contains(CART_SNAPSHOT_KEY).await);
        assert!(h.service.calls().await.is_empty());
        assert!(
            h.service
                .stored(&CartId::new("gid://shopify/Cart/c1"))
                .await
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_persist_failure_still_succeeds() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;
        h.store.set_fail_writes(true).await;

        assert!(h.session.add_to_cart(VARIANT_2, 1).await);
        assert_eq!(h.session.item_count(), 2);
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_reproduces_cart() {
        let h = harness();
        h.session.hydrate().await;
        assert!(h.session.add_to_cart(VARIANT_1, 2).await);
        assert!(h.session.add_to_cart(VARIANT_2, 1).await);
        assert!(h.session.add_to_cart(VARIANT_1, 1).await);

        let live = h.session.cart().unwrap();
        let persisted = persisted_snapshot(&h.store).await;
        let recreated = h.service.create_cart(&persisted).await.unwrap();

        assert_eq!(multiset(&recreated.snapshot()), multiset(&live.snapshot()));
        assert_eq!(
            multiset(&live.snapshot()),
            vec![(VARIANT_1.to_string(), 3), (VARIANT_2.to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_restart_adopts_persisted_cart() {
        let h = harness();
        h.session.hydrate().await;
        assert!(h.session.add_to_cart(VARIANT_1, 2).await);
        let cart = h.session.cart().unwrap();

        let restarted = CartSession::new(
            h.service.clone(),
            h.store.clone(),
            Arc::new(RedirectNavigator::new()),
        );
        assert_eq!(restarted.hydrate().await, SessionPhase::Ready);
        assert_eq!(restarted.cart(), Some(cart));
    }

    #[tokio::test]
    async fn test_restart_recovers_cart_expired_between_runs() {
        let h = harness();
        h.session.hydrate().await;
        assert!(h.session.add_to_cart(VARIANT_1, 2).await);
        assert!(h.session.add_to_cart(VARIANT_2, 1).await);
        let old_id = h.session.cart_id().unwrap();
        h.service.expire(&old_id).await;

        let restarted = CartSession::new(
            h.service.clone(),
            h.store.clone(),
            Arc::new(RedirectNavigator::new()),
        );
        assert_eq!(restarted.hydrate().await, SessionPhase::Ready);

        let new_id = restarted.cart_id().unwrap();
        assert_ne!(new_id, old_id);
        assert_eq!(h.store.peek(CART_ID_KEY).await, Some(new_id.to_string()));
        assert_eq!(
            multiset(&restarted.cart().unwrap().snapshot()),
            vec![(VARIANT_1.to_string(), 2), (VARIANT_2.to_string(), 1)]
        );
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_in_flight_flags_track_pending_call() {
        let h = ready_harness(&[("L1", VARIANT_1, 3)]).await;
        let mut rx = h.session.subscribe();
        h.service.hold();

        let task = {
            let session = h.session.clone();
            tokio::spawn(async move { session.update_quantity("L1", 2).await })
        };

        wait_until(&mut rx, CartState::is_updating).await;
        assert!(h.session.is_loading());
        assert!(!h.session.is_adding());
        assert!(!h.session.is_removing());

        h.service.release();
        assert!(task.await.unwrap());

        assert!(!h.session.is_updating());
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_concurrent_adds_both_survive() {
        let h = harness();
        h.session.hydrate().await;

        let (a, b) = tokio::join!(
            h.session.add_to_cart(VARIANT_1, 1),
            h.session.add_to_cart(VARIANT_2, 2)
        );
        assert!(a && b);

        let calls = h.service.calls().await;
        assert_eq!(
            calls.iter().filter(|c| matches!(c, Call::Create(_))).count(),
            1
        );
        assert_eq!(
            multiset(&h.session.cart().unwrap().snapshot()),
            vec![(VARIANT_1.to_string(), 1), (VARIANT_2.to_string(), 2)]
        );
        assert_eq!(
            multiset(&persisted_snapshot(&h.store).await),
            vec![(VARIANT_1.to_string(), 1), (VARIANT_2.to_string(), 2)]
        );
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_open_checkout_without_url_is_noop() {
        let h = harness();
        h.session.hydrate().await;

        h.session.open_checkout();

        assert_eq!(h.navigator.current(), None);
    }

    #[tokio::test]
    async fn test_open_checkout_navigates_to_cart_url() {
        let h = ready_harness(&[("L1", VARIANT_1, 1)]).await;

        h.session.open_checkout();

        assert_eq!(
            h.navigator.current().map(String::from),
            h.session.checkout_url()
        );
    }
}
