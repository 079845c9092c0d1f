//! Published cart state and the projections derived from it.

use tokio::sync::watch;
use wildenflower_core::CartId;

use crate::shopify::Cart;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Created, hydration not started.
    #[default]
    Uninitialized,
    /// Reading the persisted cart and fetching it from Shopify.
    Hydrating,
    /// The persisted cart expired; recreating it from the line snapshot.
    Recovering,
    /// No cart. The next add creates one.
    Empty,
    /// Holding a live cart.
    Ready,
}

/// Operation classes tracked by the in-flight flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Hydrate,
    Add,
    Remove,
    Update,
    Clear,
}

/// Number of issued-but-unfinished calls per operation class.
///
/// Counters rather than booleans so a flag stays up while any call of its
/// class is queued or running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InFlight {
    hydrating: u32,
    adding: u32,
    removing: u32,
    updating: u32,
    clearing: u32,
}

impl InFlight {
    const fn counter(&mut self, activity: Activity) -> &mut u32 {
        match activity {
            Activity::Hydrate => &mut self.hydrating,
            Activity::Add => &mut self.adding,
            Activity::Remove => &mut self.removing,
            Activity::Update => &mut self.updating,
            Activity::Clear => &mut self.clearing,
        }
    }

    const fn begin(&mut self, activity: Activity) {
        let counter = self.counter(activity);
        *counter = counter.saturating_add(1);
    }

    const fn end(&mut self, activity: Activity) {
        let counter = self.counter(activity);
        *counter = counter.saturating_sub(1);
    }

    /// Whether anything at all is in flight.
    #[must_use]
    pub const fn any(&self) -> bool {
        self.hydrating > 0
            || self.adding > 0
            || self.removing > 0
            || self.updating > 0
            || self.clearing > 0
    }

    #[must_use]
    pub const fn adding(&self) -> bool {
        self.adding > 0
    }

    #[must_use]
    pub const fn removing(&self) -> bool {
        self.removing > 0
    }

    #[must_use]
    pub const fn updating(&self) -> bool {
        self.updating > 0
    }
}

/// Everything a UI needs to render the cart, published on every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    pub phase: SessionPhase,
    pub cart_id: Option<CartId>,
    pub cart: Option<Cart>,
    pub in_flight: InFlight,
}

impl CartState {
    /// Total units in the cart as reported by Shopify, or 0.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.cart.as_ref().map_or(0, |cart| cart.total_quantity)
    }

    /// Cart subtotal as a float, or 0 when there is no cart or the amount is
    /// unparseable.
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.cart.as_ref().map_or(0.0, |cart| cart.cost.subtotal.to_f64())
    }

    /// Hosted checkout URL of the current cart.
    #[must_use]
    pub fn checkout_url(&self) -> Option<&str> {
        self.cart.as_ref().map(|cart| cart.checkout_url.as_str())
    }

    /// True before hydration has started and while any operation is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self.phase, SessionPhase::Uninitialized) || self.in_flight.any()
    }

    #[must_use]
    pub const fn is_adding(&self) -> bool {
        self.in_flight.adding()
    }

    #[must_use]
    pub const fn is_removing(&self) -> bool {
        self.in_flight.removing()
    }

    #[must_use]
    pub const fn is_updating(&self) -> bool {
        self.in_flight.updating()
    }

    pub(crate) fn baseline(&self) -> Baseline {
        Baseline {
            phase: self.phase,
            cart_id: self.cart_id.clone(),
            cart: self.cart.clone(),
        }
    }

    pub(crate) fn restore(&mut self, baseline: Baseline) {
        self.phase = baseline.phase;
        self.cart_id = baseline.cart_id;
        self.cart = baseline.cart;
    }

    pub(crate) fn adopt(&mut self, cart: Cart) {
        self.phase = SessionPhase::Ready;
        self.cart_id = Some(cart.id.clone());
        self.cart = Some(cart);
    }

    pub(crate) fn reset(&mut self) {
        self.phase = SessionPhase::Empty;
        self.cart_id = None;
        self.cart = None;
    }
}

/// Value copy of the cart-bearing fields, taken before a remote call.
#[derive(Debug, Clone)]
pub(crate) struct Baseline {
    pub phase: SessionPhase,
    pub cart_id: Option<CartId>,
    pub cart: Option<Cart>,
}

/// Raises an in-flight flag for its lifetime.
pub(crate) struct InFlightGuard<'a> {
    state: &'a watch::Sender<CartState>,
    activity: Activity,
}

impl<'a> InFlightGuard<'a> {
    pub(crate) fn begin(state: &'a watch::Sender<CartState>, activity: Activity) -> Self {
        state.send_modify(|s| s.in_flight.begin(activity));
        Self { state, activity }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let activity = self.activity;
        self.state.send_modify(|s| s.in_flight.end(activity));
    }
}
