//! Recording in-memory cart service for session tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{RwLock, watch};
use wildenflower_core::{CartId, CartLineId, CartLineSnapshot, ProductId, VariantId};

use super::remote::CartService;
use crate::shopify::{
    Cart, CartCost, CartLine, CartLineCost, CartLineUpdateInput, CartMerchandise,
    CartMerchandiseProduct, CartUserError, Money, ShopifyError,
};

const UNIT_PRICE_CENTS: i64 = 1500;

/// A recorded call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(Vec<CartLineSnapshot>),
    Get(CartId),
    Add(CartId, Vec<CartLineSnapshot>),
    Remove(CartId, Vec<CartLineId>),
    Update(CartId, Vec<CartLineUpdateInput>),
}

/// Operation selector for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Get,
    Add,
    Remove,
    Update,
}

/// Behaves like a small Shopify: carts live in a map, unknown IDs read as
/// expired, and adding an existing variant merges into its line.
pub struct MockCartService {
    carts: RwLock<HashMap<CartId, Cart>>,
    calls: RwLock<Vec<Call>>,
    failing: RwLock<HashSet<Op>>,
    // `false` while calls are held
    open: watch::Sender<bool>,
    next_id: RwLock<u64>,
}

impl Default for MockCartService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCartService {
    pub fn new() -> Self {
        Self {
            carts: RwLock::default(),
            calls: RwLock::default(),
            failing: RwLock::default(),
            open: watch::channel(true).0,
            next_id: RwLock::default(),
        }
    }

    /// Store a cart with explicit line IDs: `(line_id, variant_id, quantity)`.
    pub async fn seed_cart(&self, cart_id: &str, lines: &[(&str, &str, i64)]) -> Cart {
        let cart = build_cart(
            CartId::new(cart_id),
            lines
                .iter()
                .map(|(line, variant, qty)| (CartLineId::new(*line), VariantId::new(*variant), *qty))
                .collect(),
        );
        self.carts
            .write()
            .await
            .insert(cart.id.clone(), cart.clone());
        cart
    }

    /// Make a cart unknown, as if it expired.
    pub async fn expire(&self, cart_id: &CartId) {
        self.carts.write().await.remove(cart_id);
    }

    pub async fn fail(&self, op: Op) {
        self.failing.write().await.insert(op);
    }

    pub async fn succeed(&self, op: Op) {
        self.failing.write().await.remove(&op);
    }

    pub async fn calls(&self) -> Vec<Call> {
        self.calls.read().await.clone()
    }

    pub async fn clear_calls(&self) {
        self.calls.write().await.clear();
    }

    /// Block every later call until [`release`](Self::release).
    pub fn hold(&self) {
        self.open.send_replace(false);
    }

    /// Let held calls proceed and stop holding new ones.
    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Current server-side copy of a cart.
    pub async fn stored(&self, cart_id: &CartId) -> Option<Cart> {
        self.carts.read().await.get(cart_id).cloned()
    }

    async fn enter(&self, call: Call, op: Op) -> Result<(), ShopifyError> {
        self.calls.write().await.push(call);

        // The sender lives in `self`, so this only errors after drop.
        let _ = self.open.subscribe().wait_for(|open| *open).await;

        if self.failing.read().await.contains(&op) {
            return Err(ShopifyError::Status {
                status: 503,
                body: format!("Mock {op:?} failure"),
            });
        }
        Ok(())
    }

    async fn next_line_id(&self) -> CartLineId {
        let mut next = self.next_id.write().await;
        *next += 1;
        CartLineId::new(format!("gid://shopify/CartLine/m{next}"))
    }

    async fn mutate<F>(&self, cart_id: &CartId, f: F) -> Result<Cart, ShopifyError>
    where
        F: FnOnce(&mut Vec<(CartLineId, VariantId, i64)>) -> Result<(), ShopifyError>,
    {
        let mut carts = self.carts.write().await;
        let cart = carts
            .get(cart_id)
            .ok_or_else(|| user_error("The specified cart does not exist."))?;

        let mut lines = line_tuples(cart);
        f(&mut lines)?;

        let updated = build_cart(cart_id.clone(), lines);
        carts.insert(cart_id.clone(), updated.clone());
        Ok(updated)
    }
}

#[async_trait]
impl CartService for MockCartService {
    async fn create_cart(&self, lines: &[CartLineSnapshot]) -> Result<Cart, ShopifyError> {
        self.enter(Call::Create(lines.to_vec()), Op::Create).await?;

        let cart_id = {
            let mut next = self.next_id.write().await;
            *next += 1;
            CartId::new(format!("gid://shopify/Cart/m{next}"))
        };

        let mut tuples = Vec::with_capacity(lines.len());
        for line in lines {
            tuples.push((self.next_line_id().await, line.variant_id.clone(), line.quantity));
        }

        let cart = build_cart(cart_id, tuples);
        self.carts
            .write()
            .await
            .insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        self.enter(Call::Get(cart_id.clone()), Op::Get).await?;
        Ok(self.stored(cart_id).await)
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineSnapshot],
    ) -> Result<Cart, ShopifyError> {
        self.enter(Call::Add(cart_id.clone(), lines.to_vec()), Op::Add)
            .await?;

        let mut fresh_ids = Vec::with_capacity(lines.len());
        for _ in lines {
            fresh_ids.push(self.next_line_id().await);
        }

        self.mutate(cart_id, |existing| {
            for (line, fresh_id) in lines.iter().zip(fresh_ids) {
                if let Some(entry) = existing.iter_mut().find(|(_, v, _)| *v == line.variant_id) {
                    entry.2 += line.quantity;
                } else {
                    existing.push((fresh_id, line.variant_id.clone(), line.quantity));
                }
            }
            Ok(())
        })
        .await
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<Cart, ShopifyError> {
        self.enter(Call::Remove(cart_id.clone(), line_ids.to_vec()), Op::Remove)
            .await?;

        self.mutate(cart_id, |existing| {
            for id in line_ids {
                let before = existing.len();
                existing.retain(|(line_id, _, _)| line_id != id);
                if existing.len() == before {
                    return Err(user_error("The merchandise line was not found in the cart."));
                }
            }
            Ok(())
        })
        .await
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineUpdateInput],
    ) -> Result<Cart, ShopifyError> {
        self.enter(Call::Update(cart_id.clone(), lines.to_vec()), Op::Update)
            .await?;

        self.mutate(cart_id, |existing| {
            for update in lines {
                if update.quantity < 1 {
                    return Err(user_error("Quantity must be greater than 0."));
                }
                let entry = existing
                    .iter_mut()
                    .find(|(line_id, _, _)| *line_id == update.id)
                    .ok_or_else(|| user_error("The merchandise line was not found in the cart."))?;
                entry.2 = update.quantity;
            }
            Ok(())
        })
        .await
    }
}

fn user_error(message: &str) -> ShopifyError {
    ShopifyError::from_user_errors(&[CartUserError {
        code: Some("INVALID".to_string()),
        field: None,
        message: message.to_string(),
    }])
}

fn line_tuples(cart: &Cart) -> Vec<(CartLineId, VariantId, i64)> {
    cart.lines
        .iter()
        .map(|l| (l.id.clone(), l.merchandise.id.clone(), l.quantity))
        .collect()
}

fn usd(cents: i64) -> Money {
    Money {
        amount: format!("{}.{:02}", cents / 100, cents % 100),
        currency_code: "USD".to_string(),
    }
}

fn build_cart(id: CartId, lines: Vec<(CartLineId, VariantId, i64)>) -> Cart {
    let total_quantity = lines.iter().map(|(_, _, q)| q).sum::<i64>();
    let subtotal = usd(total_quantity * UNIT_PRICE_CENTS);

    let token = id.as_str().rsplit('/').next().unwrap_or_default().to_string();

    Cart {
        checkout_url: format!("https://wildenflower.myshopify.com/cart/c/{token}"),
        id,
        total_quantity,
        cost: CartCost {
            subtotal: subtotal.clone(),
            total: subtotal,
            total_tax: None,
        },
        lines: lines
            .into_iter()
            .map(|(line_id, variant_id, quantity)| CartLine {
                id: line_id,
                quantity,
                cost: CartLineCost {
                    total_amount: usd(quantity * UNIT_PRICE_CENTS),
                },
                merchandise: CartMerchandise {
                    id: variant_id,
                    title: "Default Title".to_string(),
                    price: usd(UNIT_PRICE_CENTS),
                    selected_options: vec![],
                    quantity_available: Some(25),
                    product: CartMerchandiseProduct {
                        id: ProductId::new("gid://shopify/Product/p1"),
                        handle: "wild-violet-print".to_string(),
                        title: "Wild Violet Print".to_string(),
                        featured_image: None,
                    },
                },
            })
            .collect(),
    }
}
