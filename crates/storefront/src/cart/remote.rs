//! The remote cart operations the session depends on.

use async_trait::async_trait;
use wildenflower_core::{CartId, CartLineId, CartLineSnapshot};

use crate::shopify::{Cart, CartLineUpdateInput, ShopifyError, StorefrontClient};

/// Remote cart store.
///
/// Every method is one round trip. Mutations fail with
/// [`ShopifyError::UserError`] when Shopify rejects them on business rules,
/// even if the HTTP exchange succeeded.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Create a cart seeded with `lines`. An empty slice creates an empty cart.
    async fn create_cart(&self, lines: &[CartLineSnapshot]) -> Result<Cart, ShopifyError>;

    /// Fetch a cart. `Ok(None)` means the cart expired or never existed.
    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError>;

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineSnapshot],
    ) -> Result<Cart, ShopifyError>;

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<Cart, ShopifyError>;

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineUpdateInput],
    ) -> Result<Cart, ShopifyError>;
}

#[async_trait]
impl CartService for StorefrontClient {
    async fn create_cart(&self, lines: &[CartLineSnapshot]) -> Result<Cart, ShopifyError> {
        self.cart_create(lines).await
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        self.cart(cart_id).await
    }

    async fn add_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineSnapshot],
    ) -> Result<Cart, ShopifyError> {
        self.cart_lines_add(cart_id, lines).await
    }

    async fn remove_lines(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<Cart, ShopifyError> {
        self.cart_lines_remove(cart_id, line_ids).await
    }

    async fn update_lines(
        &self,
        cart_id: &CartId,
        lines: &[CartLineUpdateInput],
    ) -> Result<Cart, ShopifyError> {
        self.cart_lines_update(cart_id, lines).await
    }
}
