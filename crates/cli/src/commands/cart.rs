//! `wf-cli cart ...`

use std::fmt::Write;

use tracing::info;
use wildenflower_core::{CartLineId, VariantId};
use wildenflower_storefront::cart::CartSession;
use wildenflower_storefront::shopify::Cart;

use super::emit;
use crate::CliError;

/// Print the cart.
pub fn show(session: &CartSession) {
    emit(&render(session.cart().as_ref(), session.subtotal()));
}

/// Add a variant and print the updated cart.
///
/// # Errors
///
/// Returns `CliError::Rejected` if Shopify rejected the change.
pub async fn add(session: &CartSession, variant: String, quantity: i64) -> Result<(), CliError> {
    if !session.add_to_cart(VariantId::new(variant), quantity).await {
        return Err(CliError::Rejected("Add to cart"));
    }
    info!(item_count = session.item_count(), "Added to cart");
    show(session);
    Ok(())
}

/// Remove a line and print the updated cart.
///
/// # Errors
///
/// Returns `CliError::Rejected` if there is no cart or Shopify rejected the change.
pub async fn remove(session: &CartSession, line: String) -> Result<(), CliError> {
    if !session.remove_from_cart(CartLineId::new(line)).await {
        return Err(CliError::Rejected("Remove from cart"));
    }
    show(session);
    Ok(())
}

/// Change a line's quantity and print the updated cart.
///
/// # Errors
///
/// Returns `CliError::Rejected` if there is no cart or Shopify rejected the change.
pub async fn update(session: &CartSession, line: String, quantity: i64) -> Result<(), CliError> {
    if !session
        .update_quantity(CartLineId::new(line), quantity)
        .await
    {
        return Err(CliError::Rejected("Quantity update"));
    }
    show(session);
    Ok(())
}

pub async fn clear(session: &CartSession) {
    session.clear_cart().await;
    emit("Cart cleared.");
}

/// Hand off to hosted checkout.
///
/// # Errors
///
/// Returns `CliError::NotFound` if there is no cart to check out.
pub fn checkout(session: &CartSession) -> Result<(), CliError> {
    let url = session
        .checkout_url()
        .ok_or_else(|| CliError::NotFound("cart with a checkout URL".to_string()))?;
    emit(&format!("Checkout: {url}"));
    session.open_checkout();
    Ok(())
}

/// Render a cart as a plain-text table.
pub fn render(cart: Option<&Cart>, subtotal: f64) -> String {
    let Some(cart) = cart else {
        return "Cart is empty.".to_string();
    };

    let mut out = format!("Cart {}\n", cart.id);
    for line in &cart.lines {
        let variant = if line.merchandise.title == "Default Title" {
            String::new()
        } else {
            format!(" ({})", line.merchandise.title)
        };
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "  {} x {}{}  {}  [{}]",
            line.quantity,
            line.merchandise.product.title,
            variant,
            line.cost.total_amount.display(),
            line.id
        );
    }
    let _ = write!(
        out,
        "Items: {}  Subtotal: {subtotal:.2} {}",
        cart.total_quantity, cart.cost.subtotal.currency_code
    );
    out
}
