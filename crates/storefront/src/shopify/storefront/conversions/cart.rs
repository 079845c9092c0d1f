//! Cart type conversion functions.

use tracing::warn;
use wildenflower_core::{CartId, CartLineId, ProductId, VariantId};

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartLineCost, CartMerchandise, CartMerchandiseProduct,
    CartUserError, SelectedOption,
};

use super::super::queries::{CartFields, CartLineFields, CartUserErrorFields};
use super::{convert_image, convert_money};

/// Convert the `CartFields` fragment into a domain cart.
pub fn convert_cart(cart: CartFields) -> Cart {
    let lines: Vec<CartLine> = cart.lines.nodes.into_iter().filter_map(convert_cart_line).collect();

    Cart {
        id: CartId::new(cart.id),
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount),
            total: convert_money(cart.cost.total_amount),
            total_tax: cart.cost.total_tax_amount.map(convert_money),
        },
        lines,
    }
}

fn convert_cart_line(line: CartLineFields) -> Option<CartLine> {
    // Shopify never reports zero-quantity lines; drop them if it ever does.
    if line.quantity < 1 {
        warn!(line_id = %line.id, quantity = line.quantity, "Dropping cart line with non-positive quantity");
        return None;
    }

    let merchandise = line.merchandise;
    Some(CartLine {
        id: CartLineId::new(line.id),
        quantity: line.quantity,
        cost: CartLineCost {
            total_amount: convert_money(line.cost.total_amount),
        },
        merchandise: CartMerchandise {
            id: VariantId::new(merchandise.id),
            title: merchandise.title,
            price: convert_money(merchandise.price),
            selected_options: merchandise
                .selected_options
                .into_iter()
                .map(|o| SelectedOption {
                    name: o.name,
                    value: o.value,
                })
                .collect(),
            quantity_available: merchandise.quantity_available,
            product: CartMerchandiseProduct {
                id: ProductId::new(merchandise.product.id),
                handle: merchandise.product.handle,
                title: merchandise.product.title,
                featured_image: merchandise.product.featured_image.map(convert_image),
            },
        },
    })
}

pub fn convert_user_error(e: CartUserErrorFields) -> CartUserError {
    CartUserError {
        code: e.code,
        field: e.field,
        message: e.message,
    }
}
