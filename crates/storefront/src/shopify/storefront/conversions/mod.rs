//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod collections;
pub mod products;

pub use cart::{convert_cart, convert_user_error};
pub use collections::{convert_collection_connection, convert_collection_products};
pub use products::{convert_product, convert_product_connection};

use crate::shopify::types::{Image, Money};

use super::queries::{ImageFields, MoneyFields};

pub(super) fn convert_money(money: MoneyFields) -> Money {
    Money {
        amount: money.amount,
        currency_code: money.currency_code,
    }
}

pub(super) fn convert_image(image: ImageFields) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
    }
}
