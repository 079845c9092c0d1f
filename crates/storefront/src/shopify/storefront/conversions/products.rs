//! Product type conversion functions.

use wildenflower_core::{ProductId, VariantId};

use crate::shopify::types::{PageInfo, Product, ProductConnection};

use super::super::queries::{ProductFields, get_products};
use super::{convert_image, convert_money};

pub fn convert_product(product: ProductFields) -> Product {
    Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        vendor: product.vendor,
        featured_image: product.featured_image.map(convert_image),
        min_variant_price: convert_money(product.price_range.min_variant_price),
        default_variant_id: product
            .variants
            .nodes
            .into_iter()
            .next()
            .map(|v| VariantId::new(v.id)),
    }
}

pub fn convert_product_connection(conn: get_products::ProductNodes) -> ProductConnection {
    ProductConnection {
        products: conn.nodes.into_iter().map(convert_product).collect(),
        page_info: PageInfo {
            has_next_page: conn.page_info.has_next_page,
            end_cursor: conn.page_info.end_cursor,
        },
    }
}
