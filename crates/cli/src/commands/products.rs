//! `wf-cli products`

use wildenflower_storefront::shopify::{ProductConnection, StorefrontClient};

use super::emit;
use crate::CliError;

/// Print one page of products.
///
/// # Errors
///
/// Returns an error if the Storefront API request fails.
pub async fn list(
    storefront: &StorefrontClient,
    first: i64,
    after: Option<String>,
) -> Result<(), CliError> {
    let page = storefront.get_products(first.clamp(1, 250), after).await?;
    emit(&render(&page));
    Ok(())
}

pub fn render(page: &ProductConnection) -> String {
    let mut lines: Vec<String> = page
        .products
        .iter()
        .map(|p| {
            format!(
                "{}  {}  from {}  variant: {}",
                p.handle,
                p.title,
                p.min_variant_price.display(),
                p.default_variant_id
                    .as_ref()
                    .map_or("-", |v| v.as_str())
            )
        })
        .collect();

    if page.page_info.has_next_page
        && let Some(cursor) = &page.page_info.end_cursor
    {
        lines.push(format!("More: --after {cursor}"));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use wildenflower_core::{ProductId, VariantId};
    use wildenflower_storefront::shopify::{Money, PageInfo, Product};

    #[test]
    fn test_render_with_next_page() {
        let page = ProductConnection {
            products: vec![Product {
                id: ProductId::new("gid://shopify/Product/1"),
                handle: "moss-candle".to_string(),
                title: "Moss Candle".to_string(),
                vendor: "Fernhollow".to_string(),
                featured_image: None,
                min_variant_price: Money {
                    amount: "24.0".to_string(),
                    currency_code: "USD".to_string(),
                },
                default_variant_id: Some(VariantId::new("gid://shopify/ProductVariant/9")),
            }],
            page_info: PageInfo {
                has_next_page: true,
                end_cursor: Some("abc".to_string()),
            },
        };

        assert_eq!(
            render(&page),
            "moss-candle  Moss Candle  from $24.00  variant: gid://shopify/ProductVariant/9\nMore: --after abc"
        );
    }
}
