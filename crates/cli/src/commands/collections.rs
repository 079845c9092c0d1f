//! `wf-cli collections`

use wildenflower_storefront::shopify::{CollectionConnection, StorefrontClient};

use super::{emit, products};
use crate::CliError;

/// Print one page of collections.
///
/// # Errors
///
/// Returns an error if the Storefront API request fails.
pub async fn list(
    storefront: &StorefrontClient,
    first: i64,
    after: Option<String>,
) -> Result<(), CliError> {
    let page = storefront.get_collections(first.clamp(1, 250), after).await?;
    emit(&render(&page));
    Ok(())
}

/// Print a collection heading followed by one page of its products.
///
/// # Errors
///
/// Returns `CliError::NotFound` for an unknown handle, or an error if the
/// Storefront API request fails.
pub async fn show(
    storefront: &StorefrontClient,
    handle: &str,
    first: i64,
    after: Option<String>,
) -> Result<(), CliError> {
    let found = storefront
        .get_collection_by_handle(handle, first.clamp(1, 250), after)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("collection '{handle}'")))?;

    emit(&format!(
        "{}\n{}",
        found.collection.title,
        products::render(&found.products)
    ));
    Ok(())
}

pub fn render(page: &CollectionConnection) -> String {
    let mut lines: Vec<String> = page
        .collections
        .iter()
        .map(|c| format!("{}  {}", c.handle, c.title))
        .collect();

    if page.page_info.has_next_page
        && let Some(cursor) = &page.page_info.end_cursor
    {
        lines.push(format!("More: --after {cursor}"));
    }
    lines.join("\n")
}
