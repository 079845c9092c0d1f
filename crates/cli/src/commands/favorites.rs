//! `wf-cli favorites ...`

use wildenflower_core::FavoriteSnapshot;
use wildenflower_storefront::favorites::Favorites;
use wildenflower_storefront::shopify::StorefrontClient;

use super::emit;
use crate::CliError;

pub async fn list(favorites: &Favorites) {
    emit(&render(&favorites.favorites().await));
}

/// Look up a product by handle and toggle it.
///
/// # Errors
///
/// Returns an error if the lookup fails or no product has that handle.
pub async fn toggle(
    storefront: &StorefrontClient,
    favorites: &Favorites,
    handle: &str,
) -> Result<(), CliError> {
    let product = storefront
        .get_product_by_handle(handle)
        .await?
        .ok_or_else(|| CliError::NotFound(format!("product '{handle}'")))?;

    let saved = favorites.toggle(FavoriteSnapshot::from(&product)).await;
    emit(&format!(
        "{} {}",
        if saved { "Saved" } else { "Removed" },
        product.title
    ));
    Ok(())
}

pub fn render(items: &[FavoriteSnapshot]) -> String {
    if items.is_empty() {
        return "No favorites yet.".to_string();
    }
    items
        .iter()
        .map(|f| format!("{}  {} {}  {}  ({})", f.title, f.price, f.currency_code, f.vendor, f.handle))
        .collect::<Vec<_>>()
        .join("\n")
}
