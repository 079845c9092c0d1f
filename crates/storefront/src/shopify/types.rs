//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! wire types in `storefront::queries`.

use serde::{Deserialize, Serialize};
use wildenflower_core::{
    CartId, CartLineId, CartLineSnapshot, FavoriteSnapshot, Price, PriceError, ProductId,
    VariantId,
};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// Amount as a float, or `0.0` if Shopify sent something unparseable or
    /// non-finite.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        self.amount
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    /// Parse into a decimal [`Price`].
    ///
    /// # Errors
    ///
    /// Returns `PriceError` if the amount or currency cannot be parsed.
    pub fn to_price(&self) -> Result<Price, PriceError> {
        Price::parse(&self.amount, &self.currency_code)
    }

    /// Format for display, falling back to the raw amount and code.
    #[must_use]
    pub fn display(&self) -> String {
        self.to_price().map_or_else(
            |_| format!("{} {}", self.amount, self.currency_code),
            |price| price.display(),
        )
    }
}

// =============================================================================
// Image Types
// =============================================================================

/// Product or variant image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
}

/// Selected option on a variant (e.g., Size: Large).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name.
    pub name: String,
    /// Option value.
    pub value: String,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: ProductId,
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Featured image.
    pub featured_image: Option<Image>,
}

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: VariantId,
    /// Variant title.
    pub title: String,
    /// Current unit price.
    pub price: Money,
    /// Selected options.
    pub selected_options: Vec<SelectedOption>,
    /// Units Shopify reports as available, when inventory is readable.
    pub quantity_available: Option<i64>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

/// Cost for a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineCost {
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Cart line ID (not the variant ID).
    pub id: CartLineId,
    /// Quantity, at least 1 while the line exists.
    pub quantity: i64,
    /// Line cost.
    pub cost: CartLineCost,
    /// Product variant.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal: Money,
    /// Total amount.
    pub total: Money,
    /// Total tax amount.
    pub total_tax: Option<Money>,
}

/// A shopping cart.
///
/// Checkout URL and cost are not stable across mutations; always take them
/// from the latest response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// Hosted checkout URL.
    pub checkout_url: String,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Cart lines.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Minimal re-creatable projection of this cart's lines.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLineSnapshot> {
        self.lines
            .iter()
            .map(|line| CartLineSnapshot {
                variant_id: line.merchandise.id.clone(),
                quantity: line.quantity,
            })
            .collect()
    }

    /// Find a line by its line ID.
    #[must_use]
    pub fn line(&self, id: &CartLineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.id == id)
    }
}

/// Input for updating a cart line's quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: CartLineId,
    /// New quantity (must be positive; use removal for zero).
    pub quantity: i64,
}

impl CartLineUpdateInput {
    /// Create an update input.
    #[must_use]
    pub fn new(id: impl Into<CartLineId>, quantity: i64) -> Self {
        Self {
            id: id.into(),
            quantity,
        }
    }
}

/// User error from cart mutations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    pub code: Option<String>,
    /// Field path that caused the error.
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}

// =============================================================================
// Product Types
// =============================================================================

/// Catalog product (display fields only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Vendor.
    pub vendor: String,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Lowest variant price.
    pub min_variant_price: Money,
    /// First variant, used for quick add-to-cart.
    pub default_variant_id: Option<VariantId>,
}

impl Product {
    /// Capture the display data needed to render this product as a favorite.
    #[must_use]
    pub fn favorite_snapshot(&self) -> FavoriteSnapshot {
        FavoriteSnapshot {
            id: self.id.to_string(),
            handle: self.handle.clone(),
            title: self.title.clone(),
            image_url: self.featured_image.as_ref().map(|img| img.url.clone()),
            price: self.min_variant_price.amount.clone(),
            currency_code: self.min_variant_price.currency_code.clone(),
            vendor: self.vendor.clone(),
        }
    }
}

impl From<&Product> for FavoriteSnapshot {
    fn from(product: &Product) -> Self {
        product.favorite_snapshot()
    }
}

/// Pagination info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether more items follow.
    pub has_next_page: bool,
    /// Cursor for the next page.
    pub end_cursor: Option<String>,
}

/// A page of products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductConnection {
    /// Products on this page.
    pub products: Vec<Product>,
    /// Pagination info.
    pub page_info: PageInfo,
}

// =============================================================================
// Collection Types
// =============================================================================

/// Catalog collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Collection GID.
    pub id: String,
    pub handle: String,
    pub title: String,
    /// Plain-text description, empty when unset.
    pub description: String,
    pub image: Option<Image>,
}

/// A page of collections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConnection {
    pub collections: Vec<Collection>,
    pub page_info: PageInfo,
}

/// A collection with one page of its products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionProducts {
    pub collection: Collection,
    pub products: ProductConnection,
}
