//! Shopify Storefront API client implementation.
//!
//! Sends `graphql_client` query bodies with `reqwest` 0.13. Caches catalog
//! lookups using `moka` (5-minute TTL); carts always go to Shopify.

mod cache;
mod conversions;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use graphql_client::{GraphQLQuery, Response};
use moka::future::Cache;
use tracing::{debug, instrument, warn};
use wildenflower_core::{CartId, CartLineId, CartLineSnapshot};

use crate::config::{ShopifyStorefrontConfig, access_token};
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartLineUpdateInput, CartUserError, CollectionConnection, CollectionProducts, Product,
    ProductConnection,
};

use cache::CacheValue;
use conversions::{
    convert_cart, convert_collection_connection, convert_collection_products, convert_product,
    convert_product_connection, convert_user_error,
};
use queries::{
    CartCreate, CartLineInput, CartLinesAdd, CartLinesRemove, CartLinesUpdate,
    CartMutationPayload, GetCart, GetCollectionByHandle, GetCollections, GetProductByHandle,
    GetProducts, cart_create, cart_lines_add, cart_lines_remove, cart_lines_update, get_cart,
    get_collection_by_handle, get_collections, get_product_by_handle, get_products,
};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Storefront-Access-Token";
const CACHE_TTL: Duration = Duration::from_secs(300);
const CACHE_CAPACITY: u64 = 1000;

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Provides typed access to cart operations and catalog lookups.
/// Products are cached for 5 minutes.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    cache: Cache<String, CacheValue>,
}

impl StorefrontClient {
    /// Create a new Storefront API client for the configured store.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ShopifyStorefrontConfig) -> Result<Self, ShopifyError> {
        Self::with_endpoint(config, config.endpoint())
    }

    /// Create a client that posts to an explicit GraphQL endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_endpoint(
        config: &ShopifyStorefrontConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, ShopifyError> {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            inner: Arc::new(StorefrontClientInner {
                client,
                endpoint: endpoint.into(),
                access_token: access_token(config),
                cache,
            }),
        })
    }

    /// GraphQL endpoint this client posts to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Execute a GraphQL query.
    async fn execute<Q: GraphQLQuery>(
        &self,
        variables: Q::Variables,
    ) -> Result<Q::ResponseData, ShopifyError> {
        let request_body = Q::build_query(variables);

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header(ACCESS_TOKEN_HEADER, &self.inner.access_token)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read as text first so failures can be logged with the body
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %truncate(&response_text, 500),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::Status {
                status: status.as_u16(),
                body: truncate(&response_text, 200),
            });
        }

        let response: Response<Q::ResponseData> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&response_text, 500),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            debug!(errors = ?errors, "GraphQL errors in response");

            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| super::GraphQLError {
                        message: e.message,
                        locations: e.locations.map_or_else(Vec::new, |locs| {
                            locs.into_iter()
                                .map(|l| super::GraphQLErrorLocation {
                                    line: i64::from(l.line),
                                    column: i64::from(l.column),
                                })
                                .collect()
                        }),
                        path: e.path.map_or_else(Vec::new, |p| {
                            p.into_iter()
                                .map(|fragment| match fragment {
                                    graphql_client::PathFragment::Key(s) => {
                                        serde_json::Value::String(s)
                                    }
                                    graphql_client::PathFragment::Index(i) => {
                                        serde_json::Value::Number(i.into())
                                    }
                                })
                                .collect()
                        }),
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %truncate(&response_text, 500),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql("No data in response")
        })
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Create a cart, optionally seeded with lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or user errors are returned.
    #[instrument(skip(self, lines), fields(line_count = lines.len()))]
    pub async fn cart_create(&self, lines: &[CartLineSnapshot]) -> Result<Cart, ShopifyError> {
        let variables = cart_create::Variables {
            input: cart_create::CartInput {
                lines: line_inputs(lines),
            },
        };

        let data = self.execute::<CartCreate>(variables).await?;
        cart_from_payload(data.cart_create)
    }

    /// Fetch a cart by ID.
    ///
    /// Returns `Ok(None)` when Shopify no longer knows the cart (expired or
    /// completed checkout).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    pub async fn cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let variables = get_cart::Variables {
            cart_id: cart_id.to_string(),
        };

        let data = self.execute::<GetCart>(variables).await?;

        if data.cart.is_none() {
            debug!("Cart not found");
        }
        Ok(data.cart.map(convert_cart))
    }

    /// Add lines to a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn cart_lines_add(
        &self,
        cart_id: &CartId,
        lines: &[CartLineSnapshot],
    ) -> Result<Cart, ShopifyError> {
        let variables = cart_lines_add::Variables {
            cart_id: cart_id.to_string(),
            lines: line_inputs(lines),
        };

        let data = self.execute::<CartLinesAdd>(variables).await?;
        cart_from_payload(data.cart_lines_add)
    }

    /// Remove lines from a cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    pub async fn cart_lines_remove(
        &self,
        cart_id: &CartId,
        line_ids: &[CartLineId],
    ) -> Result<Cart, ShopifyError> {
        let variables = cart_lines_remove::Variables {
            cart_id: cart_id.to_string(),
            line_ids: line_ids.iter().map(ToString::to_string).collect(),
        };

        let data = self.execute::<CartLinesRemove>(variables).await?;
        cart_from_payload(data.cart_lines_remove)
    }

    /// Update quantities of existing cart lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart update fails or user errors are returned.
    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    pub async fn cart_lines_update(
        &self,
        cart_id: &CartId,
        lines: &[CartLineUpdateInput],
    ) -> Result<Cart, ShopifyError> {
        let variables = cart_lines_update::Variables {
            cart_id: cart_id.to_string(),
            lines: lines
                .iter()
                .map(|line| queries::CartLineUpdateInput {
                    id: line.id.to_string(),
                    quantity: line.quantity,
                })
                .collect(),
        };

        let data = self.execute::<CartLinesUpdate>(variables).await?;
        cart_from_payload(data.cart_lines_update)
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get a product by its handle, or `None` if no product has that handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<Product>, ShopifyError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let variables = get_product_by_handle::Variables {
            handle: handle.to_string(),
        };

        let data = self.execute::<GetProductByHandle>(variables).await?;

        let Some(product) = data.product.map(convert_product) else {
            debug!("Product not found");
            return Ok(None);
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(Some(product))
    }

    /// Get a page of products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<ProductConnection, ShopifyError> {
        let cache_key = format!("products:{first}:{}", after.as_deref().unwrap_or(""));

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let variables = get_products::Variables { first, after };

        let data = self.execute::<GetProducts>(variables).await?;

        let connection = convert_product_connection(data.products);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(connection.clone()))
            .await;

        Ok(connection)
    }

    /// Get a page of collections.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_collections(
        &self,
        first: i64,
        after: Option<String>,
    ) -> Result<CollectionConnection, ShopifyError> {
        let cache_key = format!("collections:{first}:{}", after.as_deref().unwrap_or(""));

        if let Some(CacheValue::Collections(collections)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collections");
            return Ok(collections);
        }

        let variables = get_collections::Variables { first, after };
        let data = self.execute::<GetCollections>(variables).await?;
        let connection = convert_collection_connection(data.collections);

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collections(connection.clone()))
            .await;

        Ok(connection)
    }

    /// Get a collection and one page of its products.
    ///
    /// Returns `None` if no collection has the handle. Misses are not cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        first: i64,
        after: Option<String>,
    ) -> Result<Option<CollectionProducts>, ShopifyError> {
        let cache_key = format!(
            "collection:{handle}:{first}:{}",
            after.as_deref().unwrap_or("")
        );

        if let Some(CacheValue::Collection(collection)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for collection");
            return Ok(Some(*collection));
        }

        let variables = get_collection_by_handle::Variables {
            handle: handle.to_string(),
            first,
            after,
        };
        let data = self.execute::<GetCollectionByHandle>(variables).await?;

        let Some(collection) = data.collection.map(convert_collection_products) else {
            debug!("Collection not found");
            return Ok(None);
        };

        self.inner
            .cache
            .insert(cache_key, CacheValue::Collection(Box::new(collection.clone())))
            .await;

        Ok(Some(collection))
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, handle: &str) {
        let cache_key = format!("product:{handle}");
        self.inner.cache.invalidate(&cache_key).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn line_inputs(lines: &[CartLineSnapshot]) -> Vec<CartLineInput> {
    lines
        .iter()
        .map(|line| CartLineInput {
            merchandise_id: line.variant_id.to_string(),
            quantity: line.quantity,
        })
        .collect()
}

/// Unwrap a cart mutation payload.
///
/// User errors win over a present cart: Shopify can return both, and the
/// mutation did not apply.
fn cart_from_payload(payload: Option<CartMutationPayload>) -> Result<Cart, ShopifyError> {
    let payload = payload.ok_or_else(|| ShopifyError::graphql("No cart in response"))?;

    if !payload.user_errors.is_empty() {
        let errors: Vec<CartUserError> = payload
            .user_errors
            .into_iter()
            .map(convert_user_error)
            .collect();
        let err = ShopifyError::from_user_errors(&errors);
        warn!(error = %err, "Cart mutation rejected");
        return Err(err);
    }

    payload
        .cart
        .map(convert_cart)
        .ok_or_else(|| ShopifyError::graphql("No cart in response"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
