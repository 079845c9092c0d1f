//! Shopify Storefront API client.
//!
//! # Architecture
//!
//! - Uses `graphql_client` query bodies and response envelopes
//! - Shopify is source of truth for carts - only a minimal snapshot is kept locally
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//! - Carts are never cached: every mutation response replaces local state
//!
//! # Example
//!
//! ```rust,ignore
//! use wildenflower_storefront::shopify::StorefrontClient;
//! use wildenflower_core::CartLineSnapshot;
//!
//! let client = StorefrontClient::new(&config.shopify)?;
//!
//! // Create a cart with one line, then bump the quantity
//! let cart = client
//!     .cart_create(&[CartLineSnapshot::new("gid://shopify/ProductVariant/1", 1)])
//!     .await?;
//! let line_id = cart.lines[0].id.clone();
//! let cart = client
//!     .cart_lines_update(&cart.id, &[CartLineUpdateInput::new(line_id, 2)])
//!     .await?;
//! ```

mod storefront;
pub mod types;

pub use storefront::StorefrontClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the Storefront API.
///
/// Transport failures and business-rule failures share this one type so
/// callers need a single error path; [`ShopifyError::status`] tells them apart.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Shopify answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., quantity exceeds available stock).
    #[error("User error: {0}")]
    UserError(String),
}

impl ShopifyError {
    /// Build a user error from a mutation's `userErrors` list.
    ///
    /// All messages are joined with `"; "`.
    #[must_use]
    pub fn from_user_errors(errors: &[CartUserError]) -> Self {
        Self::UserError(
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// HTTP status associated with the failure, when one is known.
    ///
    /// User errors and GraphQL errors arrive inside `200` responses.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            Self::GraphQL(_) | Self::Parse(_) | Self::UserError(_) => Some(200),
        }
    }

    /// Whether this is a business-rule failure rather than a transport one.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(self, Self::UserError(_))
    }

    pub(crate) fn graphql(message: impl Into<String>) -> Self {
        Self::GraphQL(vec![GraphQLError {
            message: message.into(),
            locations: vec![],
            path: vec![],
        }])
    }
}

/// A GraphQL error returned by the Storefront API.
#[derive(Debug, Clone)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Source locations in the query.
    pub locations: Vec<GraphQLErrorLocation>,
    /// Path to the error in the response.
    pub path: Vec<serde_json::Value>,
}

/// Location in a GraphQL query where an error occurred.
#[derive(Debug, Clone)]
pub struct GraphQLErrorLocation {
    /// Line number (1-indexed).
    pub line: i64,
    /// Column number (1-indexed).
    pub column: i64,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut parts = Vec::new();

            if !e.message.is_empty() {
                parts.push(e.message.clone());
            }

            if !e.path.is_empty() {
                let path_str = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                parts.push(format!("path: {path_str}"));
            }

            if let Some(loc) = e.locations.first() {
                parts.push(format!("at line {}:{}", loc.line, loc.column));
            }

            if parts.is_empty() {
                format!("[error {}]: (no details)", i + 1)
            } else {
                parts.join(" ")
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}
