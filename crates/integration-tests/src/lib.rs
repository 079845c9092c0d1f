//! Integration test support for Wildenflower.
//!
//! [`FakeStorefront`] is an in-process Storefront GraphQL endpoint. Tests
//! queue canned responses, point a real [`StorefrontClient`] at it, and
//! inspect the requests it received.
//!
//! ```rust,ignore
//! let fake = FakeStorefront::start().await;
//! fake.respond_data(json!({"cart": null})).await;
//!
//! let client = fake.client();
//! assert!(client.cart(&CartId::new("gid://shopify/Cart/gone")).await?.is_none());
//! ```

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use wildenflower_storefront::config::ShopifyStorefrontConfig;
use wildenflower_storefront::shopify::StorefrontClient;

/// Token the fake expects in `X-Shopify-Storefront-Access-Token`.
pub const TEST_TOKEN: &str = "0f9c2e7a41b3d8e6c5a9";

const GRAPHQL_PATH: &str = "/api/2026-01/graphql.json";

/// A queued response.
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub body: String,
    pub retry_after: Option<u64>,
}

/// A request the fake received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub operation_name: Option<String>,
    pub query: String,
    pub variables: Value,
    pub access_token: Option<String>,
}

#[derive(Default)]
struct FakeState {
    responses: RwLock<VecDeque<CannedResponse>>,
    requests: RwLock<Vec<RecordedRequest>>,
}

/// In-process fake of the Storefront GraphQL endpoint.
pub struct FakeStorefront {
    state: Arc<FakeState>,
    addr: SocketAddr,
    _handle: JoinHandle<()>,
}

impl FakeStorefront {
    /// Start the fake on a random local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());

        // Bind to port 0 to get a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake storefront");
        let addr = listener.local_addr().expect("Failed to get local address");

        let app = Router::new()
            .route(GRAPHQL_PATH, post(handle_graphql))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake storefront failed");
        });

        Self {
            state,
            addr,
            _handle: handle,
        }
    }

    /// Full GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}{GRAPHQL_PATH}", self.addr)
    }

    /// Client configuration pointing at this fake's store.
    #[must_use]
    pub fn config(&self) -> ShopifyStorefrontConfig {
        ShopifyStorefrontConfig {
            store: self.addr.to_string(),
            api_version: "2026-01".to_string(),
            storefront_public_token: SecretString::from(TEST_TOKEN),
            timeout: Duration::from_secs(5),
        }
    }

    /// A real client wired to this fake.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> StorefrontClient {
        StorefrontClient::with_endpoint(&self.config(), self.endpoint())
            .expect("Failed to build storefront client")
    }

    /// Queue a raw response.
    pub async fn respond(&self, response: CannedResponse) {
        self.state.responses.write().await.push_back(response);
    }

    /// Queue a `200` response with `{"data": data}`.
    pub async fn respond_data(&self, data: Value) {
        self.respond_json(200, json!({ "data": data })).await;
    }

    /// Queue a JSON response with the given status.
    pub async fn respond_json(&self, status: u16, body: Value) {
        self.respond(CannedResponse {
            status,
            body: body.to_string(),
            retry_after: None,
        })
        .await;
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.read().await.clone()
    }
}

async fn handle_graphql(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);

    state.requests.write().await.push(RecordedRequest {
        operation_name: parsed["operationName"].as_str().map(str::to_string),
        query: parsed["query"].as_str().unwrap_or_default().to_string(),
        variables: parsed["variables"].clone(),
        access_token: headers
            .get("x-shopify-storefront-access-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let Some(canned) = state.responses.write().await.pop_front() else {
        return (StatusCode::INTERNAL_SERVER_ERROR, "no canned response").into_response();
    };

    let status = StatusCode::from_u16(canned.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (
        status,
        [(axum::http::header::CONTENT_TYPE, "application/json")],
        canned.body,
    )
        .into_response();
    if let Some(secs) = canned.retry_after {
        response
            .headers_mut()
            .insert("retry-after", HeaderValue::from(secs));
    }
    response
}

// =============================================================================
// Fixtures
// =============================================================================

fn money(amount: &str) -> Value {
    json!({ "amount": amount, "currencyCode": "USD" })
}

/// A `CartFields` fragment. Lines are `(line_id, variant_id, quantity)`,
/// each unit priced at 15.00.
#[must_use]
pub fn cart_json(cart_id: &str, lines: &[(&str, &str, i64)]) -> Value {
    let total_quantity: i64 = lines.iter().map(|(_, _, q)| q).sum();
    let subtotal = format!("{}.0", total_quantity * 15);

    json!({
        "id": cart_id,
        "checkoutUrl": format!("https://wildenflower.myshopify.com/cart/c/{}", cart_id.rsplit('/').next().unwrap_or_default()),
        "totalQuantity": total_quantity,
        "cost": {
            "subtotalAmount": money(&subtotal),
            "totalAmount": money(&subtotal),
            "totalTaxAmount": null
        },
        "lines": {
            "nodes": lines.iter().map(|(line_id, variant_id, quantity)| json!({
                "id": line_id,
                "quantity": quantity,
                "cost": { "totalAmount": money(&format!("{}.0", quantity * 15)) },
                "merchandise": {
                    "id": variant_id,
                    "title": "Default Title",
                    "quantityAvailable": 12,
                    "price": money("15.0"),
                    "selectedOptions": [{ "name": "Title", "value": "Default Title" }],
                    "product": {
                        "id": "gid://shopify/Product/p1",
                        "handle": "wild-violet-print",
                        "title": "Wild Violet Print",
                        "featuredImage": { "url": "https://cdn.shopify.com/violet.jpg", "altText": null }
                    }
                }
            })).collect::<Vec<_>>()
        }
    })
}

/// A cart mutation payload with the given cart and user-error messages.
#[must_use]
pub fn payload_json(cart: Option<Value>, user_errors: &[&str]) -> Value {
    json!({
        "cart": cart,
        "userErrors": user_errors
            .iter()
            .map(|message| json!({ "code": "INVALID", "field": ["lines"], "message": message }))
            .collect::<Vec<_>>()
    })
}

/// A `ProductFields` fragment.
#[must_use]
pub fn product_json(handle: &str, title: &str) -> Value {
    json!({
        "id": format!("gid://shopify/Product/{handle}"),
        "handle": handle,
        "title": title,
        "vendor": "Ashley Sifford",
        "featuredImage": { "url": format!("https://cdn.shopify.com/{handle}.jpg"), "altText": title },
        "priceRange": { "minVariantPrice": money("52.0") },
        "variants": { "nodes": [{ "id": format!("gid://shopify/ProductVariant/{handle}-1") }] }
    })
}
