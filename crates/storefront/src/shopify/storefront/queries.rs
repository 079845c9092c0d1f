//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] by hand, with
//! its variables and response data typed to the subset of the schema we read.
//! Wire types here mirror Shopify's camelCase JSON; conversion into domain
//! types lives in `conversions`.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

// =============================================================================
// Documents
// =============================================================================

const CART_FIELDS: &str = r"
fragment CartFields on Cart {
  id
  checkoutUrl
  totalQuantity
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
    totalTaxAmount { amount currencyCode }
  }
  lines(first: 100) {
    nodes {
      id
      quantity
      cost { totalAmount { amount currencyCode } }
      merchandise {
        ... on ProductVariant {
          id
          title
          quantityAvailable
          price { amount currencyCode }
          selectedOptions { name value }
          product {
            id
            handle
            title
            featuredImage { url altText }
          }
        }
      }
    }
  }
}
";

const PRODUCT_FIELDS: &str = r"
fragment ProductFields on Product {
  id
  handle
  title
  vendor
  featuredImage { url altText }
  priceRange { minVariantPrice { amount currencyCode } }
  variants(first: 1) { nodes { id } }
}
";

const COLLECTION_FIELDS: &str = r"
fragment CollectionFields on Collection {
  id
  handle
  title
  description
  image { url altText }
}
";

macro_rules! document {
    ($fragment:ident, $body:literal) => {
        // concat! needs literals, so fragments are appended at runtime once.
        ::std::sync::LazyLock::new(|| format!("{}\n{}", $body, $fragment))
    };
    ($first:ident, $second:ident, $body:literal) => {
        ::std::sync::LazyLock::new(|| format!("{}\n{}\n{}", $body, $first, $second))
    };
}

static CART_CREATE: std::sync::LazyLock<String> = document!(
    CART_FIELDS,
    r"mutation CartCreate($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}"
);

static GET_CART: std::sync::LazyLock<String> = document!(
    CART_FIELDS,
    r"query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}"
);

static CART_LINES_ADD: std::sync::LazyLock<String> = document!(
    CART_FIELDS,
    r"mutation CartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}"
);

static CART_LINES_REMOVE: std::sync::LazyLock<String> = document!(
    CART_FIELDS,
    r"mutation CartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}"
);

static CART_LINES_UPDATE: std::sync::LazyLock<String> = document!(
    CART_FIELDS,
    r"mutation CartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}"
);

static GET_PRODUCT_BY_HANDLE: std::sync::LazyLock<String> = document!(
    PRODUCT_FIELDS,
    r"query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}"
);

static GET_PRODUCTS: std::sync::LazyLock<String> = document!(
    PRODUCT_FIELDS,
    r"query GetProducts($first: Int!, $after: String) {
  products(first: $first, after: $after) {
    nodes { ...ProductFields }
    pageInfo { hasNextPage endCursor }
  }
}"
);

static GET_COLLECTIONS: std::sync::LazyLock<String> = document!(
    COLLECTION_FIELDS,
    r"query GetCollections($first: Int!, $after: String) {
  collections(first: $first, after: $after) {
    nodes { ...CollectionFields }
    pageInfo { hasNextPage endCursor }
  }
}"
);

static GET_COLLECTION_BY_HANDLE: std::sync::LazyLock<String> = document!(
    COLLECTION_FIELDS,
    PRODUCT_FIELDS,
    r"query GetCollectionByHandle($handle: String!, $first: Int!, $after: String) {
  collection(handle: $handle) {
    ...CollectionFields
    products(first: $first, after: $after) {
      nodes { ...ProductFields }
      pageInfo { hasNextPage endCursor }
    }
  }
}"
);

/// `QueryBody` borrows the document for `'static`; the `LazyLock` statics
/// provide that.
fn body<V>(document: &'static std::sync::LazyLock<String>, operation_name: &'static str, variables: V) -> QueryBody<V> {
    QueryBody {
        variables,
        query: document.as_str(),
        operation_name,
    }
}

// =============================================================================
// Shared wire types
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoneyFields {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFields {
    pub url: String,
    pub alt_text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelectedOptionFields {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCostFields {
    pub subtotal_amount: MoneyFields,
    pub total_amount: MoneyFields,
    pub total_tax_amount: Option<MoneyFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCostFields {
    pub total_amount: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchandiseProductFields {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub featured_image: Option<ImageFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandiseFields {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub quantity_available: Option<i64>,
    pub price: MoneyFields,
    #[serde(default)]
    pub selected_options: Vec<SelectedOptionFields>,
    pub product: MerchandiseProductFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineFields {
    pub id: String,
    pub quantity: i64,
    pub cost: CartLineCostFields,
    pub merchandise: CartMerchandiseFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartLineNodes {
    pub nodes: Vec<CartLineFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFields {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCostFields,
    pub lines: CartLineNodes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUserErrorFields {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutationPayload {
    pub cart: Option<CartFields>,
    #[serde(default)]
    pub user_errors: Vec<CartUserErrorFields>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartLineUpdateInput {
    pub id: String,
    pub quantity: i64,
}

// =============================================================================
// Cart operations
// =============================================================================

pub struct CartCreate;

pub mod cart_create {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for CartCreate {
    type Variables = cart_create::Variables;
    type ResponseData = cart_create::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&CART_CREATE, "CartCreate", variables)
    }
}

pub struct GetCart;

pub mod get_cart {
    use super::{CartFields, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<CartFields>,
    }
}

impl GraphQLQuery for GetCart {
    type Variables = get_cart::Variables;
    type ResponseData = get_cart::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&GET_CART, "GetCart", variables)
    }
}

pub struct CartLinesAdd;

pub mod cart_lines_add {
    use super::{CartLineInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for CartLinesAdd {
    type Variables = cart_lines_add::Variables;
    type ResponseData = cart_lines_add::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&CART_LINES_ADD, "CartLinesAdd", variables)
    }
}

pub struct CartLinesRemove;

pub mod cart_lines_remove {
    use super::{CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for CartLinesRemove {
    type Variables = cart_lines_remove::Variables;
    type ResponseData = cart_lines_remove::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&CART_LINES_REMOVE, "CartLinesRemove", variables)
    }
}

pub struct CartLinesUpdate;

pub mod cart_lines_update {
    use super::{CartLineUpdateInput, CartMutationPayload, Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartMutationPayload>,
    }
}

impl GraphQLQuery for CartLinesUpdate {
    type Variables = cart_lines_update::Variables;
    type ResponseData = cart_lines_update::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&CART_LINES_UPDATE, "CartLinesUpdate", variables)
    }
}

// =============================================================================
// Product operations
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRangeFields {
    pub min_variant_price: MoneyFields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantIdFields {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VariantNodes {
    pub nodes: Vec<VariantIdFields>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub vendor: String,
    pub featured_image: Option<ImageFields>,
    pub price_range: PriceRangeFields,
    pub variants: VariantNodes,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfoFields {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

pub struct GetProductByHandle;

pub mod get_product_by_handle {
    use super::{Deserialize, ProductFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub product: Option<ProductFields>,
    }
}

impl GraphQLQuery for GetProductByHandle {
    type Variables = get_product_by_handle::Variables;
    type ResponseData = get_product_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&GET_PRODUCT_BY_HANDLE, "GetProductByHandle", variables)
    }
}

pub struct GetProducts;

pub mod get_products {
    use super::{Deserialize, PageInfoFields, ProductFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ProductNodes {
        pub nodes: Vec<ProductFields>,
        pub page_info: PageInfoFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub products: ProductNodes,
    }
}

impl GraphQLQuery for GetProducts {
    type Variables = get_products::Variables;
    type ResponseData = get_products::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&GET_PRODUCTS, "GetProducts", variables)
    }
}

// =============================================================================
// Collection operations
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionFields {
    pub id: String,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub image: Option<ImageFields>,
}

pub struct GetCollections;

pub mod get_collections {
    use super::{CollectionFields, Deserialize, PageInfoFields, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CollectionNodes {
        pub nodes: Vec<CollectionFields>,
        pub page_info: PageInfoFields,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collections: CollectionNodes,
    }
}

impl GraphQLQuery for GetCollections {
    type Variables = get_collections::Variables;
    type ResponseData = get_collections::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&GET_COLLECTIONS, "GetCollections", variables)
    }
}

pub struct GetCollectionByHandle;

pub mod get_collection_by_handle {
    use super::{CollectionFields, Deserialize, Serialize, get_products::ProductNodes};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct CollectionWithProducts {
        #[serde(flatten)]
        pub collection: CollectionFields,
        pub products: ProductNodes,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<CollectionWithProducts>,
    }
}

impl GraphQLQuery for GetCollectionByHandle {
    type Variables = get_collection_by_handle::Variables;
    type ResponseData = get_collection_by_handle::ResponseData;

    fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
        body(&GET_COLLECTION_BY_HANDLE, "GetCollectionByHandle", variables)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_include_fragments() {
        let query = CartLinesUpdate::build_query(cart_lines_update::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            lines: vec![],
        });
        assert!(query.query.contains("fragment CartFields on Cart"));
        assert!(query.query.contains("cartLinesUpdate(cartId: $cartId"));
        assert_eq!(query.operation_name, "CartLinesUpdate");
    }

    #[test]
    fn test_variables_serialize_camel_case() {
        let query = CartLinesRemove::build_query(cart_lines_remove::Variables {
            cart_id: "gid://shopify/Cart/1".to_string(),
            line_ids: vec!["gid://shopify/CartLine/L1".to_string()],
        });
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["operationName"], "CartLinesRemove");
        assert_eq!(json["variables"]["cartId"], "gid://shopify/Cart/1");
        assert_eq!(json["variables"]["lineIds"][0], "gid://shopify/CartLine/L1");
    }

    #[test]
    fn test_create_variables_use_merchandise_id() {
        let vars = cart_create::Variables {
            input: cart_create::CartInput {
                lines: vec![CartLineInput {
                    merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
                    quantity: 2,
                }],
            },
        };
        let json = serde_json::to_value(&vars).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "input": {"lines": [{"merchandiseId": "gid://shopify/ProductVariant/1", "quantity": 2}]}
            })
        );
    }

    #[test]
    fn test_collection_document_carries_both_fragments() {
        let query = GetCollectionByHandle::build_query(get_collection_by_handle::Variables {
            handle: "prints".to_string(),
            first: 12,
            after: None,
        });
        assert!(query.query.contains("fragment CollectionFields on Collection"));
        assert!(query.query.contains("fragment ProductFields on Product"));
        assert_eq!(query.operation_name, "GetCollectionByHandle");
    }
}
