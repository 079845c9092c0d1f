//! Collection type conversion functions.

use crate::shopify::types::{Collection, CollectionConnection, CollectionProducts, PageInfo};

use super::super::queries::{CollectionFields, get_collection_by_handle, get_collections};
use super::convert_image;
use super::products::convert_product_connection;

pub fn convert_collection(fields: CollectionFields) -> Collection {
    Collection {
        id: fields.id,
        handle: fields.handle,
        title: fields.title,
        description: fields.description,
        image: fields.image.map(convert_image),
    }
}

pub fn convert_collection_connection(conn: get_collections::CollectionNodes) -> CollectionConnection {
    CollectionConnection {
        collections: conn.nodes.into_iter().map(convert_collection).collect(),
        page_info: PageInfo {
            has_next_page: conn.page_info.has_next_page,
            end_cursor: conn.page_info.end_cursor,
        },
    }
}

pub fn convert_collection_products(
    data: get_collection_by_handle::CollectionWithProducts,
) -> CollectionProducts {
    CollectionProducts {
        collection: convert_collection(data.collection),
        products: convert_product_connection(data.products),
    }
}
