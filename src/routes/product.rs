use crate::{
    AppState,
    handlers::{products, upload::MAX_UPLOAD_BYTES},
};
use axum::{Router, extract::DefaultBodyLimit, routing::get};

/// Product Router Module
///
/// Create and update take `multipart/form-data`; the body limit is raised to
/// admit one product image.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/product",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/product/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
