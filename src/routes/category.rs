use crate::{AppState, handlers::categories};
use axum::{Router, routing::get};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/category",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/category/{id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
}
