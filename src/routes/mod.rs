//! Router Module Index
//!
//! One router per resource, each declaring full `/api/...` paths. The identity
//! gate is layered over all of them in `create_router`, so every handler sees an
//! `Identity` and decides for itself whether anonymous access is allowed.

use crate::AppState;
use axum::Router;

/// Admin accounts: login, bootstrap registration and management.
pub mod admin;

/// Category CRUD. Reads are public.
pub mod category;

/// Product CRUD with a single multipart image. Reads are public.
pub mod product;

/// Photo galleries with multipart image sets. Reads are public.
pub mod photo;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(admin::admin_routes())
        .merge(category::category_routes())
        .merge(product::product_routes())
        .merge(photo::photo_routes())
}
