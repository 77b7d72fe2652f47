use crate::{AppState, handlers::admins};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Login is public. Registration is public only while no admin exists (or when
/// open registration is configured); the handler enforces that. Every other route
/// requires a resolved identity.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/admin/login
        // Exchanges email + password for a bearer token.
        .route("/api/admin/login", post(admins::login))
        // POST /api/admin/register
        // Bootstraps the first admin, or lets an admin create another one.
        .route("/api/admin/register", post(admins::register))
        .route("/api/admin", get(admins::list_admins))
        // Must be declared alongside `/{id}`; the static segment wins in matchit.
        .route("/api/admin/created-by/me", get(admins::list_my_admins))
        .route(
            "/api/admin/{id}",
            get(admins::get_admin)
                .put(admins::update_admin)
                .delete(admins::delete_admin),
        )
        .route("/api/admin/{id}/activate", put(admins::activate_admin))
        .route("/api/admin/{id}/deactivate", put(admins::deactivate_admin))
}
