use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
    routing::get,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod storage;

// One router per resource, all under /api.
pub mod routes;

// --- Public Re-exports ---

pub use auth::{Identity, TokenService};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{PostgresRepository, Repository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageService, StorageState};

/// ApiDoc
///
/// OpenAPI document for every `/api` route, served at `/api-docs/openapi.json`
/// and browsable through the Swagger UI.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::admins::login, handlers::admins::register, handlers::admins::list_admins,
        handlers::admins::list_my_admins, handlers::admins::get_admin, handlers::admins::update_admin,
        handlers::admins::delete_admin, handlers::admins::activate_admin,
        handlers::admins::deactivate_admin,
        handlers::categories::list_categories, handlers::categories::get_category,
        handlers::categories::create_category, handlers::categories::update_category,
        handlers::categories::delete_category,
        handlers::products::list_products, handlers::products::get_product,
        handlers::products::create_product, handlers::products::update_product,
        handlers::products::delete_product,
        handlers::photos::list_photos, handlers::photos::get_photo, handlers::photos::create_photo,
        handlers::photos::update_photo, handlers::photos::delete_photo,
        handlers::photos::remove_photo_image
    ),
    components(
        schemas(
            models::Admin, models::CreatorStamp, models::Category, models::Product, models::Photo,
            models::RegisterAdminRequest, models::LoginRequest, models::UpdateAdminRequest,
            models::CategoryRequest, models::RemoveImageRequest, models::ProductUpload,
            models::PhotoUpload,
        )
    ),
    tags(
        (name = "catalog-admin", description = "Catalog administration API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, cloned cheaply into each handler.
#[derive(Clone)]
pub struct AppState {
    /// Categories, products, photos and the admin credential store.
    pub repo: RepositoryState,
    /// The media host.
    pub storage: StorageState,
    pub config: AppConfig,
    /// Signs and verifies admin bearer tokens.
    pub tokens: TokenService,
}

impl AppState {
    /// Builds the state, deriving the token service from `config.jwt_secret`.
    pub fn new(repo: RepositoryState, storage: StorageState, config: AppConfig) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        Self {
            repo,
            storage,
            config,
            tokens,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> TokenService {
        app_state.tokens.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the identity gate and the global
/// observability layers, and registers the application state.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Liveness check; bypasses the identity gate.
        .route("/health", get(|| async { "ok" }))
        // Every /api route runs behind the fail-open identity gate. It never rejects;
        // handlers decide whether an anonymous caller may proceed.
        .merge(
            routes::api_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::identity_gate,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set by the layer
/// above so every log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
