use crate::{
    AppState,
    handlers::{photos, upload::MAX_UPLOAD_BYTES},
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get},
};

/// Photo Router Module
///
/// Create and update take `multipart/form-data` with a repeatable `images` field.
pub fn photo_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/photo",
            get(photos::list_photos).post(photos::create_photo),
        )
        .route(
            "/api/photo/{id}",
            get(photos::get_photo)
                .put(photos::update_photo)
                .delete(photos::delete_photo),
        )
        // DELETE /api/photo/{id}/image
        // Removes a single image (JSON body `{imageUrl}`) and destroys it on the media host.
        .route("/api/photo/{id}/image", delete(photos::remove_photo_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
