use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use super::{
    json_body, multipart_body, path_id,
    upload::{FormPayload, release_committed, upload_all},
};
use crate::{
    AppState,
    auth::Identity,
    error::{AppError, AppResult},
    models::{ApiResponse, Photo, PhotoUpload, RemoveImageRequest},
    storage::{MediaFolder, media_reference},
};

const IMAGES_FIELD: &str = "images";

fn photo_not_found() -> AppError {
    AppError::NotFound("Photo not found".to_string())
}

#[utoipa::path(
    get,
    path = "/api/photo",
    responses((status = 200, description = "All photos", body = [Photo]))
)]
pub async fn list_photos(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Photo>>>> {
    Ok(Json(ApiResponse::list(state.repo.list_photos().await?)))
}

#[utoipa::path(
    get,
    path = "/api/photo/{id}",
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses((status = 200, description = "OK", body = Photo), (status = 404, description = "Not found"))
)]
pub async fn get_photo(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Photo>>> {
    let id = path_id(id)?;
    let photo = state
        .repo
        .get_photo(id)
        .await?
        .ok_or_else(photo_not_found)?;
    Ok(Json(ApiResponse::ok(photo)))
}

/// create_photo
///
/// [Authenticated] Uploads every `images` part in order. A failure part-way
/// through fails the request; images uploaded before it are not rolled back.
#[utoipa::path(
    post,
    path = "/api/photo",
    request_body(content = PhotoUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Photo),
        (status = 400, description = "No images submitted"),
        (status = 401, description = "Admin authentication required"),
        (status = 500, description = "Media host failure")
    )
)]
pub async fn create_photo(
    State(state): State<AppState>,
    identity: Identity,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Photo>>)> {
    identity.require()?;
    let mut form = FormPayload::read(multipart_body(multipart)?).await?;

    let files = form.take_files(IMAGES_FIELD);
    if files.is_empty() {
        return Err(AppError::Validation("At least one image is required".to_string()));
    }

    let urls = upload_all(&state.storage, MediaFolder::Photo, files).await?;
    let photo = state.repo.create_photo(urls).await?;

    tracing::info!(photo_id = %photo.id, images = photo.images.len(), "photo created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(photo).with_message("Photo created")),
    ))
}

/// update_photo
///
/// [Authenticated] Submitting images replaces the whole set; the previous assets
/// are released once the new set is stored. An empty submission changes nothing.
#[utoipa::path(
    put,
    path = "/api/photo/{id}",
    params(("id" = Uuid, Path, description = "Photo ID")),
    request_body(content = PhotoUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Photo),
        (status = 401, description = "Admin authentication required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_photo(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<Photo>>> {
    identity.require()?;
    let id = path_id(id)?;
    let mut form = FormPayload::read(multipart_body(multipart)?).await?;

    let existing = state
        .repo
        .get_photo(id)
        .await?
        .ok_or_else(photo_not_found)?;

    let files = form.take_files(IMAGES_FIELD);
    if files.is_empty() {
        return Ok(Json(ApiResponse::ok(existing).with_message("Photo updated")));
    }

    let urls = upload_all(&state.storage, MediaFolder::Photo, files).await?;
    let photo = state
        .repo
        .set_photo_images(id, urls)
        .await?
        .ok_or_else(photo_not_found)?;

    release_committed(&state.storage, MediaFolder::Photo, &existing.images).await;

    Ok(Json(ApiResponse::ok(photo).with_message("Photo updated")))
}

#[utoipa::path(
    delete,
    path = "/api/photo/{id}",
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses((status = 200, description = "Deleted", body = Photo), (status = 401, description = "Admin authentication required"), (status = 404, description = "Not found"))
)]
pub async fn delete_photo(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Photo>>> {
    identity.require()?;
    let id = path_id(id)?;

    let photo = state
        .repo
        .delete_photo(id)
        .await?
        .ok_or_else(photo_not_found)?;

    release_committed(&state.storage, MediaFolder::Photo, &photo.images).await;

    tracing::info!(photo_id = %photo.id, "photo deleted");
    Ok(Json(ApiResponse::ok(photo).with_message("Photo deleted")))
}

/// remove_photo_image
///
/// [Authenticated] Destroys one asset on the media host, then drops its URL from
/// the photo. The remaining images keep their order.
#[utoipa::path(
    delete,
    path = "/api/photo/{id}/image",
    params(("id" = Uuid, Path, description = "Photo ID")),
    request_body = RemoveImageRequest,
    responses(
        (status = 200, description = "Image removed; remaining photo in `data`", body = Photo),
        (status = 400, description = "Missing imageUrl"),
        (status = 401, description = "Admin authentication required"),
        (status = 404, description = "Photo not found or image not in photo")
    )
)]
pub async fn remove_photo_image(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RemoveImageRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Photo>>> {
    identity.require()?;
    let id = path_id(id)?;
    let mut payload = json_body(payload)?;
    payload.image_url = payload.image_url.map(|url| url.trim().to_string());
    payload.validate()?;
    let image_url = payload.image_url.unwrap_or_default();

    let photo = state
        .repo
        .get_photo(id)
        .await?
        .ok_or_else(photo_not_found)?;

    if !photo.images.contains(&image_url) {
        return Err(AppError::NotFound("Image not found in photo".to_string()));
    }

    let reference = media_reference(&image_url, MediaFolder::Photo)
        .ok_or_else(|| AppError::Validation("Image URL is not a media reference".to_string()))?;
    state
        .storage
        .destroy(&reference)
        .await
        .map_err(AppError::Storage)?;

    let remaining: Vec<String> = photo
        .images
        .into_iter()
        .filter(|url| url != &image_url)
        .collect();
    let photo = state
        .repo
        .set_photo_images(id, remaining)
        .await?
        .ok_or_else(photo_not_found)?;

    tracing::info!(photo_id = %photo.id, %reference, "photo image removed");
    Ok(Json(
        ApiResponse::ok(photo).with_message("Image deleted successfully"),
    ))
}
