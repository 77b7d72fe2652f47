use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartRejection, rejection::PathRejection},
    http::StatusCode,
};
use uuid::Uuid;

use super::{
    multipart_body, path_id, resolve_category,
    upload::{FormPayload, release_committed, upload_all},
};
use crate::{
    AppState,
    auth::Identity,
    error::{AppError, AppResult},
    models::{ApiResponse, NewProduct, Product, ProductChanges, ProductUpload},
    storage::MediaFolder,
};

const IMAGE_FIELD: &str = "productImage";

fn product_not_found() -> AppError {
    AppError::NotFound("Product not found".to_string())
}

/// Uploads the first `productImage` part, if any, and returns its URL.
async fn upload_image(state: &AppState, form: &mut FormPayload) -> AppResult<Option<String>> {
    let files: Vec<_> = form.take_files(IMAGE_FIELD).into_iter().take(1).collect();
    Ok(upload_all(&state.storage, MediaFolder::Products, files)
        .await?
        .into_iter()
        .next())
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

#[utoipa::path(
    get,
    path = "/api/product",
    responses((status = 200, description = "All products with category names", body = [Product]))
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Product>>>> {
    Ok(Json(ApiResponse::list(state.repo.list_products().await?)))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "OK", body = Product), (status = 404, description = "Not found"))
)]
pub async fn get_product(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let id = path_id(id)?;
    let product = state
        .repo
        .get_product(id)
        .await?
        .ok_or_else(product_not_found)?;
    Ok(Json(ApiResponse::ok(product)))
}

/// create_product
///
/// [Authenticated] Multipart form. The category is resolved before the image is
/// uploaded, so a bad `categoryId` never leaves media behind.
#[utoipa::path(
    post,
    path = "/api/product",
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Product),
        (status = 400, description = "Missing name or invalid category"),
        (status = 401, description = "Admin authentication required"),
        (status = 500, description = "Media host or store failure")
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    identity: Identity,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    identity.require()?;
    let mut form = FormPayload::read(multipart_body(multipart)?).await?;

    let product_name = trimmed(form.text("productName"))
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Validation("Product name is required".to_string()))?;
    let description = trimmed(form.text("description")).unwrap_or_default();
    let category_id = resolve_category(&state, form.text("categoryId")).await?;

    let product_image = upload_image(&state, &mut form).await?;

    let product = state
        .repo
        .create_product(NewProduct {
            product_image,
            product_name,
            description,
            category_id,
            created_by: identity.creator_stamp(),
        })
        .await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(product).with_message("Product created")),
    ))
}

/// update_product
///
/// [Authenticated] Only submitted fields change. A new `productImage` replaces
/// the stored one and the previous asset is released after the row is written.
#[utoipa::path(
    put,
    path = "/api/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body(content = ProductUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Product),
        (status = 400, description = "Blank name or invalid category"),
        (status = 401, description = "Admin authentication required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    identity.require()?;
    let id = path_id(id)?;
    let mut form = FormPayload::read(multipart_body(multipart)?).await?;

    let existing = state
        .repo
        .get_product(id)
        .await?
        .ok_or_else(product_not_found)?;

    let product_name = trimmed(form.text("productName"));
    if product_name.as_deref().is_some_and(str::is_empty) {
        return Err(AppError::Validation("Product name is required".to_string()));
    }
    let description = trimmed(form.text("description"));
    let category_id = resolve_category(&state, form.text("categoryId")).await?;

    let product_image = upload_image(&state, &mut form).await?;
    let replaced_image = product_image.is_some().then_some(existing.product_image).flatten();

    let product = state
        .repo
        .update_product(
            id,
            ProductChanges {
                product_image,
                product_name,
                description,
                category_id,
            },
        )
        .await?
        .ok_or_else(product_not_found)?;

    if let Some(old) = replaced_image {
        release_committed(&state.storage, MediaFolder::Products, &[old]).await;
    }

    Ok(Json(ApiResponse::ok(product).with_message("Product updated")))
}

#[utoipa::path(
    delete,
    path = "/api/product/{id}",
    params(("id" = Uuid, Path, description = "Product ID")),
    responses((status = 200, description = "Deleted", body = Product), (status = 401, description = "Admin authentication required"), (status = 404, description = "Not found"))
)]
pub async fn delete_product(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Product>>> {
    identity.require()?;
    let id = path_id(id)?;

    let product = state
        .repo
        .delete_product(id)
        .await?
        .ok_or_else(product_not_found)?;

    if let Some(image) = product.product_image.clone() {
        release_committed(&state.storage, MediaFolder::Products, &[image]).await;
    }

    tracing::info!(product_id = %product.id, "product deleted");
    Ok(Json(ApiResponse::ok(product).with_message("Product deleted")))
}
