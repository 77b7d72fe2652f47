use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;
use validator::Validate;

use super::{json_body, path_id};
use crate::{
    AppState,
    auth::Identity,
    error::{AppError, AppResult},
    models::{ApiResponse, Category, CategoryRequest, NewCategory},
};

fn category_not_found() -> AppError {
    AppError::NotFound("Category not found".to_string())
}

/// Trims the submitted name, then validates it; a missing or blank name fails.
fn required_name(mut payload: CategoryRequest) -> AppResult<String> {
    payload.category_name = payload.category_name.map(|name| name.trim().to_string());
    payload.validate()?;
    Ok(payload.category_name.unwrap_or_default())
}

#[utoipa::path(
    get,
    path = "/api/category",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Category>>>> {
    Ok(Json(ApiResponse::list(state.repo.list_categories().await?)))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses((status = 200, description = "OK", body = Category), (status = 404, description = "Not found"))
)]
pub async fn get_category(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let id = path_id(id)?;
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or_else(category_not_found)?;
    Ok(Json(ApiResponse::ok(category)))
}

/// create_category
///
/// [Authenticated] Names are compared after trimming, so `"Shoes"` and
/// `" Shoes "` collide.
#[utoipa::path(
    post,
    path = "/api/category",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 400, description = "Missing name or duplicate"),
        (status = 401, description = "Admin authentication required")
    )
)]
pub async fn create_category(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    identity.require()?;
    let payload = json_body(payload)?;
    let name = required_name(payload)?;

    if state.repo.find_category_by_name(&name).await?.is_some() {
        return Err(AppError::Conflict("Category already exists".to_string()));
    }

    let category = state
        .repo
        .create_category(NewCategory {
            category_name: name,
            created_by: identity.creator_stamp(),
        })
        .await?;

    tracing::info!(category_id = %category.id, "category created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(category).with_message("Category created")),
    ))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Renamed", body = Category),
        (status = 400, description = "Missing name or duplicate"),
        (status = 401, description = "Admin authentication required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_category(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Category>>> {
    identity.require()?;
    let id = path_id(id)?;
    let payload = json_body(payload)?;
    let name = required_name(payload)?;

    if let Some(existing) = state.repo.find_category_by_name(&name).await? {
        if existing.id != id {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }
    }

    let category = state
        .repo
        .rename_category(id, &name)
        .await?
        .ok_or_else(category_not_found)?;

    Ok(Json(ApiResponse::ok(category).with_message("Category updated")))
}

/// delete_category
///
/// [Authenticated] Refused while any product still points at the category.
#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = Category),
        (status = 400, description = "Category still referenced by products"),
        (status = 401, description = "Admin authentication required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_category(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Category>>> {
    identity.require()?;
    let id = path_id(id)?;

    let in_use = state.repo.count_products_in_category(id).await?;
    if in_use > 0 {
        return Err(AppError::Validation(format!(
            "Category is still referenced by {in_use} product(s)"
        )));
    }

    let category = state
        .repo
        .delete_category(id)
        .await?
        .ok_or_else(category_not_found)?;

    tracing::info!(category_id = %category.id, "category deleted");
    Ok(Json(ApiResponse::ok(category).with_message("Category deleted")))
}
