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
    models::{
        Admin, AdminChanges, ApiResponse, LoginRequest, NewAdmin, RegisterAdminRequest,
        UpdateAdminRequest,
    },
    password::{hash_secret_blocking, verify_secret_blocking},
};

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

fn admin_not_found() -> AppError {
    AppError::NotFound("Admin not found".to_string())
}

/// login
///
/// [Public] Exchanges email + password for a 7-day bearer token.
/// Unknown email and wrong password both answer "Invalid credentials"; an inactive
/// admin is refused even with the right password.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued; admin in `data`, token in `token`", body = Admin),
        (status = 400, description = "Missing email or password"),
        (status = 401, description = "Invalid credentials or inactive admin")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let payload = json_body(payload)?;
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let credentials = state
        .repo
        .find_credentials_by_email(&email)
        .await?
        .ok_or_else(invalid_credentials)?;

    if !verify_secret_blocking(payload.password, credentials.password_hash).await? {
        tracing::debug!(%email, "login rejected: wrong password");
        return Err(invalid_credentials());
    }
    if !credentials.admin.is_active {
        return Err(AppError::Unauthorized("Admin account is inactive".to_string()));
    }

    let token = state.tokens.issue(credentials.admin.id)?;
    tracing::info!(admin_id = %credentials.admin.id, "admin logged in");

    Ok(Json(
        ApiResponse::ok(credentials.admin)
            .with_message("Login successful")
            .with_token(token),
    ))
}

/// register
///
/// [Bootstrap / Authenticated] Creates an admin and returns a token for it.
///
/// Anonymous callers may only register the very first admin, unless open
/// registration is configured. When an admin performs the registration, their
/// `{id, name, email}` is stamped on the new record as `createdBy`.
#[utoipa::path(
    post,
    path = "/api/admin/register",
    request_body = RegisterAdminRequest,
    responses(
        (status = 201, description = "Registered", body = Admin),
        (status = 400, description = "Invalid input or email already registered"),
        (status = 401, description = "Admins exist and the caller is anonymous")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    identity: Identity,
    payload: Result<Json<RegisterAdminRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Admin>>)> {
    if !identity.is_authenticated()
        && !state.config.open_registration
        && state.repo.count_admins().await? > 0
    {
        return Err(AppError::admin_required());
    }

    let mut payload = json_body(payload)?;
    payload.full_name = payload.full_name.trim().to_string();
    payload.email = normalize_email(&payload.email);
    payload.validate()?;

    if state.repo.find_admin_by_email(&payload.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = hash_secret_blocking(payload.password, state.config.bcrypt_cost).await?;
    let admin = state
        .repo
        .create_admin(NewAdmin {
            full_name: payload.full_name,
            email: payload.email,
            password_hash,
            created_by: identity.creator_stamp(),
        })
        .await?;

    let token = state.tokens.issue(admin.id)?;
    tracing::info!(admin_id = %admin.id, created_by = ?admin.created_by.id, "admin registered");

    Ok((
        StatusCode::CREATED,
        Json(
            ApiResponse::ok(admin)
                .with_message("Admin registered successfully")
                .with_token(token),
        ),
    ))
}

/// list_admins
///
/// [Authenticated] Every admin, newest first.
#[utoipa::path(
    get,
    path = "/api/admin",
    responses((status = 200, description = "All admins", body = [Admin]), (status = 401, description = "Admin authentication required"))
)]
pub async fn list_admins(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<ApiResponse<Vec<Admin>>>> {
    identity.require()?;
    Ok(Json(ApiResponse::list(state.repo.list_admins().await?)))
}

/// list_my_admins
///
/// [Authenticated] Admins whose `createdBy.id` is the caller.
#[utoipa::path(
    get,
    path = "/api/admin/created-by/me",
    responses((status = 200, description = "Admins I created", body = [Admin]), (status = 401, description = "Admin authentication required"))
)]
pub async fn list_my_admins(
    State(state): State<AppState>,
    identity: Identity,
) -> AppResult<Json<ApiResponse<Vec<Admin>>>> {
    let me = identity.require()?;
    Ok(Json(ApiResponse::list(
        state.repo.list_admins_created_by(me.id).await?,
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/{id}",
    params(("id" = Uuid, Path, description = "Admin ID")),
    responses((status = 200, description = "OK", body = Admin), (status = 401, description = "Admin authentication required"), (status = 404, description = "Not found"))
)]
pub async fn get_admin(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    identity.require()?;
    let id = path_id(id)?;
    let admin = state
        .repo
        .find_admin_by_id(id)
        .await?
        .ok_or_else(admin_not_found)?;
    Ok(Json(ApiResponse::ok(admin)))
}

/// update_admin
///
/// [Authenticated] Profile edit. A new email must not belong to another admin;
/// a new password is hashed before it reaches the store.
#[utoipa::path(
    put,
    path = "/api/admin/{id}",
    params(("id" = Uuid, Path, description = "Admin ID")),
    request_body = UpdateAdminRequest,
    responses(
        (status = 200, description = "Updated", body = Admin),
        (status = 400, description = "Invalid input or email in use"),
        (status = 401, description = "Admin authentication required"),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_admin(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateAdminRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    identity.require()?;
    let id = path_id(id)?;

    let mut payload = json_body(payload)?;
    payload.full_name = payload.full_name.map(|name| name.trim().to_string());
    payload.email = payload.email.as_deref().map(normalize_email);
    payload.validate()?;

    if state.repo.find_admin_by_id(id).await?.is_none() {
        return Err(admin_not_found());
    }

    if let Some(email) = payload.email.as_deref() {
        if let Some(owner) = state.repo.find_admin_by_email(email).await? {
            if owner.id != id {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }
    }

    let password_hash = match payload.password {
        Some(secret) => Some(hash_secret_blocking(secret, state.config.bcrypt_cost).await?),
        None => None,
    };

    let admin = state
        .repo
        .update_admin(
            id,
            AdminChanges {
                full_name: payload.full_name,
                email: payload.email,
                password_hash,
            },
        )
        .await?
        .ok_or_else(admin_not_found)?;

    Ok(Json(
        ApiResponse::ok(admin).with_message("Admin updated successfully"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/admin/{id}",
    params(("id" = Uuid, Path, description = "Admin ID")),
    responses((status = 200, description = "Deleted", body = Admin), (status = 401, description = "Admin authentication required"), (status = 404, description = "Not found"))
)]
pub async fn delete_admin(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let me = identity.require()?;
    let id = path_id(id)?;
    let admin = state
        .repo
        .delete_admin(id)
        .await?
        .ok_or_else(admin_not_found)?;

    tracing::info!(admin_id = %admin.id, deleted_by = %me.id, "admin deleted");
    Ok(Json(
        ApiResponse::ok(admin).with_message("Admin deleted successfully"),
    ))
}

async fn set_active(
    state: &AppState,
    identity: &Identity,
    id: Result<Path<Uuid>, PathRejection>,
    is_active: bool,
) -> AppResult<Admin> {
    let me = identity.require()?;
    let id = path_id(id)?;
    let admin = state
        .repo
        .set_admin_active(id, is_active)
        .await?
        .ok_or_else(admin_not_found)?;

    tracing::info!(admin_id = %admin.id, is_active, changed_by = %me.id, "admin status changed");
    Ok(admin)
}

#[utoipa::path(
    put,
    path = "/api/admin/{id}/activate",
    params(("id" = Uuid, Path, description = "Admin ID")),
    responses((status = 200, description = "OK", body = Admin), (status = 401, description = "Admin authentication required"), (status = 404, description = "Not found"))
)]
pub async fn activate_admin(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let admin = set_active(&state, &identity, id, true).await?;
    Ok(Json(
        ApiResponse::ok(admin).with_message("Admin activated successfully"),
    ))
}

/// deactivate_admin
///
/// [Authenticated] Blocks future logins. Tokens already issued to the admin keep
/// working unless `ENFORCE_ACTIVE_TOKENS` is set.
#[utoipa::path(
    put,
    path = "/api/admin/{id}/deactivate",
    params(("id" = Uuid, Path, description = "Admin ID")),
    responses((status = 200, description = "OK", body = Admin), (status = 401, description = "Admin authentication required"), (status = 404, description = "Not found"))
)]
pub async fn deactivate_admin(
    State(state): State<AppState>,
    identity: Identity,
    id: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ApiResponse<Admin>>> {
    let admin = set_active(&state, &identity, id, false).await?;
    Ok(Json(
        ApiResponse::ok(admin).with_message("Admin deactivated successfully"),
    ))
}
