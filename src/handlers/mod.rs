//! HTTP handlers, one module per resource.
//!
//! Every handler receives the caller's `Identity` from the gate. Reads are public;
//! each mutating handler calls `identity.require()` itself before doing any work.

use axum::{
    Json,
    extract::{
        Multipart, Path,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection},
    },
};
use uuid::Uuid;

use crate::{
    AppState,
    error::{AppError, AppResult},
};

pub mod admins;
pub mod categories;
pub mod photos;
pub mod products;
pub mod upload;

/// Unwraps a JSON body, reporting a malformed or missing body as a 400 in the
/// response envelope. Taking the `Result` lets handlers check identity first.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

pub(crate) fn multipart_body(
    payload: Result<Multipart, MultipartRejection>,
) -> AppResult<Multipart> {
    payload.map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Unwraps an `{id}` path segment. A segment that is not a UUID can never name a
/// record, but it is reported as a 400 in the envelope like any other bad input.
pub(crate) fn path_id(path: Result<Path<Uuid>, PathRejection>) -> AppResult<Uuid> {
    path.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(error = %rejection.body_text(), "rejected path id");
        AppError::Validation("Invalid id".to_string())
    })
}

/// resolve_category
///
/// Interprets an optional `categoryId` form value. Absent or blank means "no
/// category"; anything else must parse and name an existing category.
pub(crate) async fn resolve_category(state: &AppState, raw: Option<&str>) -> AppResult<Option<Uuid>> {
    let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let invalid = || AppError::Validation("Invalid category".to_string());

    let id = Uuid::parse_str(raw).map_err(|_| invalid())?;
    match state.repo.get_category(id).await? {
        Some(category) => Ok(Some(category.id)),
        None => Err(invalid()),
    }
}
