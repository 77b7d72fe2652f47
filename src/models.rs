use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Core Application Schemas (Mapped to Database) ---

/// CreatorStamp
///
/// A snapshot of the admin who created a record, copied at write time.
/// It is never refreshed when the creating admin later changes name or email,
/// and every field is null for records created without an identity (bootstrap).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct CreatorStamp {
    #[sqlx(rename = "created_by_id")]
    pub id: Option<Uuid>,
    #[sqlx(rename = "created_by_name")]
    pub name: Option<String>,
    #[sqlx(rename = "created_by_email")]
    pub email: Option<String>,
}

/// Admin
///
/// Public projection of an `admins` row. The password hash is deliberately not a
/// field here; it is only loaded through `AdminCredentials` on the login path.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Admin {
    pub id: Uuid,
    pub full_name: String,
    // Always stored lower-cased; unique across the table.
    pub email: String,
    #[sqlx(flatten)]
    pub created_by: CreatorStamp,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AdminCredentials
///
/// Opt-in load of an admin together with its bcrypt hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct AdminCredentials {
    #[sqlx(flatten)]
    pub admin: Admin,
    pub password_hash: String,
}

/// Category
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    // Trimmed and unique among non-empty names.
    #[serde(rename = "category_name")]
    pub category_name: String,
    #[sqlx(flatten)]
    pub created_by: CreatorStamp,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Product
///
/// `category_name` is not stored on the product: it is joined from `categories`
/// at read time and is null when the product has no category.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: Uuid,
    pub product_image: Option<String>,
    pub product_name: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    #[sqlx(default)]
    pub category_name: Option<String>,
    #[sqlx(flatten)]
    pub created_by: CreatorStamp,
    pub is_active: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Photo
///
/// An ordered gallery of media URLs. The photo owns every asset it references.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Photo {
    pub id: Uuid,
    pub images: Vec<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Repository Inputs ---

/// NewAdmin
///
/// Insert payload for the credential store. `password_hash` must already be hashed.
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_by: CreatorStamp,
}

/// AdminChanges
///
/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct AdminChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub category_name: String,
    pub created_by: CreatorStamp,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_image: Option<String>,
    pub product_name: String,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub created_by: CreatorStamp,
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub product_image: Option<String>,
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterAdminRequest
///
/// Input payload for POST /api/admin/register.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct RegisterAdminRequest {
    #[validate(length(min = 2, message = "Full Name must be at least 2 characters long"))]
    pub full_name: String,
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(default)]
#[ts(export)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Please provide email and password"))]
    pub email: String,
    #[validate(length(min = 1, message = "Please provide email and password"))]
    pub password: String,
}

/// UpdateAdminRequest
///
/// Partial profile edit. A supplied `password` is re-hashed before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateAdminRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "Full Name must be at least 2 characters long"))]
    pub full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: Option<String>,
}

/// CategoryRequest
///
/// Shared by create and update. The handler trims the name before validating it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[ts(export)]
pub struct CategoryRequest {
    #[serde(alias = "categoryName", skip_serializing_if = "Option::is_none")]
    #[validate(
        required(message = "Category_name is required"),
        length(min = 1, message = "Category_name is required")
    )]
    pub category_name: Option<String>,
}

/// RemoveImageRequest
///
/// Body of DELETE /api/photo/{id}/image.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Validate, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RemoveImageRequest {
    #[validate(
        required(message = "Image URL is required"),
        length(min = 1, message = "Image URL is required")
    )]
    pub image_url: Option<String>,
}

/// ProductUpload
///
/// OpenAPI description of the multipart body accepted by product create/update.
#[derive(Debug, ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ProductUpload {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub product_image: Option<Vec<u8>>,
}

/// PhotoUpload
///
/// OpenAPI description of the multipart body accepted by photo create/update.
#[derive(Debug, ToSchema)]
pub struct PhotoUpload {
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}

// --- Response Envelope ---

/// ApiResponse
///
/// Uniform response body: `{success, message?, data?, count?, token?, error?}`.
/// Absent fields are omitted from the JSON rather than serialized as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            count: None,
            token: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            count: None,
            token: None,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wraps a collection and fills `count` with its length.
    pub fn list(items: Vec<T>) -> Self {
        let count = items.len();
        let mut response = Self::ok(items);
        response.count = Some(count);
        response
    }
}
