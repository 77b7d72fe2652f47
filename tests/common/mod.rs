#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use catalog_admin::{
    AppConfig, AppError, AppResult, AppState, MockStorageService, create_router,
    models::{
        Admin, AdminChanges, AdminCredentials, Category, CreatorStamp, NewAdmin, NewCategory,
        NewProduct, Photo, Product, ProductChanges,
    },
    password::hash_secret,
    repository::{Repository, RepositoryState},
    storage::StorageState,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::util::ServiceExt;
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY ---

// Mirrors the Postgres schema's constraints: unique admin email, partial unique
// category name, and the RESTRICT foreign key from products to categories.
#[derive(Default)]
struct Store {
    admins: Vec<AdminCredentials>,
    categories: Vec<Category>,
    products: Vec<Product>,
    photos: Vec<Photo>,
}

impl Store {
    fn with_category_name(&self, mut product: Product) -> Product {
        product.category_name = product.category_id.and_then(|id| {
            self.categories
                .iter()
                .find(|c| c.id == id)
                .map(|c| c.category_name.clone())
        });
        product
    }

    fn category_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        !name.is_empty()
            && self
                .categories
                .iter()
                .any(|c| c.category_name == name && Some(c.id) != except)
    }
}

#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

impl InMemoryRepository {
    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    pub fn photo_count(&self) -> usize {
        self.store().photos.len()
    }

    pub fn product_count(&self) -> usize {
        self.store().products.len()
    }
}

fn newest_first<T: Clone>(items: &[T]) -> Vec<T> {
    items.iter().rev().cloned().collect()
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn count_admins(&self) -> AppResult<i64> {
        Ok(self.store().admins.len() as i64)
    }

    async fn find_admin_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        Ok(self
            .store()
            .admins
            .iter()
            .find(|c| c.admin.id == id)
            .map(|c| c.admin.clone()))
    }

    async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        Ok(self
            .store()
            .admins
            .iter()
            .find(|c| c.admin.email == email)
            .map(|c| c.admin.clone()))
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<AdminCredentials>> {
        Ok(self
            .store()
            .admins
            .iter()
            .find(|c| c.admin.email == email)
            .cloned())
    }

    async fn list_admins(&self) -> AppResult<Vec<Admin>> {
        let store = self.store();
        Ok(store.admins.iter().rev().map(|c| c.admin.clone()).collect())
    }

    async fn list_admins_created_by(&self, creator_id: Uuid) -> AppResult<Vec<Admin>> {
        let store = self.store();
        Ok(store
            .admins
            .iter()
            .rev()
            .filter(|c| c.admin.created_by.id == Some(creator_id))
            .map(|c| c.admin.clone())
            .collect())
    }

    async fn create_admin(&self, admin: NewAdmin) -> AppResult<Admin> {
        let mut store = self.store();
        if store.admins.iter().any(|c| c.admin.email == admin.email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let now = Utc::now();
        let record = Admin {
            id: Uuid::new_v4(),
            full_name: admin.full_name,
            email: admin.email,
            created_by: admin.created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        store.admins.push(AdminCredentials {
            admin: record.clone(),
            password_hash: admin.password_hash,
        });
        Ok(record)
    }

    async fn update_admin(&self, id: Uuid, changes: AdminChanges) -> AppResult<Option<Admin>> {
        let mut store = self.store();
        if let Some(email) = changes.email.as_deref() {
            if store
                .admins
                .iter()
                .any(|c| c.admin.email == email && c.admin.id != id)
            {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }
        let Some(record) = store.admins.iter_mut().find(|c| c.admin.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.full_name {
            record.admin.full_name = name;
        }
        if let Some(email) = changes.email {
            record.admin.email = email;
        }
        if let Some(hash) = changes.password_hash {
            record.password_hash = hash;
        }
        record.admin.updated_at = Utc::now();
        Ok(Some(record.admin.clone()))
    }

    async fn delete_admin(&self, id: Uuid) -> AppResult<Option<Admin>> {
        let mut store = self.store();
        let position = store.admins.iter().position(|c| c.admin.id == id);
        Ok(position.map(|i| store.admins.remove(i).admin))
    }

    async fn set_admin_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<Admin>> {
        let mut store = self.store();
        Ok(store
            .admins
            .iter_mut()
            .find(|c| c.admin.id == id)
            .map(|c| {
                c.admin.is_active = is_active;
                c.admin.clone()
            }))
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(newest_first(&self.store().categories))
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(self.store().categories.iter().find(|c| c.id == id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(self
            .store()
            .categories
            .iter()
            .find(|c| c.category_name == name)
            .cloned())
    }

    async fn create_category(&self, category: NewCategory) -> AppResult<Category> {
        let mut store = self.store();
        if store.category_name_taken(&category.category_name, None) {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }
        let now = Utc::now();
        let record = Category {
            id: Uuid::new_v4(),
            category_name: category.category_name,
            created_by: category.created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        store.categories.push(record.clone());
        Ok(record)
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> AppResult<Option<Category>> {
        let mut store = self.store();
        if store.category_name_taken(name, Some(id)) {
            return Err(AppError::Conflict("Category already exists".to_string()));
        }
        Ok(store.categories.iter_mut().find(|c| c.id == id).map(|c| {
            c.category_name = name.to_string();
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        let mut store = self.store();
        if store.products.iter().any(|p| p.category_id == Some(id)) {
            return Err(AppError::Validation(
                "Category is still referenced by products".to_string(),
            ));
        }
        let position = store.categories.iter().position(|c| c.id == id);
        Ok(position.map(|i| store.categories.remove(i)))
    }

    async fn count_products_in_category(&self, id: Uuid) -> AppResult<i64> {
        Ok(self
            .store()
            .products
            .iter()
            .filter(|p| p.category_id == Some(id))
            .count() as i64)
    }

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        let store = self.store();
        Ok(store
            .products
            .iter()
            .rev()
            .map(|p| store.with_category_name(p.clone()))
            .collect())
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let store = self.store();
        Ok(store
            .products
            .iter()
            .find(|p| p.id == id)
            .map(|p| store.with_category_name(p.clone())))
    }

    async fn create_product(&self, product: NewProduct) -> AppResult<Product> {
        let mut store = self.store();
        if let Some(category_id) = product.category_id {
            if !store.categories.iter().any(|c| c.id == category_id) {
                return Err(AppError::Validation("Invalid category".to_string()));
            }
        }
        let now = Utc::now();
        let record = Product {
            id: Uuid::new_v4(),
            product_image: product.product_image,
            product_name: product.product_name,
            description: product.description,
            category_id: product.category_id,
            category_name: None,
            created_by: product.created_by,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        store.products.push(record.clone());
        Ok(store.with_category_name(record))
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        let mut store = self.store();
        let Some(record) = store.products.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(image) = changes.product_image {
            record.product_image = Some(image);
        }
        if let Some(name) = changes.product_name {
            record.product_name = name;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        if let Some(category_id) = changes.category_id {
            record.category_id = Some(category_id);
        }
        record.updated_at = Utc::now();
        let updated = record.clone();
        Ok(Some(store.with_category_name(updated)))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        let mut store = self.store();
        let position = store.products.iter().position(|p| p.id == id);
        let removed = position.map(|i| store.products.remove(i));
        Ok(removed.map(|p| store.with_category_name(p)))
    }

    async fn list_photos(&self) -> AppResult<Vec<Photo>> {
        Ok(newest_first(&self.store().photos))
    }

    async fn get_photo(&self, id: Uuid) -> AppResult<Option<Photo>> {
        Ok(self.store().photos.iter().find(|p| p.id == id).cloned())
    }

    async fn create_photo(&self, images: Vec<String>) -> AppResult<Photo> {
        let now = Utc::now();
        let record = Photo {
            id: Uuid::new_v4(),
            images,
            created_at: now,
            updated_at: now,
        };
        self.store().photos.push(record.clone());
        Ok(record)
    }

    async fn set_photo_images(&self, id: Uuid, images: Vec<String>) -> AppResult<Option<Photo>> {
        let mut store = self.store();
        Ok(store.photos.iter_mut().find(|p| p.id == id).map(|p| {
            p.images = images;
            p.updated_at = Utc::now();
            p.clone()
        }))
    }

    async fn delete_photo(&self, id: Uuid) -> AppResult<Option<Photo>> {
        let mut store = self.store();
        let position = store.photos.iter().position(|p| p.id == id);
        Ok(position.map(|i| store.photos.remove(i)))
    }
}

// --- TEST APPLICATION ---

pub const TEST_PASSWORD: &str = "secret-pass";

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub fn test_config() -> AppConfig {
    AppConfig {
        bcrypt_cost: 4,
        ..AppConfig::default()
    }
}

pub struct TestApp {
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(MockStorageService::new(), test_config())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        Self::build(storage, test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self::build(MockStorageService::new(), config)
    }

    fn build(storage: MockStorageService, config: AppConfig) -> Self {
        let repo = Arc::new(InMemoryRepository::default());
        let state = AppState::new(
            repo.clone() as RepositoryState,
            Arc::new(storage.clone()) as StorageState,
            config,
        );
        Self {
            state,
            repo,
            storage,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Inserts an admin directly into the store, bypassing the registration rules.
    pub async fn seed_admin(&self, full_name: &str, email: &str) -> Admin {
        self.repo
            .create_admin(NewAdmin {
                full_name: full_name.to_string(),
                email: email.to_string(),
                password_hash: hash_secret(TEST_PASSWORD, 4).unwrap(),
                created_by: CreatorStamp::default(),
            })
            .await
            .unwrap()
    }

    pub fn token_for(&self, admin: &Admin) -> String {
        self.state.tokens.issue(admin.id).unwrap()
    }

    /// Seeds an admin and returns a bearer token for it.
    pub async fn login_token(&self) -> String {
        let admin = self.seed_admin("Root Admin", "root@shop.test").await;
        self.token_for(&admin)
    }

    /// Drives one request through the full router and decodes the JSON envelope.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }
}

// --- REQUEST BUILDERS ---

fn authorized(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(method).uri(uri);
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

pub fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
    authorized(method, uri, token).body(Body::empty()).unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    authorized(method, uri, token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

const BOUNDARY: &str = "catalog-test-boundary";

/// MultipartForm
///
/// Builds a `multipart/form-data` body by hand: text fields and file parts in the
/// order they are added.
#[derive(Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn image(self, name: &str, file_name: &str) -> Self {
        self.file(name, file_name, "image/png", b"\x89PNG fake image bytes")
    }

    pub fn into_request(mut self, method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        authorized(method, uri, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}
