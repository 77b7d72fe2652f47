use crate::{
    error::{AppError, AppResult},
    models::{
        Admin, AdminChanges, AdminCredentials, Category, NewAdmin, NewCategory, NewProduct, Photo,
        Product, ProductChanges,
    },
};
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Repository Trait
///
/// Abstract contract for every persistence operation: the admin credential store
/// plus the category, product and photo collections. Handlers only see this
/// trait, so tests can swap in an in-memory implementation.
///
/// Write paths report unique-field collisions as `AppError::Conflict` and
/// dangling foreign references as `AppError::Validation`.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Admins (Credential Store) ---
    async fn count_admins(&self) -> AppResult<i64>;
    async fn find_admin_by_id(&self, id: Uuid) -> AppResult<Option<Admin>>;
    async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<Admin>>;
    /// Opt-in load of the password hash. Only the login path uses this.
    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<AdminCredentials>>;
    async fn list_admins(&self) -> AppResult<Vec<Admin>>;
    async fn list_admins_created_by(&self, creator_id: Uuid) -> AppResult<Vec<Admin>>;
    async fn create_admin(&self, admin: NewAdmin) -> AppResult<Admin>;
    async fn update_admin(&self, id: Uuid, changes: AdminChanges) -> AppResult<Option<Admin>>;
    async fn delete_admin(&self, id: Uuid) -> AppResult<Option<Admin>>;
    async fn set_admin_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<Admin>>;

    // --- Categories ---
    async fn list_categories(&self) -> AppResult<Vec<Category>>;
    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>>;
    async fn create_category(&self, category: NewCategory) -> AppResult<Category>;
    async fn rename_category(&self, id: Uuid, name: &str) -> AppResult<Option<Category>>;
    async fn delete_category(&self, id: Uuid) -> AppResult<Option<Category>>;
    async fn count_products_in_category(&self, id: Uuid) -> AppResult<i64>;

    // --- Products ---
    async fn list_products(&self) -> AppResult<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;
    async fn create_product(&self, product: NewProduct) -> AppResult<Product>;
    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>>;
    async fn delete_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    // --- Photos ---
    async fn list_photos(&self) -> AppResult<Vec<Photo>>;
    async fn get_photo(&self, id: Uuid) -> AppResult<Option<Photo>>;
    async fn create_photo(&self, images: Vec<String>) -> AppResult<Photo>;
    /// Replaces the whole image array, preserving the given order.
    async fn set_photo_images(&self, id: Uuid, images: Vec<String>) -> AppResult<Option<Photo>>;
    async fn delete_photo(&self, id: Uuid) -> AppResult<Option<Photo>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// map_write_error
///
/// Translates constraint violations into client errors; everything else stays a
/// database failure.
fn map_write_error(e: sqlx::Error, conflict: &str, foreign_key: &str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(conflict.to_string());
        }
        if db.is_foreign_key_violation() {
            return AppError::Validation(foreign_key.to_string());
        }
    }
    AppError::Database(e)
}

macro_rules! admin_columns {
    () => {
        "id, full_name, email, created_by_id, created_by_name, created_by_email, is_active, created_at, updated_at"
    };
}

macro_rules! category_columns {
    () => {
        "id, category_name, created_by_id, created_by_name, created_by_email, is_active, created_at, updated_at"
    };
}

// Product rows are always read joined with their category's live name.
macro_rules! product_projection {
    ($alias:literal) => {
        concat!(
            "SELECT ", $alias, ".id, ", $alias, ".product_image, ", $alias, ".product_name, ",
            $alias, ".description, ", $alias, ".category_id, c.category_name, ",
            $alias, ".created_by_id, ", $alias, ".created_by_name, ", $alias, ".created_by_email, ",
            $alias, ".is_active, ", $alias, ".created_at, ", $alias, ".updated_at ",
            "FROM ", $alias, " LEFT JOIN categories c ON c.id = ", $alias, ".category_id"
        )
    };
}

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- ADMINS ---

    async fn count_admins(&self) -> AppResult<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admins")
            .fetch_one(&self.pool)
            .await?)
    }

    async fn find_admin_by_id(&self, id: Uuid) -> AppResult<Option<Admin>> {
        Ok(
            sqlx::query_as::<_, Admin>(concat!("SELECT ", admin_columns!(), " FROM admins WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_admin_by_email(&self, email: &str) -> AppResult<Option<Admin>> {
        Ok(
            sqlx::query_as::<_, Admin>(concat!("SELECT ", admin_columns!(), " FROM admins WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_credentials_by_email(&self, email: &str) -> AppResult<Option<AdminCredentials>> {
        Ok(sqlx::query_as::<_, AdminCredentials>(concat!(
            "SELECT ",
            admin_columns!(),
            ", password_hash FROM admins WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_admins(&self) -> AppResult<Vec<Admin>> {
        Ok(sqlx::query_as::<_, Admin>(concat!(
            "SELECT ",
            admin_columns!(),
            " FROM admins ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_admins_created_by(&self, creator_id: Uuid) -> AppResult<Vec<Admin>> {
        Ok(sqlx::query_as::<_, Admin>(concat!(
            "SELECT ",
            admin_columns!(),
            " FROM admins WHERE created_by_id = $1 ORDER BY created_at DESC"
        ))
        .bind(creator_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// create_admin
    ///
    /// The unique index on `email` is the final arbiter of duplicates; a lost race
    /// against a concurrent registration surfaces as `Conflict`.
    async fn create_admin(&self, admin: NewAdmin) -> AppResult<Admin> {
        sqlx::query_as::<_, Admin>(concat!(
            "INSERT INTO admins (id, full_name, email, password_hash, created_by_id, created_by_name, created_by_email) ",
            "VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING ",
            admin_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(admin.full_name)
        .bind(admin.email)
        .bind(admin.password_hash)
        .bind(admin.created_by.id)
        .bind(admin.created_by.name)
        .bind(admin.created_by.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Email already registered", "Invalid creator"))
    }

    /// update_admin
    ///
    /// Partial update via COALESCE: only columns with a `Some` value change.
    async fn update_admin(&self, id: Uuid, changes: AdminChanges) -> AppResult<Option<Admin>> {
        sqlx::query_as::<_, Admin>(concat!(
            "UPDATE admins SET full_name = COALESCE($2, full_name), ",
            "email = COALESCE($3, email), ",
            "password_hash = COALESCE($4, password_hash), ",
            "updated_at = NOW() WHERE id = $1 RETURNING ",
            admin_columns!()
        ))
        .bind(id)
        .bind(changes.full_name)
        .bind(changes.email)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Email already in use", "Invalid admin"))
    }

    async fn delete_admin(&self, id: Uuid) -> AppResult<Option<Admin>> {
        Ok(sqlx::query_as::<_, Admin>(concat!(
            "DELETE FROM admins WHERE id = $1 RETURNING ",
            admin_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set_admin_active(&self, id: Uuid, is_active: bool) -> AppResult<Option<Admin>> {
        Ok(sqlx::query_as::<_, Admin>(concat!(
            "UPDATE admins SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING ",
            admin_columns!()
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?)
    }

    // --- CATEGORIES ---

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(sqlx::query_as::<_, Category>(concat!(
            "SELECT ",
            category_columns!(),
            " FROM categories ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(concat!(
            "SELECT ",
            category_columns!(),
            " FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_category_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        Ok(sqlx::query_as::<_, Category>(concat!(
            "SELECT ",
            category_columns!(),
            " FROM categories WHERE category_name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_category(&self, category: NewCategory) -> AppResult<Category> {
        sqlx::query_as::<_, Category>(concat!(
            "INSERT INTO categories (id, category_name, created_by_id, created_by_name, created_by_email) ",
            "VALUES ($1, $2, $3, $4, $5) RETURNING ",
            category_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(category.category_name)
        .bind(category.created_by.id)
        .bind(category.created_by.name)
        .bind(category.created_by.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Category already exists", "Invalid category"))
    }

    async fn rename_category(&self, id: Uuid, name: &str) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(concat!(
            "UPDATE categories SET category_name = $2, updated_at = NOW() WHERE id = $1 RETURNING ",
            category_columns!()
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Category already exists", "Invalid category"))
    }

    /// delete_category
    ///
    /// The `ON DELETE RESTRICT` foreign key on `products.category_id` turns a
    /// delete of a still-referenced category into a validation error.
    async fn delete_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        sqlx::query_as::<_, Category>(concat!(
            "DELETE FROM categories WHERE id = $1 RETURNING ",
            category_columns!()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "Category already exists",
                "Category is still referenced by products",
            )
        })
    }

    async fn count_products_in_category(&self, id: Uuid) -> AppResult<i64> {
        Ok(
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products WHERE category_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?,
        )
    }

    // --- PRODUCTS ---

    async fn list_products(&self) -> AppResult<Vec<Product>> {
        Ok(sqlx::query_as::<_, Product>(concat!(
            product_projection!("products"),
            " ORDER BY products.created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>(concat!(
            product_projection!("products"),
            " WHERE products.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// create_product
    ///
    /// Inserts and joins the category name in one statement (CTE). The category
    /// existence check done by the handler is not atomic with this insert; the
    /// foreign key catches a category deleted in between.
    async fn create_product(&self, product: NewProduct) -> AppResult<Product> {
        sqlx::query_as::<_, Product>(concat!(
            "WITH inserted AS (",
            "INSERT INTO products (id, product_image, product_name, description, category_id, ",
            "created_by_id, created_by_name, created_by_email) ",
            "VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *) ",
            product_projection!("inserted")
        ))
        .bind(Uuid::new_v4())
        .bind(product.product_image)
        .bind(product.product_name)
        .bind(product.description)
        .bind(product.category_id)
        .bind(product.created_by.id)
        .bind(product.created_by.name)
        .bind(product.created_by.email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Product already exists", "Invalid category"))
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        sqlx::query_as::<_, Product>(concat!(
            "WITH updated AS (",
            "UPDATE products SET product_image = COALESCE($2, product_image), ",
            "product_name = COALESCE($3, product_name), ",
            "description = COALESCE($4, description), ",
            "category_id = COALESCE($5, category_id), ",
            "updated_at = NOW() WHERE id = $1 RETURNING *) ",
            product_projection!("updated")
        ))
        .bind(id)
        .bind(changes.product_image)
        .bind(changes.product_name)
        .bind(changes.description)
        .bind(changes.category_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Product already exists", "Invalid category"))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        Ok(sqlx::query_as::<_, Product>(concat!(
            "WITH deleted AS (DELETE FROM products WHERE id = $1 RETURNING *) ",
            product_projection!("deleted")
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    // --- PHOTOS ---

    async fn list_photos(&self) -> AppResult<Vec<Photo>> {
        Ok(sqlx::query_as::<_, Photo>(
            "SELECT id, images, created_at, updated_at FROM photos ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_photo(&self, id: Uuid) -> AppResult<Option<Photo>> {
        Ok(sqlx::query_as::<_, Photo>(
            "SELECT id, images, created_at, updated_at FROM photos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_photo(&self, images: Vec<String>) -> AppResult<Photo> {
        Ok(sqlx::query_as::<_, Photo>(
            "INSERT INTO photos (id, images) VALUES ($1, $2) RETURNING id, images, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(images)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn set_photo_images(&self, id: Uuid, images: Vec<String>) -> AppResult<Option<Photo>> {
        Ok(sqlx::query_as::<_, Photo>(
            "UPDATE photos SET images = $2, updated_at = NOW() WHERE id = $1 RETURNING id, images, created_at, updated_at",
        )
        .bind(id)
        .bind(images)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_photo(&self, id: Uuid) -> AppResult<Option<Photo>> {
        Ok(sqlx::query_as::<_, Photo>(
            "DELETE FROM photos WHERE id = $1 RETURNING id, images, created_at, updated_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }
}
