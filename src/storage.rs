use async_trait::async_trait;
use aws_sdk_s3 as s3;
use axum::body::Bytes;
use s3::{error::DisplayErrorContext, primitives::ByteStream};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// MediaFolder
///
/// Top-level prefix under which an asset is stored on the media host. The folder
/// is part of both the public URL and the deletion reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    Products,
    Photo,
}

impl MediaFolder {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaFolder::Products => "products",
            MediaFolder::Photo => "photo",
        }
    }
}

// 1. StorageService Contract
/// StorageService
///
/// The media host as seen by the handlers: binary payloads go in, public URLs
/// come out, and assets are released by a reference derived from their URL.
/// The S3 client serves production; `MockStorageService` stands in during tests.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the configured bucket if missing. Only called for `Env::Local`.
    async fn ensure_bucket_exists(&self);

    /// Stores `bytes` under `folder` and returns the asset's public URL.
    async fn upload(
        &self,
        folder: MediaFolder,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, String>;

    /// Deletes the asset identified by `reference` (see [`media_reference`]).
    async fn destroy(&self, reference: &str) -> Result<(), String>;
}

/// media_reference
///
/// Derives the deletion reference from a stored URL: the folder followed by the
/// last path segment cut at its first `.`, e.g.
/// `https://host/bucket/photo/3f2a.jpg` → `photo/3f2a`.
/// Returns `None` when the URL has no usable final segment.
pub fn media_reference(url: &str, folder: MediaFolder) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last_segment = path.rsplit('/').next()?;
    let stem = last_segment.split('.').next()?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{}/{}", folder.as_str(), stem))
}

// 2. The Real Implementation (S3/MinIO)
/// S3StorageClient
///
/// Media host backed by any S3-compatible store. Objects are written under
/// `<folder>/<uuid>` with no extension, so the reference derived from the public
/// URL is exactly the object key.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_base_url: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_base_url: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            // Path-style addressing (http://endpoint/bucket/key) is required by MinIO.
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            // Already-exists comes back as an error too.
            tracing::debug!(error = %DisplayErrorContext(&e), "create_bucket skipped");
        }
    }

    async fn upload(
        &self,
        folder: MediaFolder,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, String> {
        let key = format!("{}/{}", folder.as_str(), Uuid::new_v4().simple());

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| DisplayErrorContext(&e).to_string())?;

        tracing::info!(%key, "media uploaded");
        Ok(self.public_url(&key))
    }

    async fn destroy(&self, reference: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(reference)
            .send()
            .await
            .map_err(|e| DisplayErrorContext(&e).to_string())?;

        tracing::info!(%reference, "media destroyed");
        Ok(())
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory media host. Records every uploaded URL and every destroyed
/// reference so tests can assert on the calls the handlers made.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every upload and destroy fails.
    pub should_fail: bool,
    /// When set, uploads succeed this many times and then fail.
    pub fail_after_uploads: Option<usize>,
    /// When true, uploads succeed but every destroy fails.
    pub fail_destroys: bool,
    uploads: Arc<Mutex<Vec<String>>>,
    destroyed: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn failing_after(uploads: usize) -> Self {
        Self {
            fail_after_uploads: Some(uploads),
            ..Self::default()
        }
    }

    pub fn failing_destroys() -> Self {
        Self {
            fail_destroys: true,
            ..Self::default()
        }
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploads.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn destroyed(&self) -> Vec<String> {
        self.destroyed.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "bin",
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn upload(
        &self,
        folder: MediaFolder,
        _bytes: Bytes,
        content_type: &str,
    ) -> Result<String, String> {
        let mut uploads = self.uploads.lock().unwrap_or_else(|e| e.into_inner());
        let exhausted = self
            .fail_after_uploads
            .is_some_and(|limit| uploads.len() >= limit);
        if self.should_fail || exhausted {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }

        // Deterministic host, unique id, extension like a real CDN URL.
        let url = format!(
            "https://media.mock/{}/{}.{}",
            folder.as_str(),
            Uuid::new_v4().simple(),
            extension_for(content_type)
        );
        uploads.push(url.clone());
        Ok(url)
    }

    async fn destroy(&self, reference: &str) -> Result<(), String> {
        if self.should_fail || self.fail_destroys {
            return Err("Mock Storage Error: Simulation requested".to_string());
        }
        self.destroyed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(reference.to_string());
        Ok(())
    }
}

/// StorageState
///
/// The concrete type used to share the media host across the application state.
pub type StorageState = Arc<dyn StorageService>;
