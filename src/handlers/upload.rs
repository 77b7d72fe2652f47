use std::collections::HashMap;

use axum::{body::Bytes, extract::Multipart};

use crate::{
    error::{AppError, AppResult},
    storage::{MediaFolder, StorageState, media_reference},
};

/// Upper bound on a multipart request carrying images.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// UploadedFile
///
/// One file part of a multipart request, buffered in memory.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// FormPayload
///
/// A fully drained multipart body: text fields by name, file parts in arrival order.
#[derive(Debug, Default)]
pub struct FormPayload {
    fields: HashMap<String, String>,
    files: Vec<UploadedFile>,
}

impl FormPayload {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut payload = FormPayload::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();

            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                // Browsers submit an empty part for a file input left blank.
                if bytes.is_empty() {
                    continue;
                }
                payload.files.push(UploadedFile {
                    field: name,
                    content_type,
                    bytes,
                });
            } else {
                let value = field.text().await?;
                payload.fields.insert(name, value);
            }
        }

        Ok(payload)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Removes and returns every file submitted under `name`, in order.
    pub fn take_files(&mut self, name: &str) -> Vec<UploadedFile> {
        let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.files)
            .into_iter()
            .partition(|file| file.field == name);
        self.files = rest;
        matching
    }
}

/// upload_all
///
/// Uploads files one at a time, in order. The first failure aborts the batch;
/// files already uploaded stay on the media host.
pub async fn upload_all(
    storage: &StorageState,
    folder: MediaFolder,
    files: Vec<UploadedFile>,
) -> AppResult<Vec<String>> {
    let mut urls = Vec::with_capacity(files.len());
    for file in files {
        let url = storage
            .upload(folder, file.bytes, &file.content_type)
            .await
            .map_err(AppError::Storage)?;
        urls.push(url);
    }
    Ok(urls)
}

/// release
///
/// Destroys the media asset behind each URL, sequentially.
pub async fn release(storage: &StorageState, folder: MediaFolder, urls: &[String]) -> AppResult<()> {
    for url in urls {
        let Some(reference) = media_reference(url, folder) else {
            tracing::warn!(%url, "stored media url has no reference; skipping release");
            continue;
        };
        storage.destroy(&reference).await.map_err(AppError::Storage)?;
    }
    Ok(())
}

/// release_committed
///
/// Like [`release`], for records whose deletion is already committed. A media
/// host failure is logged and the request still succeeds; the asset is orphaned.
pub async fn release_committed(storage: &StorageState, folder: MediaFolder, urls: &[String]) {
    if let Err(e) = release(storage, folder, urls).await {
        tracing::warn!(error = %e, ?folder, "media release failed after delete; assets orphaned");
    }
}
