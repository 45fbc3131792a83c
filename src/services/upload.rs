//! Content-addressed image uploads.
//!
//! ARCHITECTURE
//! ============
//! An upload's file name is the SHA-256 of its bytes plus the original
//! extension, so identical images (decor assets reused by many users, a
//! photo uploaded twice) map to one stored object and one URL.
//!
//! TRADE-OFFS
//! ==========
//! `FsBlobStore` opens with `create_new`, so the existence check and the
//! write are a single filesystem operation. Concurrent identical uploads
//! race on the open; exactly one writes and the rest see `AlreadyExists`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;

pub const MAX_UPLOAD_BYTES: usize = 30 * 1024 * 1024;
const MAX_EXTENSION_LEN: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    Empty,
    #[error("Only image files are allowed")]
    UnsupportedMediaType,
    #[error("File exceeds the {} MB limit", MAX_UPLOAD_BYTES / (1024 * 1024))]
    TooLarge,
    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// BLOB STORE
// =============================================================================

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `name` unless an object with that name exists.
    /// Returns `true` when this call wrote the object.
    async fn put_if_absent(&self, name: &str, bytes: &[u8]) -> Result<bool, UploadError>;
}

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put_if_absent(&self, name: &str, bytes: &[u8]) -> Result<bool, UploadError> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(name);

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            // Leave no truncated object behind for the next upload to trust.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e.into());
        }
        Ok(true)
    }
}

// =============================================================================
// UPLOAD SERVICE
// =============================================================================

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub file_name: String,
    pub url: String,
    /// `false` when identical bytes were already stored.
    pub newly_stored: bool,
}

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn BlobStore>,
    public_base_url: String,
}

impl UploadService {
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, public_base_url: impl Into<String>) -> Self {
        Self { store, public_base_url: public_base_url.into() }
    }

    /// Validate and store an uploaded image, returning its stable URL.
    ///
    /// # Errors
    ///
    /// Rejects empty bodies, non-image content types, and files over
    /// [`MAX_UPLOAD_BYTES`]; storage failures surface as [`UploadError::Io`].
    pub async fn upload(
        &self,
        bytes: &[u8],
        original_name: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<StoredUpload, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::Empty);
        }
        if !is_image_mime(content_type) {
            return Err(UploadError::UnsupportedMediaType);
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge);
        }

        let file_name = content_file_name(bytes, original_name);
        let newly_stored = self.store.put_if_absent(&file_name, bytes).await?;
        if newly_stored {
            tracing::info!(%file_name, size = bytes.len(), "stored upload");
        } else {
            tracing::debug!(%file_name, "upload deduplicated");
        }

        let url = format!("{}/uploads/{file_name}", self.public_base_url);
        Ok(StoredUpload { file_name, url, newly_stored })
    }
}

fn is_image_mime(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim().to_ascii_lowercase())
        .is_some_and(|ct| ct.starts_with("image/") && ct.len() > "image/".len())
}

/// `hex(sha256(bytes))` plus the sanitized extension of `original_name`.
#[must_use]
pub fn content_file_name(bytes: &[u8], original_name: Option<&str>) -> String {
    let digest = Sha256::digest(bytes);
    let hash = bytes_to_hex(&digest);
    match original_name.and_then(sanitized_extension) {
        Some(ext) => format!("{hash}.{ext}"),
        None => hash,
    }
}

fn sanitized_extension(name: &str) -> Option<String> {
    let ext = Path::new(name).extension()?.to_str()?.to_ascii_lowercase();
    if ext.is_empty() || ext.len() > MAX_EXTENSION_LEN || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
