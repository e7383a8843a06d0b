//! Local image persistence for listing photos.
//!
//! Uploaded files are written as `<uuid>.<ext>` under the media directory and
//! the listing keeps the returned reference verbatim.

use std::path::{Component, Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Verify that a resolved path stays within the expected base directory.
fn ensure_within(base: &Path, target: &Path) -> Result<PathBuf, ApiError> {
    let canonical_base = base.canonicalize().unwrap_or_else(|_| base.to_path_buf());
    let mut resolved = canonical_base.clone();
    for component in target
        .strip_prefix(base)
        .unwrap_or(target)
        .components()
    {
        match component {
            Component::Normal(c) => resolved.push(c),
            Component::ParentDir => {
                return Err(ApiError::BadRequest("Path traversal detected".to_string()));
            }
            _ => {}
        }
    }
    if !resolved.starts_with(&canonical_base) {
        return Err(ApiError::BadRequest("Path traversal detected".to_string()));
    }
    Ok(resolved)
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    base_path: PathBuf,
    max_size: usize,
}

impl MediaStore {
    pub async fn new(base_path: PathBuf, max_size: usize) -> Result<Self, ApiError> {
        fs::create_dir_all(&base_path).await.map_err(|e| {
            ApiError::MediaStorage(format!(
                "Failed to create media directory '{}': {}",
                base_path.display(),
                e
            ))
        })?;

        info!(path = %base_path.display(), "Media store initialized");

        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Store an uploaded image and return its reference (the stored file
    /// name).  The extension is taken from the client file name and must be
    /// a known image type.
    pub async fn store_image(&self, file_name: &str, data: &[u8]) -> Result<String, ApiError> {
        if data.is_empty() {
            return Err(ApiError::BadRequest("Empty upload".to_string()));
        }
        if data.len() > self.max_size {
            return Err(ApiError::PayloadTooLarge {
                size: data.len(),
                max: self.max_size,
            });
        }

        let ext = image_extension(file_name)?;
        let reference = format!("{}.{ext}", Uuid::new_v4());
        let path = self.safe_path(&reference)?;

        fs::write(&path, data).await.map_err(|e| {
            ApiError::MediaStorage(format!("Failed to write image {reference}: {e}"))
        })?;

        debug!(reference = %reference, size = data.len(), "Stored image");
        Ok(reference)
    }

    pub async fn read_image(&self, reference: &str) -> Result<Vec<u8>, ApiError> {
        let path = self.safe_path(reference)?;

        if !path.exists() {
            return Err(ApiError::NotFound(format!("image {reference}")));
        }

        fs::read(&path)
            .await
            .map_err(|e| ApiError::MediaStorage(format!("Failed to read image {reference}: {e}")))
    }

    fn safe_path(&self, reference: &str) -> Result<PathBuf, ApiError> {
        if reference.is_empty()
            || reference.contains('/')
            || reference.contains('\\')
            || reference.contains("..")
        {
            return Err(ApiError::BadRequest("Path traversal detected".to_string()));
        }
        ensure_within(&self.base_path, &self.base_path.join(reference))
    }
}

/// Lowercased extension of `file_name` if it is an accepted image type.
fn image_extension(file_name: &str) -> Result<String, ApiError> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(ApiError::BadRequest(format!(
            "Unsupported image type {file_name:?} (allowed: {})",
            ALLOWED_EXTENSIONS.join(", ")
        )))
    }
}

/// `Content-Type` for a stored reference.
pub fn content_type(reference: &str) -> &'static str {
    match Path::new(reference).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/jpeg",
    }
}
