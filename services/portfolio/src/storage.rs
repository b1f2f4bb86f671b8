//! Media storage on the local filesystem
//!
//! Uploaded files live in a single directory and are named by the upload
//! time in milliseconds plus the original extension. Two uploads within
//! the same millisecond collide; the second one fails instead of
//! overwriting because files are created exclusively.
//!
//! A file being uploaded is held by a [`PendingUpload`] guard that removes
//! it again unless the upload is committed, so an aborted request or a
//! failed row insert never leaves a stray file behind.

use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// URL prefix under which the media directory is served
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// Media types accepted for upload
pub const ALLOWED_MEDIA_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "video/mp4"];

/// Upload failures
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Unsupported media type: {0}")]
    UnsupportedType(String),

    #[error("File exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Storage error: {0}")]
    Io(#[from] io::Error),
}

fn is_allowed(media_type: &str) -> bool {
    ALLOWED_MEDIA_TYPES.contains(&media_type)
}

/// Resolve the media type of an upload from its file name
///
/// The extension decides the stored type; the declared part content type
/// is only used when the extension is unknown. Both must be on the
/// allow-list when present.
pub fn resolve_media_type(file_name: &str, declared: Option<&str>) -> Result<String, UploadError> {
    let declared = declared.map(|value| {
        value
            .split(';')
            .next()
            .unwrap_or(value)
            .trim()
            .to_ascii_lowercase()
    });

    if let Some(declared) = &declared {
        if !is_allowed(declared) {
            return Err(UploadError::UnsupportedType(declared.clone()));
        }
    }

    let guessed = mime_guess::from_path(file_name)
        .first()
        .map(|mime| mime.essence_str().to_string());

    let resolved = guessed
        .or(declared)
        .ok_or_else(|| UploadError::UnsupportedType("unknown".to_string()))?;

    if !is_allowed(&resolved) {
        return Err(UploadError::UnsupportedType(resolved));
    }

    Ok(resolved)
}

/// Name under which an upload is stored: `<millis><.ext>`
pub fn stored_file_name(timestamp_millis: i64, original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", timestamp_millis, ext),
        None => timestamp_millis.to_string(),
    }
}

/// Filesystem directory holding uploaded media
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    /// Open the media directory, creating it if needed
    pub async fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start writing a new upload for `original_name`, capped at `limit` bytes
    pub async fn begin_upload(&self, original_name: &str, limit: u64) -> io::Result<PendingUpload> {
        let file_name = stored_file_name(Utc::now().timestamp_millis(), original_name);
        let path = self.root.join(&file_name);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        debug!("Started upload {}", path.display());

        Ok(PendingUpload {
            path,
            file_name,
            file,
            written: 0,
            limit,
            committed: false,
        })
    }

    /// Filesystem path for a media URL, if it names a file in this directory
    pub fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(UPLOAD_URL_PREFIX)?.strip_prefix('/')?;
        let file_name = Path::new(name).file_name()?;

        // Reject anything that is not a bare file name
        if file_name != name {
            return None;
        }

        Some(self.root.join(file_name))
    }

    /// Remove the file behind a media URL
    pub async fn remove(&self, url: &str) -> io::Result<()> {
        let path = self.path_for_url(url).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a media URL: {}", url),
            )
        })?;

        fs::remove_file(path).await
    }
}

/// An upload being written to disk
///
/// Dropping it without calling [`PendingUpload::commit`] deletes the file.
#[derive(Debug)]
pub struct PendingUpload {
    path: PathBuf,
    file_name: String,
    file: File,
    written: u64,
    limit: u64,
    committed: bool,
}

impl PendingUpload {
    /// Append a chunk, failing once the size cap would be exceeded
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        let written = self.written + chunk.len() as u64;
        if written > self.limit {
            return Err(UploadError::TooLarge { limit: self.limit });
        }

        self.file.write_all(chunk).await?;
        self.written = written;
        Ok(())
    }

    /// Flush everything written so far to disk
    pub async fn finish(&mut self) -> io::Result<()> {
        self.file.flush().await?;
        self.file.sync_all().await
    }

    /// URL the upload will be served under
    pub fn url(&self) -> String {
        format!("{}/{}", UPLOAD_URL_PREFIX, self.file_name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Keep the file
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PendingUpload {
    fn drop(&mut self) {
        if self.committed {
            return;
        }

        // Drop cannot await; a single unlink is short enough to run inline
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Discarded upload {}", self.path.display()),
            Err(e) => warn!(
                "Failed to discard upload {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
