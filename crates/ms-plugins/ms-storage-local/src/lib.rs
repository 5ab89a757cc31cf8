//! # ms-storage-local
//! mediashare/crates/ms-plugins/ms-storage-local/src/lib.rs
//! Local filesystem implementation of `MediaStore`.
//! Features: Content-addressable storage, directory sharding, and thumbnailing.

use async_trait::async_trait;
use image::ImageReader;
use ms_core::error::{AppError, Result};
use ms_core::traits::MediaStore;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Longest edge of a generated thumbnail, in pixels.
pub const THUMBNAIL_SIZE: u32 = 250;

pub struct LocalMediaStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Public URL prefix (e.g., "/static/uploads")
    url_prefix: String,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self {
            root_path: root,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Generates a sharded path: "ab/cd/ef...hash"
    fn get_sharded_path(&self, hash: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(hash);
        path
    }

    fn thumbnail_path(&self, hash: &str) -> PathBuf {
        let mut path = self.root_path.clone();
        path.push(&hash[0..2]);
        path.push(&hash[2..4]);
        path.push(format!("thumb_{hash}.webp"));
        path
    }
}

fn io_err(e: std::io::Error) -> AppError {
    log::error!("media store i/o error: {e}");
    AppError::Internal(format!("media storage failure: {e}"))
}

/// Keys are lowercase SHA-256 hex digests; anything else is never one of ours.
fn is_key(key: &str) -> bool {
    key.len() == 64 && key.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    /// Saves an upload using its SHA-256 hash as the filename.
    /// This automatically deduplicates files.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> Result<String> {
        // 1. Calculate Hash
        let hash = format!("{:x}", Sha256::digest(&data));

        let target_path = self.get_sharded_path(&hash);
        if let Some(parent) = target_path.parent() {
            // 2. Ensure directory exists
            fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        // 3. Save Original (if not exists)
        if fs::try_exists(&target_path).await.map_err(io_err)? {
            log::debug!("upload {hash} already stored");
            return Ok(hash);
        }
        fs::write(&target_path, &data).await.map_err(io_err)?;

        // 4. Thumbnail photos; a file we cannot decode is still a valid upload.
        if content_type.starts_with("image/") {
            let thumb_path = self.thumbnail_path(&hash);
            if let Err(e) = generate_thumbnail(data, thumb_path).await {
                log::warn!("no thumbnail for {hash}: {e}");
            }
        }

        log::info!("stored upload {hash} ({content_type})");
        Ok(hash)
    }

    fn get_url(&self, key: &str) -> String {
        if !is_key(key) {
            return format!("{}/{}", self.url_prefix, key);
        }
        format!("{}/{}/{}/{}", self.url_prefix, &key[0..2], &key[2..4], key)
    }

    fn get_thumbnail_url(&self, key: &str, content_type: &str) -> Option<String> {
        if !is_key(key) || !content_type.starts_with("image/") {
            return None;
        }
        Some(format!(
            "{}/{}/{}/thumb_{}.webp",
            self.url_prefix,
            &key[0..2],
            &key[2..4],
            key
        ))
    }
}

/// Decodes and downsizes on the blocking pool; image work would stall the reactor.
async fn generate_thumbnail(data: Vec<u8>, thumb_path: PathBuf) -> Result<()> {
    tokio::task::spawn_blocking(move || -> std::result::Result<(), image::ImageError> {
        let img = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .decode()?;
        img.thumbnail(THUMBNAIL_SIZE, THUMBNAIL_SIZE)
            .save_with_format(thumb_path, image::ImageFormat::WebP)
    })
    .await
    .map_err(|e| AppError::Internal(format!("thumbnail task failed: {e}")))?
    .map_err(|e| AppError::Internal(format!("thumbnail failed: {e}")))
}
