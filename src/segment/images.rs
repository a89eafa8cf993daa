//! Content-addressed storage for inline images.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use md5::{Digest, Md5};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

static DATA_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/([^;,]+);base64,(.*)$").expect("valid data URL regex"));

/// Writes decoded images into a directory under the hash of their bytes.
///
/// The same bytes always map to the same file, so writers in different
/// threads or processes may store the same image concurrently.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at `dir`. Nothing is created until the first
    /// image is written.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory images are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode a `data:image/<ext>;base64,<data>` URL and persist it.
    ///
    /// Returns the path of the stored file. Malformed URLs, bad base64 and
    /// write failures are [`Error::ImageDecode`]; failing to create the
    /// directory is [`Error::ImageStore`].
    pub fn store_data_url(&self, src: &str) -> Result<PathBuf> {
        let (ext, bytes) = decode_data_url(src)?;
        self.store(&bytes, &ext)
    }

    /// Persist raw image bytes with the given extension.
    pub fn store(&self, bytes: &[u8], ext: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|source| Error::ImageStore {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(format!("{}.{}", content_hash(bytes), ext));
        fs::write(&path, bytes)
            .map_err(|e| Error::ImageDecode(format!("{}: {}", path.display(), e)))?;

        log::debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Split a data URL into its file extension and decoded bytes.
///
/// The extension is the last `/`-separated part of the image subtype.
pub fn decode_data_url(src: &str) -> Result<(String, Vec<u8>)> {
    let captures = DATA_URL
        .captures(src.trim())
        .ok_or_else(|| Error::ImageDecode("not a base64 image data URL".to_string()))?;

    let ext = captures[1].rsplit('/').next().unwrap_or_default().to_string();
    if ext.is_empty() {
        return Err(Error::ImageDecode("data URL has no image type".to_string()));
    }

    let bytes = STANDARD.decode(captures[2].trim())?;
    Ok((ext, bytes))
}

/// Lowercase hex MD5 of the bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    Md5::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
