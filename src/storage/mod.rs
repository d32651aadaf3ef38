pub mod hash;
pub mod local;

use std::future::Future;
use std::time::Duration;

pub use hash::{compute_hash, sign_object_key};
pub use local::LocalObjectStorage;

use crate::error::Result;

/// Lifetime of the links handed out when an image is opened.
pub const SIGNED_URL_EXPIRY: Duration = Duration::from_secs(60);

/// What `put` reports back: the key the object ended up under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
}

/// Object storage as the gallery uses it: raw uploads plus time-limited links.
pub trait ObjectStorage: Send + Sync {
    fn put(&self, key: &str, data: &[u8]) -> impl Future<Output = Result<StoredObject>> + Send;

    fn signed_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> impl Future<Output = Result<String>> + Send;
}

pub fn get_mime_type_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Extension of `file_name` as written. Only ASCII letters and digits count,
/// so the result is always safe to append to an object key.
pub fn extension_from_filename(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let ext = ext.trim();
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_string())
}

/// Sniffs the stored bytes first, then falls back to the key's extension.
pub fn content_type_for(key: &str, bytes: &[u8]) -> &'static str {
    if let Ok(format) = image::guess_format(bytes) {
        return format.to_mime_type();
    }
    extension_from_filename(key)
        .map(|ext| get_mime_type_from_extension(&ext))
        .unwrap_or("application/octet-stream")
}
