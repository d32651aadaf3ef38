use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use tokio::fs;
use tracing::debug;
use url::Url;

use crate::error::{GalleryError, Result};
use crate::storage::{ObjectStorage, StoredObject, sign_object_key};

const PUBLIC_PREFIX: &str = "public";
const OBJECTS_ROUTE: &str = "objects";

/// Object storage on the local filesystem. Objects are served back by the web
/// surface under `/objects/<key>` once a signed link checks out.
#[derive(Clone, Debug)]
pub struct LocalObjectStorage {
    base_dir: PathBuf,
    base_url: String,
    signing_key: String,
}

impl LocalObjectStorage {
    pub fn new(base_dir: PathBuf, base_url: String, signing_key: String) -> Self {
        Self {
            base_dir,
            base_url: normalize_base_url(&base_url),
            signing_key,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve_path(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve_path(key)?;
        match fs::metadata(path).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Link to `key` valid until the unix timestamp `expires_at`.
    pub fn signed_url_at(&self, key: &str, expires_at: i64) -> Result<String> {
        let key = normalize_key(key)?;
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| GalleryError::InvalidInput(format!("base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| GalleryError::InvalidInput(format!("base url {} cannot hold paths", self.base_url)))?
            .pop_if_empty()
            .push(OBJECTS_ROUTE)
            .extend(key.split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires_at.to_string())
            .append_pair("signature", &sign_object_key(&self.signing_key, &key, expires_at));
        Ok(url.to_string())
    }

    /// True when `signature` was issued for `key` and `expires_at` is not yet past.
    pub fn verify(&self, key: &str, expires_at: i64, signature: &str, now: i64) -> bool {
        let Ok(key) = normalize_key(key) else {
            return false;
        };
        if now > expires_at {
            return false;
        }
        let expected = sign_object_key(&self.signing_key, &key, expires_at);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    pub fn resolve_path(&self, key: &str) -> Result<PathBuf> {
        let key = normalize_key(key)?;
        Ok(self.base_dir.join(PUBLIC_PREFIX).join(Path::new(&key)))
    }
}

impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<StoredObject> {
        let key = normalize_key(key)?;
        let path = self.base_dir.join(PUBLIC_PREFIX).join(Path::new(&key));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        debug!(key = %key, size = data.len(), "stored object");
        Ok(StoredObject { key })
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        let expires_at = Utc::now().timestamp() + expires_in.as_secs() as i64;
        self.signed_url_at(key, expires_at)
    }
}

/// Strips leading slashes and refuses keys that would escape the store.
pub fn normalize_key(key: &str) -> Result<String> {
    let normalized = key.trim_start_matches('/');
    let escapes = normalized
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if normalized.is_empty() || escapes || normalized.contains('\\') {
        return Err(GalleryError::InvalidKey(key.to_string()));
    }
    Ok(normalized.to_string())
}

pub fn normalize_base_url(raw: &str) -> String {
    let mut trimmed = raw.trim().trim_end_matches('/').to_string();
    while trimmed.starts_with("http://http://") {
        trimmed = trimmed.replacen("http://http://", "http://", 1);
    }
    while trimmed.starts_with("https://https://") {
        trimmed = trimmed.replacen("https://https://", "https://", 1);
    }
    while trimmed.starts_with("http://https://") {
        trimmed = trimmed.replacen("http://https://", "https://", 1);
    }
    while trimmed.starts_with("https://http://") {
        trimmed = trimmed.replacen("https://http://", "http://", 1);
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed
    } else {
        format!("http://{trimmed}")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
