use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use url::Url;

use crate::storage::local::normalize_base_url;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub secret_key: Option<String>,
    pub api_url: Option<Url>,
    pub api_key: Option<String>,
    pub storage_dir: PathBuf,
    pub public_url: String,
    pub signing_key: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let port = match non_empty_var("GALLERY_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("invalid GALLERY_PORT {raw:?}"))?,
            None => {
                info!("GALLERY_PORT not set, using default: {DEFAULT_PORT}");
                DEFAULT_PORT
            }
        };
        let bind_address = format!("0.0.0.0:{port}");
        let api_url = non_empty_var("GALLERY_API_URL")
            .map(|raw| Url::parse(&raw).with_context(|| format!("invalid GALLERY_API_URL {raw:?}")))
            .transpose()?;
        if api_url.is_none() {
            warn!("GALLERY_API_URL not set, keeping image records on local disk");
        }
        let signing_key = non_empty_var("STORAGE_SIGNING_KEY").unwrap_or_else(|| {
            warn!("STORAGE_SIGNING_KEY not set, signed links will not survive a restart");
            uuid::Uuid::new_v4().to_string()
        });

        Ok(Self {
            port,
            secret_key: non_empty_var("SECRET_KEY"),
            api_url,
            api_key: non_empty_var("GALLERY_API_KEY"),
            storage_dir: resolve_storage_dir(),
            public_url: resolve_public_url(&bind_address),
            signing_key,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Prefixes `path` with the secret segment when one is configured.
    pub fn route(&self, path: &str) -> String {
        match self.secret_key.as_deref() {
            Some(value) => format!("/{value}{path}"),
            None => path.to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve_storage_dir() -> PathBuf {
    if let Some(dir) = non_empty_var("STORAGE_DIR") {
        return PathBuf::from(dir);
    }
    let mut base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.push("photo-gallery");
    base
}

fn resolve_public_url(bind_address: &str) -> String {
    if let Some(public_url) = non_empty_var("PUBLIC_URL") {
        return normalize_base_url(&public_url);
    }
    let raw_domain = non_empty_var("DOMAIN").unwrap_or_else(|| bind_address.to_string());
    normalize_base_url(&raw_domain)
}
