use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::{fs, sync::Mutex};
use tracing::debug;

use crate::api::ImageApi;
use crate::error::{GalleryError, Result};
use crate::model::{CreateImageInput, Image, ImageConnection, ListImagesParams, UpdateImageInput};

const RECORDS_FILE: &str = "images.json";

/// Development stand-in for the managed API: records in one JSON file.
///
/// Timestamps are assigned here the way the managed backend assigns them, and
/// `nextToken` is an opaque offset into the insertion order.
#[derive(Debug)]
pub struct LocalImageApi {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalImageApi {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join(RECORDS_FILE),
            write_lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Vec<Image>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, images: &[Image]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let payload = serde_json::to_vec_pretty(images)?;
        fs::write(&self.path, payload).await?;
        Ok(())
    }
}

fn parse_next_token(token: Option<&str>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| GalleryError::InvalidInput(format!("bad nextToken {raw:?}"))),
    }
}

impl ImageApi for LocalImageApi {
    async fn list_images(&self, params: ListImagesParams) -> Result<ImageConnection> {
        let images = self.load().await?;
        let start = parse_next_token(params.next_token.as_deref())?;
        let matching: Vec<Image> = images
            .into_iter()
            .filter(|image| {
                params
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(image))
            })
            .collect();
        let start = start.min(matching.len());
        let end = match params.limit {
            Some(limit) => start.saturating_add(limit as usize).min(matching.len()),
            None => matching.len(),
        };
        let items = matching[start..end].to_vec();
        let next_token = (end < matching.len()).then(|| end.to_string());
        Ok(ImageConnection { items, next_token })
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        let images = self.load().await?;
        Ok(images.into_iter().find(|image| image.id == id))
    }

    async fn create_image(&self, input: CreateImageInput) -> Result<Image> {
        let _guard = self.write_lock.lock().await;
        let mut images = self.load().await?;
        if images.iter().any(|image| image.id == input.id) {
            return Err(GalleryError::Duplicate(input.id));
        }
        let now = Utc::now().to_rfc3339();
        let image = Image {
            id: input.id,
            location: input.location,
            photographer: input.photographer,
            file_path: input.file_path,
            likes: input.likes,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };
        images.push(image.clone());
        self.save(&images).await?;
        debug!(id = %image.id, "created image record");
        Ok(image)
    }

    async fn update_image(&self, input: UpdateImageInput) -> Result<Image> {
        let _guard = self.write_lock.lock().await;
        let mut images = self.load().await?;
        let image = images
            .iter_mut()
            .find(|image| image.id == input.id)
            .ok_or_else(|| GalleryError::NotFound(input.id.clone()))?;
        image.location = input.location;
        image.photographer = input.photographer;
        image.file_path = input.file_path;
        image.likes = input.likes;
        image.updated_at = Some(Utc::now().to_rfc3339());
        let updated = image.clone();
        self.save(&images).await?;
        Ok(updated)
    }
}
