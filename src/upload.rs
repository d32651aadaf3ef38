use tracing::{info, warn};
use uuid::Uuid;

use crate::api::ImageApi;
use crate::model::{CreateImageInput, Image};
use crate::storage::{ObjectStorage, extension_from_filename};

/// A file picked in the upload form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The "add image" form: two free-text fields and an optional file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub location: String,
    pub photographer: String,
    pub file: Option<SelectedFile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Created(Image),
    NoFile,
    Failed,
}

/// Random object name that keeps the original file's extension.
pub fn random_file_name(original: &str) -> String {
    let stem = Uuid::new_v4();
    match extension_from_filename(original) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem.to_string(),
    }
}

impl UploadForm {
    pub fn new(location: impl Into<String>, photographer: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            photographer: photographer.into(),
            file: None,
        }
    }

    pub fn with_file(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.file = Some(SelectedFile {
            name: name.into(),
            bytes,
        });
        self
    }

    /// Stores the file, then records it with zero likes.
    ///
    /// Failures are logged and reported as [`UploadOutcome::Failed`]; an object
    /// stored before a failed `createImage` is left in place.
    pub async fn submit<A, S>(&self, api: &A, storage: &S) -> UploadOutcome
    where
        A: ImageApi,
        S: ObjectStorage,
    {
        let Some(file) = &self.file else {
            info!("upload submitted without a file, nothing to store");
            return UploadOutcome::NoFile;
        };
        let file_name = random_file_name(&file.name);
        let stored = match storage.put(&file_name, &file.bytes).await {
            Ok(stored) => stored,
            Err(err) => {
                warn!(error = %err, file = %file.name, "Uploading Image Error");
                return UploadOutcome::Failed;
            }
        };
        let input = CreateImageInput {
            id: Uuid::new_v4().to_string(),
            location: self.location.clone(),
            photographer: self.photographer.clone(),
            file_path: stored.key,
            likes: 0,
        };
        match api.create_image(input).await {
            Ok(image) => {
                info!(id = %image.id, key = %image.file_path, "image uploaded");
                UploadOutcome::Created(image)
            }
            Err(err) => {
                warn!(error = %err, "Creating Image Error");
                UploadOutcome::Failed
            }
        }
    }
}
