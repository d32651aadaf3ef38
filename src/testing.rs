//! In-memory fakes of the remote API and object storage for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::api::ImageApi;
use crate::error::{GalleryError, Result};
use crate::model::{CreateImageInput, Image, ImageConnection, ListImagesParams, UpdateImageInput};
use crate::storage::{ObjectStorage, StoredObject};

pub const SERVER_TIMESTAMP: &str = "2024-06-01T12:00:00.000Z";

pub fn image(id: &str, likes: u32) -> Image {
    Image {
        id: id.to_string(),
        location: format!("{id} location"),
        photographer: format!("{id} photographer"),
        file_path: format!("{id}.jpg"),
        likes,
        created_at: Some(SERVER_TIMESTAMP.to_string()),
        updated_at: Some(SERVER_TIMESTAMP.to_string()),
    }
}

fn offline() -> GalleryError {
    GalleryError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "backend offline",
    ))
}

#[derive(Default)]
pub struct FakeApi {
    pub images: Mutex<Vec<Image>>,
    pub creates: Mutex<Vec<CreateImageInput>>,
    pub updates: Mutex<Vec<UpdateImageInput>>,
    pub fail_list: AtomicBool,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub update_gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeApi {
    pub fn with_images(images: Vec<Image>) -> Self {
        Self {
            images: Mutex::new(images),
            ..Self::default()
        }
    }

    pub fn fail_list(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_update(&self, fail: bool) {
        self.fail_update.store(fail, Ordering::SeqCst);
    }

    /// Holds every `update_image` after it is recorded until the returned
    /// gate is notified once per call.
    pub fn gate_updates(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.update_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

impl ImageApi for FakeApi {
    async fn list_images(&self, _params: ListImagesParams) -> Result<ImageConnection> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(offline());
        }
        Ok(ImageConnection {
            items: self.images.lock().unwrap().clone(),
            next_token: None,
        })
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        let images = self.images.lock().unwrap();
        Ok(images.iter().find(|image| image.id == id).cloned())
    }

    async fn create_image(&self, input: CreateImageInput) -> Result<Image> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.creates.lock().unwrap().push(input.clone());
        let image = Image {
            id: input.id,
            location: input.location,
            photographer: input.photographer,
            file_path: input.file_path,
            likes: input.likes,
            created_at: Some(SERVER_TIMESTAMP.to_string()),
            updated_at: Some(SERVER_TIMESTAMP.to_string()),
        };
        self.images.lock().unwrap().push(image.clone());
        Ok(image)
    }

    async fn update_image(&self, input: UpdateImageInput) -> Result<Image> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.updates.lock().unwrap().push(input.clone());
        let gate = self.update_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let mut images = self.images.lock().unwrap();
        let image = images
            .iter_mut()
            .find(|image| image.id == input.id)
            .ok_or_else(|| GalleryError::NotFound(input.id.clone()))?;
        image.location = input.location;
        image.photographer = input.photographer;
        image.file_path = input.file_path;
        image.likes = input.likes;
        image.updated_at = Some("2024-06-02T08:30:00.000Z".to_string());
        Ok(image.clone())
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub objects: Mutex<Vec<(String, Vec<u8>)>>,
    pub signed: Mutex<Vec<(String, Duration)>>,
    pub fail_put: AtomicBool,
    pub fail_sign: AtomicBool,
    pub sign_gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl FakeStorage {
    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_sign(&self, fail: bool) {
        self.fail_sign.store(fail, Ordering::SeqCst);
    }

    /// Holds `signed_url` for `key` after it is recorded until the gate is notified.
    pub fn gate_signing(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.sign_gates
            .lock()
            .unwrap()
            .insert(key.to_string(), gate.clone());
        gate
    }
}

impl ObjectStorage for FakeStorage {
    async fn put(&self, key: &str, data: &[u8]) -> Result<StoredObject> {
        if self.fail_put.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.objects
            .lock()
            .unwrap()
            .push((key.to_string(), data.to_vec()));
        Ok(StoredObject {
            key: key.to_string(),
        })
    }

    async fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String> {
        if self.fail_sign.load(Ordering::SeqCst) {
            return Err(offline());
        }
        self.signed
            .lock()
            .unwrap()
            .push((key.to_string(), expires_in));
        let gate = self.sign_gates.lock().unwrap().get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(format!(
            "https://signed.example/{key}?expires={}",
            expires_in.as_secs()
        ))
    }
}

/// Lets several stores share one backend, like two browser sessions.
impl ImageApi for Arc<FakeApi> {
    async fn list_images(&self, params: ListImagesParams) -> Result<ImageConnection> {
        self.as_ref().list_images(params).await
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        self.as_ref().get_image(id).await
    }

    async fn create_image(&self, input: CreateImageInput) -> Result<Image> {
        self.as_ref().create_image(input).await
    }

    async fn update_image(&self, input: UpdateImageInput) -> Result<Image> {
        self.as_ref().update_image(input).await
    }
}

/// Yields until `done` holds; lets spawned handlers reach their gates.
pub async fn wait_until(mut done: impl FnMut() -> bool) {
    while !done() {
        tokio::task::yield_now().await;
    }
}
