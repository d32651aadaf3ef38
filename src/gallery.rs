use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};

use crate::api::ImageApi;
use crate::model::{Image, ListImagesParams};
use crate::storage::{ObjectStorage, SIGNED_URL_EXPIRY};
use crate::upload::{UploadForm, UploadOutcome};

/// Everything the gallery page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryState {
    pub images: Vec<Image>,
    pub open_index: Option<usize>,
    pub open_url: Option<String>,
    pub upload_open: bool,
    pub activated: bool,
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageCard {
    pub index: usize,
    pub image: Image,
    pub is_open: bool,
    pub url: Option<String>,
}

/// Gallery state plus the handlers that mutate it.
///
/// The lock is only held around local mutation, never across a remote call,
/// so handlers interleave like UI callbacks: whichever finishes last wins.
/// Two likes racing on the same image against the backend can therefore lose
/// an increment; nothing here prevents that.
pub struct GalleryStore<A, S> {
    api: A,
    storage: S,
    state: Mutex<GalleryState>,
}

impl<A, S> GalleryStore<A, S>
where
    A: ImageApi,
    S: ObjectStorage,
{
    pub fn new(api: A, storage: S) -> Self {
        Self {
            api,
            storage,
            state: Mutex::new(GalleryState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn state(&self) -> MutexGuard<'_, GalleryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> GalleryState {
        self.state().clone()
    }

    /// First visit fetches the list; later visits reuse it.
    pub async fn activate(&self) {
        let first = {
            let mut state = self.state();
            !std::mem::replace(&mut state.activated, true)
        };
        if first {
            self.fetch_images().await;
        }
    }

    /// Replaces the local list with the full remote list. On failure the
    /// previous list stays.
    pub async fn fetch_images(&self) {
        match self.api.list_images(ListImagesParams::default()).await {
            Ok(connection) => {
                debug!(count = connection.items.len(), "fetched images");
                self.state().images = connection.items;
            }
            Err(err) => warn!(error = %err, "Fetching Images Error"),
        }
    }

    /// Sorts the list by likes, most first, and returns the cards in that
    /// order. Card indices are positions in the stored list.
    pub fn render(&self) -> Vec<ImageCard> {
        let mut state = self.state();
        state.images.sort_by(|a, b| b.likes.cmp(&a.likes));
        let open_index = state.open_index;
        let open_url = state.open_url.clone();
        state
            .images
            .iter()
            .enumerate()
            .map(|(index, image)| {
                let is_open = open_index == Some(index);
                ImageCard {
                    index,
                    image: image.clone(),
                    is_open,
                    url: if is_open { open_url.clone() } else { None },
                }
            })
            .collect()
    }

    /// Opens row `index`, closing whichever row was open, or closes it when it
    /// already is. Returns the link shown afterwards.
    ///
    /// A link that resolves after its row was closed is still applied.
    pub async fn toggle_open(&self, index: usize) -> Option<String> {
        let key = {
            let mut state = self.state();
            if state.open_index == Some(index) {
                state.open_index = None;
                state.open_url = None;
                return None;
            }
            let Some(image) = state.images.get(index) else {
                warn!(index, "open requested for a missing image");
                return None;
            };
            let key = image.file_path.clone();
            state.open_index = Some(index);
            state.open_url = None;
            key
        };
        match self.storage.signed_url(&key, SIGNED_URL_EXPIRY).await {
            Ok(url) => {
                self.state().open_url = Some(url.clone());
                Some(url)
            }
            Err(err) => {
                warn!(error = %err, key = %key, "Opening Image Error");
                None
            }
        }
    }

    /// Adds one like locally, submits the whole record and takes the
    /// backend's answer. A failed submit keeps the local increment.
    ///
    /// The answer replaces the entry with the same id, wherever a render in
    /// the meantime has moved it.
    pub async fn like(&self, index: usize) -> Option<Image> {
        let input = {
            let mut state = self.state();
            let Some(image) = state.images.get_mut(index) else {
                warn!(index, "like requested for a missing image");
                return None;
            };
            image.likes = image.likes.saturating_add(1);
            image.created_at = None;
            image.updated_at = None;
            image.to_update_input()
        };
        match self.api.update_image(input).await {
            Ok(updated) => {
                let mut state = self.state();
                let slot = state.images.iter_mut().find(|image| image.id == updated.id);
                if let Some(slot) = slot {
                    *slot = updated.clone();
                }
                Some(updated)
            }
            Err(err) => {
                warn!(error = %err, "Liking Image Error");
                None
            }
        }
    }

    pub fn show_upload_form(&self) {
        self.state().upload_open = true;
    }

    pub fn close_upload_form(&self) {
        self.state().upload_open = false;
    }

    /// Submits `form`; whatever happens the form closes and the list is
    /// fetched again.
    pub async fn submit_upload(&self, form: &UploadForm) -> UploadOutcome {
        let outcome = form.submit(&self.api, &self.storage).await;
        self.close_upload_form();
        self.fetch_images().await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::testing::{FakeApi, FakeStorage, image, wait_until};

    fn store(images: Vec<Image>) -> GalleryStore<FakeApi, FakeStorage> {
        GalleryStore::new(FakeApi::with_images(images), FakeStorage::default())
    }

    fn likes(cards: &[ImageCard]) -> Vec<u32> {
        cards.iter().map(|card| card.image.likes).collect()
    }

    #[tokio::test]
    async fn render_orders_by_likes_descending() {
        let store = store(vec![image("a", 2), image("b", 9), image("c", 0), image("d", 9)]);
        store.activate().await;

        let cards = store.render();

        assert_eq!(likes(&cards), vec![9, 9, 2, 0]);
        assert!(cards.windows(2).all(|pair| pair[0].image.likes >= pair[1].image.likes));
        assert_eq!(cards[0].image.id, "b");
        assert_eq!(cards[1].image.id, "d");
        assert_eq!(
            cards.iter().map(|card| card.index).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[tokio::test]
    async fn activate_fetches_only_once() {
        let store = store(vec![image("a", 1)]);
        store.activate().await;
        store.api().images.lock().unwrap().push(image("b", 5));

        store.activate().await;
        assert_eq!(store.snapshot().images.len(), 1);

        store.fetch_images().await;
        assert_eq!(store.snapshot().images.len(), 2);
    }

    #[tokio::test]
    async fn open_then_close_clears_index_and_url() {
        let store = store(vec![image("a", 1), image("b", 3)]);
        store.activate().await;
        store.render();

        let url = store.toggle_open(1).await;
        let opened = store.snapshot();
        assert_eq!(opened.open_index, Some(1));
        assert_eq!(opened.open_url, url);
        assert_eq!(url.as_deref(), Some("https://signed.example/a.jpg?expires=60"));
        assert_eq!(
            store.storage().signed.lock().unwrap()[0],
            ("a.jpg".to_string(), Duration::from_secs(60))
        );
        let cards = store.render();
        assert!(cards[1].is_open && cards[1].url.is_some());
        assert!(!cards[0].is_open && cards[0].url.is_none());

        assert_eq!(store.toggle_open(1).await, None);
        let closed = store.snapshot();
        assert_eq!(closed.open_index, None);
        assert_eq!(closed.open_url, None);
    }

    #[tokio::test]
    async fn opening_another_row_moves_the_single_open_index() {
        let store = store(vec![image("a", 1), image("b", 3)]);
        store.activate().await;

        store.toggle_open(0).await;
        store.toggle_open(1).await;

        let state = store.snapshot();
        assert_eq!(state.open_index, Some(1));
        assert_eq!(
            state.open_url.as_deref(),
            Some("https://signed.example/b.jpg?expires=60")
        );
    }

    #[tokio::test]
    async fn failed_signing_leaves_row_open_without_url() {
        let store = store(vec![image("a", 1)]);
        store.activate().await;
        store.storage().fail_sign(true);

        assert_eq!(store.toggle_open(0).await, None);

        let state = store.snapshot();
        assert_eq!(state.open_index, Some(0));
        assert_eq!(state.open_url, None);
    }

    #[tokio::test]
    async fn like_increments_by_one_and_takes_server_record() {
        let store = store(vec![image("a", 4)]);
        store.activate().await;

        let updated = store.like(0).await.unwrap();

        assert_eq!(updated.likes, 5);
        assert_eq!(store.snapshot().images[0], updated);
        assert_eq!(
            updated.updated_at.as_deref(),
            Some("2024-06-02T08:30:00.000Z")
        );
        let sent = store.api().updates.lock().unwrap()[0].clone();
        assert_eq!(sent.likes, 5);
        assert_eq!(sent.id, "a");

        store.like(0).await.unwrap();
        assert_eq!(store.render()[0].image.likes, 6);
    }

    #[tokio::test]
    async fn failed_like_keeps_the_local_increment() {
        let store = store(vec![image("a", 4)]);
        store.activate().await;
        store.api().fail_update(true);

        assert_eq!(store.like(0).await, None);

        let local = store.snapshot().images[0].clone();
        assert_eq!(local.likes, 5);
        assert_eq!(local.created_at, None);
        assert_eq!(local.updated_at, None);
        assert_eq!(store.api().images.lock().unwrap()[0].likes, 4);
    }

    #[tokio::test]
    async fn missing_rows_are_ignored() {
        let store = store(vec![image("a", 4)]);
        store.activate().await;

        assert_eq!(store.like(3).await, None);
        assert_eq!(store.toggle_open(3).await, None);
        assert_eq!(store.snapshot().open_index, None);
    }

    #[tokio::test]
    async fn failed_first_fetch_leaves_an_empty_list() {
        let store = store(vec![image("a", 4)]);
        store.api().fail_list(true);

        store.activate().await;

        assert!(store.snapshot().images.is_empty());
        assert!(store.render().is_empty());
    }

    #[tokio::test]
    async fn failed_refetch_keeps_the_previous_list() {
        let store = store(vec![image("a", 4), image("b", 1)]);
        store.activate().await;
        let before = store.snapshot().images;
        store.api().fail_list(true);
        store.api().images.lock().unwrap().clear();

        store.fetch_images().await;

        assert_eq!(store.snapshot().images, before);
    }

    #[tokio::test]
    async fn upload_without_file_still_closes_the_form() {
        let store = store(vec![image("a", 4)]);
        store.activate().await;
        store.show_upload_form();
        assert!(store.snapshot().upload_open);

        let outcome = store.submit_upload(&UploadForm::new("x", "y")).await;

        assert_eq!(outcome, UploadOutcome::NoFile);
        assert!(!store.snapshot().upload_open);
        assert!(store.api().creates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_closes_form_and_refetches() {
        let store = store(vec![image("a", 4)]);
        store.activate().await;
        store.show_upload_form();
        let form = UploadForm::new("Lima", "Ines").with_file("plaza.jpg", vec![7; 16]);

        let outcome = store.submit_upload(&form).await;

        let state = store.snapshot();
        assert!(!state.upload_open);
        assert_eq!(state.images.len(), 2);
        let UploadOutcome::Created(created) = outcome else {
            panic!("upload did not create a record");
        };
        assert!(state.images.contains(&created));
        assert_eq!(created.likes, 0);
        assert_eq!(store.render().last().map(|card| card.image.id.clone()), Some(created.id));
    }

    #[tokio::test]
    async fn like_answer_lands_on_its_own_image_after_a_render() {
        let store = Arc::new(store(vec![image("a", 5), image("b", 5)]));
        store.activate().await;
        let gate = store.api().gate_updates();

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.like(1).await }
        });
        wait_until(|| store.api().updates.lock().unwrap().len() == 1).await;
        let reordered = store.render();
        assert_eq!(reordered[0].image.id, "b");
        gate.notify_one();
        let updated = pending.await.unwrap().unwrap();

        let state = store.snapshot();
        let mut ids: Vec<_> = state.images.iter().map(|image| image.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(state.images[0], updated);
        assert_eq!(state.images[1], image("a", 5));
        assert_eq!(likes(&store.render()), vec![6, 5]);
    }

    #[tokio::test]
    async fn link_resolving_after_close_is_still_applied() {
        let store = Arc::new(store(vec![image("a", 1)]));
        store.activate().await;
        let gate = store.storage().gate_signing("a.jpg");

        let pending = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_open(0).await }
        });
        wait_until(|| store.storage().signed.lock().unwrap().len() == 1).await;
        assert_eq!(store.toggle_open(0).await, None);
        assert_eq!(store.snapshot().open_index, None);
        gate.notify_one();
        pending.await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.open_index, None);
        assert_eq!(
            state.open_url.as_deref(),
            Some("https://signed.example/a.jpg?expires=60")
        );
        assert!(store.render().iter().all(|card| card.url.is_none()));
    }

    #[tokio::test]
    async fn late_link_for_a_previous_row_replaces_the_current_one() {
        let store = Arc::new(store(vec![image("a", 1), image("b", 3)]));
        store.activate().await;
        let gate_a = store.storage().gate_signing("a.jpg");
        let gate_b = store.storage().gate_signing("b.jpg");

        let first = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_open(0).await }
        });
        wait_until(|| store.storage().signed.lock().unwrap().len() == 1).await;
        let second = tokio::spawn({
            let store = store.clone();
            async move { store.toggle_open(1).await }
        });
        wait_until(|| store.storage().signed.lock().unwrap().len() == 2).await;

        gate_b.notify_one();
        second.await.unwrap();
        assert_eq!(
            store.snapshot().open_url.as_deref(),
            Some("https://signed.example/b.jpg?expires=60")
        );
        gate_a.notify_one();
        first.await.unwrap();

        let state = store.snapshot();
        assert_eq!(state.open_index, Some(1));
        assert_eq!(
            state.open_url.as_deref(),
            Some("https://signed.example/a.jpg?expires=60")
        );
    }

    #[tokio::test]
    async fn racing_likes_from_two_sessions_lose_an_increment() {
        let backend = Arc::new(FakeApi::with_images(vec![image("a", 5)]));
        let first = Arc::new(GalleryStore::new(backend.clone(), FakeStorage::default()));
        let second = Arc::new(GalleryStore::new(backend.clone(), FakeStorage::default()));
        first.activate().await;
        second.activate().await;
        let gate = backend.gate_updates();

        let likes: Vec<_> = [first.clone(), second.clone()]
            .into_iter()
            .map(|store| tokio::spawn(async move { store.like(0).await }))
            .collect();
        wait_until(|| backend.updates.lock().unwrap().len() == 2).await;
        gate.notify_one();
        gate.notify_one();
        for like in likes {
            assert_eq!(like.await.unwrap().map(|image| image.likes), Some(6));
        }

        assert_eq!(backend.images.lock().unwrap()[0].likes, 6);
        assert_eq!(first.snapshot().images[0].likes, 6);
        assert_eq!(second.snapshot().images[0].likes, 6);
    }

    #[tokio::test]
    async fn likes_within_one_session_build_on_each_other() {
        let store = Arc::new(store(vec![image("a", 5)]));
        store.activate().await;
        let gate = store.api().gate_updates();

        let likes: Vec<_> = (0..2)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.like(0).await })
            })
            .collect();
        wait_until(|| store.api().updates.lock().unwrap().len() == 2).await;
        gate.notify_one();
        wait_until(|| store.api().images.lock().unwrap()[0].likes == 6).await;
        gate.notify_one();
        for like in likes {
            like.await.unwrap();
        }

        let sent: Vec<_> = store
            .api()
            .updates
            .lock()
            .unwrap()
            .iter()
            .map(|input| input.likes)
            .collect();
        assert_eq!(sent, vec![6, 7]);
        assert_eq!(store.api().images.lock().unwrap()[0].likes, 7);
        assert_eq!(store.snapshot().images[0].likes, 7);
    }
}
