use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::{
    api::ImageApi,
    gallery::{GalleryStore, ImageCard},
    storage::ObjectStorage,
    tools::json_result,
};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct ListImagesRequest {
    #[schemars(description = "Fetch the list from the backend again before listing")]
    pub refresh: Option<bool>,
}

pub async fn list_image_cards<A, S>(
    store: &GalleryStore<A, S>,
    request: ListImagesRequest,
) -> Vec<ImageCard>
where
    A: ImageApi,
    S: ObjectStorage,
{
    store.activate().await;
    if request.refresh.unwrap_or(false) {
        store.fetch_images().await;
    }
    store.render()
}

pub async fn list_images<A, S>(
    store: &GalleryStore<A, S>,
    Parameters(request): Parameters<ListImagesRequest>,
) -> Result<CallToolResult, McpError>
where
    A: ImageApi,
    S: ObjectStorage,
{
    let cards = list_image_cards(store, request).await;
    json_result(&cards)
}
