use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::ImageApi,
    gallery::GalleryStore,
    storage::ObjectStorage,
    tools::json_result,
};

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct OpenImageRequest {
    #[schemars(description = "Position of the image in the list returned by list_images")]
    pub index: usize,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenImageResponse {
    pub index: usize,
    pub open: bool,
    pub url: Option<String>,
}

pub async fn toggle_image<A, S>(
    store: &GalleryStore<A, S>,
    request: OpenImageRequest,
) -> Result<OpenImageResponse, McpError>
where
    A: ImageApi,
    S: ObjectStorage,
{
    store.activate().await;
    if request.index >= store.snapshot().images.len() {
        return Err(McpError::invalid_params(
            format!("no image at index {}", request.index),
            None,
        ));
    }
    let url = store.toggle_open(request.index).await;
    let open = store.snapshot().open_index == Some(request.index);
    Ok(OpenImageResponse {
        index: request.index,
        open,
        url,
    })
}

pub async fn open_image<A, S>(
    store: &GalleryStore<A, S>,
    Parameters(request): Parameters<OpenImageRequest>,
) -> Result<CallToolResult, McpError>
where
    A: ImageApi,
    S: ObjectStorage,
{
    let response = toggle_image(store, request).await?;
    json_result(&response)
}
