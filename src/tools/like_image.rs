use rmcp::{
    ErrorData as McpError,
    handler::server::wrapper::Parameters,
    model::CallToolResult,
    schemars::JsonSchema,
};
use serde::Deserialize;

use crate::{
    api::ImageApi,
    gallery::GalleryStore,
    model::Image,
    storage::ObjectStorage,
    tools::json_result,
};

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct LikeImageRequest {
    #[schemars(description = "Position of the image in the list returned by list_images")]
    pub index: usize,
}

pub async fn like_at<A, S>(
    store: &GalleryStore<A, S>,
    request: LikeImageRequest,
) -> Result<Image, McpError>
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
    store
        .like(request.index)
        .await
        .ok_or_else(|| McpError::internal_error("like image failed", None))
}

pub async fn like_image<A, S>(
    store: &GalleryStore<A, S>,
    Parameters(request): Parameters<LikeImageRequest>,
) -> Result<CallToolResult, McpError>
where
    A: ImageApi,
    S: ObjectStorage,
{
    let image = like_at(store, request).await?;
    json_result(&image)
}
