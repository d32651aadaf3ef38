use base64::{Engine as _, engine::general_purpose::STANDARD};
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
    model::Image,
    storage::ObjectStorage,
    tools::json_result,
    upload::{UploadForm, UploadOutcome},
};

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct UploadImageRequest {
    #[schemars(description = "Where the photo was taken")]
    pub location: String,
    #[schemars(description = "Who took the photo")]
    pub photographer: String,
    #[schemars(description = "Original file name, its extension is kept")]
    pub file_name: Option<String>,
    #[schemars(description = "File content, base64 encoded. Without it nothing is uploaded")]
    pub data_base64: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct UploadImageResponse {
    pub status: &'static str,
    pub image: Option<Image>,
}

pub async fn upload_from_request<A, S>(
    store: &GalleryStore<A, S>,
    request: UploadImageRequest,
) -> Result<UploadImageResponse, McpError>
where
    A: ImageApi,
    S: ObjectStorage,
{
    let mut form = UploadForm::new(request.location, request.photographer);
    if let Some(data) = request.data_base64.as_deref().map(str::trim) {
        if !data.is_empty() {
            let bytes = STANDARD.decode(data).map_err(|err| {
                McpError::invalid_params(
                    "data_base64 is not valid base64",
                    Some(serde_json::Value::String(err.to_string())),
                )
            })?;
            form = form.with_file(request.file_name.unwrap_or_default(), bytes);
        }
    }
    let response = match store.submit_upload(&form).await {
        UploadOutcome::Created(image) => UploadImageResponse {
            status: "created",
            image: Some(image),
        },
        UploadOutcome::NoFile => UploadImageResponse {
            status: "no_file",
            image: None,
        },
        UploadOutcome::Failed => UploadImageResponse {
            status: "failed",
            image: None,
        },
    };
    Ok(response)
}

pub async fn upload_image<A, S>(
    store: &GalleryStore<A, S>,
    Parameters(request): Parameters<UploadImageRequest>,
) -> Result<CallToolResult, McpError>
where
    A: ImageApi,
    S: ObjectStorage,
{
    let response = upload_from_request(store, request).await?;
    json_result(&response)
}
