pub mod like_image;
pub mod list_images;
pub mod open_image;
pub mod upload_image;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

pub use like_image::{LikeImageRequest, like_image};
pub use list_images::{ListImagesRequest, list_images};
pub use open_image::{OpenImageRequest, OpenImageResponse, open_image};
pub use upload_image::{UploadImageRequest, UploadImageResponse, upload_image};

pub fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string(value).map_err(|err| {
        McpError::internal_error(
            "serialize tool response failed",
            Some(serde_json::Value::String(err.to_string())),
        )
    })?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
