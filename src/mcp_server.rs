use std::sync::Arc;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};

use crate::AppStore;
use crate::tools::{LikeImageRequest, ListImagesRequest, OpenImageRequest, UploadImageRequest};

const INSTRUCTIONS: &str = "Photo gallery. Images are listed most-liked first; \
open_image and like_image take the index shown by list_images.";

#[derive(Clone)]
pub struct GalleryServer {
    tool_router: ToolRouter<Self>,
    store: Arc<AppStore>,
}

impl GalleryServer {
    pub fn new(store: Arc<AppStore>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            store,
        }
    }
}

#[tool_router]
impl GalleryServer {
    #[tool(description = "List gallery images sorted by like count, most liked first")]
    async fn list_images(
        &self,
        Parameters(request): Parameters<ListImagesRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::list_images(self.store.as_ref(), Parameters(request)).await
    }

    #[tool(
        description = "Open or close an image. Opening returns a signed link that stays valid for 60 seconds, show it with ![](url)"
    )]
    async fn open_image(
        &self,
        Parameters(request): Parameters<OpenImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::open_image(self.store.as_ref(), Parameters(request)).await
    }

    #[tool(description = "Add one like to an image")]
    async fn like_image(
        &self,
        Parameters(request): Parameters<LikeImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::like_image(self.store.as_ref(), Parameters(request)).await
    }

    #[tool(description = "Upload a new image with its location and photographer")]
    async fn upload_image(
        &self,
        Parameters(request): Parameters<UploadImageRequest>,
    ) -> Result<CallToolResult, McpError> {
        crate::tools::upload_image(self.store.as_ref(), Parameters(request)).await
    }
}

#[tool_handler]
impl ServerHandler for GalleryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }
}
