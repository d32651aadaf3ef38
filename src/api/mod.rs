pub mod graphql;
pub mod local;

use std::future::Future;

pub use graphql::GraphqlClient;
pub use local::LocalImageApi;

use crate::error::Result;
use crate::model::{CreateImageInput, Image, ImageConnection, ListImagesParams, UpdateImageInput};

/// The remote image API: the generated `listImages` / `getImage` queries and
/// the `createImage` / `updateImage` mutations.
pub trait ImageApi: Send + Sync {
    fn list_images(
        &self,
        params: ListImagesParams,
    ) -> impl Future<Output = Result<ImageConnection>> + Send;

    fn get_image(&self, id: &str) -> impl Future<Output = Result<Option<Image>>> + Send;

    fn create_image(&self, input: CreateImageInput) -> impl Future<Output = Result<Image>> + Send;

    fn update_image(&self, input: UpdateImageInput) -> impl Future<Output = Result<Image>> + Send;
}

/// Picks the GraphQL endpoint when one is configured, the on-disk store otherwise.
pub enum ApiBackend {
    Graphql(GraphqlClient),
    Local(LocalImageApi),
}

impl ImageApi for ApiBackend {
    async fn list_images(&self, params: ListImagesParams) -> Result<ImageConnection> {
        match self {
            ApiBackend::Graphql(client) => client.list_images(params).await,
            ApiBackend::Local(local) => local.list_images(params).await,
        }
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        match self {
            ApiBackend::Graphql(client) => client.get_image(id).await,
            ApiBackend::Local(local) => local.get_image(id).await,
        }
    }

    async fn create_image(&self, input: CreateImageInput) -> Result<Image> {
        match self {
            ApiBackend::Graphql(client) => client.create_image(input).await,
            ApiBackend::Local(local) => local.create_image(input).await,
        }
    }

    async fn update_image(&self, input: UpdateImageInput) -> Result<Image> {
        match self {
            ApiBackend::Graphql(client) => client.update_image(input).await,
            ApiBackend::Local(local) => local.update_image(input).await,
        }
    }
}
