use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::api::ImageApi;
use crate::error::{GalleryError, Result};
use crate::model::{CreateImageInput, Image, ImageConnection, ListImagesParams, UpdateImageInput};

const API_KEY_HEADER: &str = "x-api-key";

const LIST_IMAGES: &str = r#"
  query ListImages(
    $filter: ModelImageFilterInput
    $limit: Int
    $nextToken: String
  ) {
    listImages(filter: $filter, limit: $limit, nextToken: $nextToken) {
      items {
        id
        location
        photographer
        filePath
        likes
        createdAt
        updatedAt
      }
      nextToken
    }
  }
"#;

const GET_IMAGE: &str = r#"
  query GetImage($id: ID!) {
    getImage(id: $id) {
      id
      location
      photographer
      filePath
      likes
      createdAt
      updatedAt
    }
  }
"#;

const CREATE_IMAGE: &str = r#"
  mutation CreateImage($input: CreateImageInput!) {
    createImage(input: $input) {
      id
      location
      photographer
      filePath
      likes
      createdAt
      updatedAt
    }
  }
"#;

const UPDATE_IMAGE: &str = r#"
  mutation UpdateImage($input: UpdateImageInput!) {
    updateImage(input: $input) {
      id
      location
      photographer
      filePath
      likes
      createdAt
      updatedAt
    }
  }
"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListImagesData {
    list_images: Option<ImageConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetImageData {
    get_image: Option<Image>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateImageData {
    create_image: Option<Image>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateImageData {
    update_image: Option<Image>,
}

async fn assert_ok_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(GalleryError::Status { status, body })
}

/// GraphQL-over-HTTPS client for the managed image API.
#[derive(Clone, Debug)]
pub struct GraphqlClient {
    client: Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GraphqlClient {
    pub fn new(endpoint: Url, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(api_key) = &self.api_key {
            request = request.header(API_KEY_HEADER, api_key);
        }
        let response = request.send().await?;
        let response = assert_ok_response(response).await?;
        let payload: GraphqlResponse<T> = response.json().await?;
        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            let messages = errors
                .into_iter()
                .map(|err| err.message.unwrap_or_else(|| "unknown error".to_string()))
                .collect();
            return Err(GalleryError::Graphql(messages));
        }
        payload.data.ok_or(GalleryError::MissingData("data"))
    }
}

impl ImageApi for GraphqlClient {
    async fn list_images(&self, params: ListImagesParams) -> Result<ImageConnection> {
        let mut variables = serde_json::Map::new();
        if let Some(filter) = params.filter.filter(|filter| !filter.is_empty()) {
            variables.insert("filter".to_string(), filter.to_graphql());
        }
        if let Some(limit) = params.limit {
            variables.insert("limit".to_string(), json!(limit));
        }
        if let Some(next_token) = params.next_token {
            variables.insert("nextToken".to_string(), json!(next_token));
        }
        let data: ListImagesData = self.execute(LIST_IMAGES, Value::Object(variables)).await?;
        let connection = data
            .list_images
            .ok_or(GalleryError::MissingData("listImages"))?;
        debug!(count = connection.items.len(), "listImages returned");
        Ok(connection)
    }

    async fn get_image(&self, id: &str) -> Result<Option<Image>> {
        let data: GetImageData = self.execute(GET_IMAGE, json!({ "id": id })).await?;
        Ok(data.get_image)
    }

    async fn create_image(&self, input: CreateImageInput) -> Result<Image> {
        let data: CreateImageData = self
            .execute(CREATE_IMAGE, json!({ "input": input }))
            .await?;
        data.create_image
            .ok_or(GalleryError::MissingData("createImage"))
    }

    async fn update_image(&self, input: UpdateImageInput) -> Result<Image> {
        let data: UpdateImageData = self
            .execute(UPDATE_IMAGE, json!({ "input": input }))
            .await?;
        data.update_image
            .ok_or(GalleryError::MissingData("updateImage"))
    }
}
