use serde::{Deserialize, Serialize};

/// A gallery entry as the `Image` type of the GraphQL schema describes it.
///
/// `created_at` / `updated_at` are managed by the backend and are stripped
/// before an update is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    pub location: String,
    pub photographer: String,
    pub file_path: String,
    pub likes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Image {
    /// The record as `updateImage` accepts it: every field except the timestamps.
    pub fn to_update_input(&self) -> UpdateImageInput {
        UpdateImageInput {
            id: self.id.clone(),
            location: self.location.clone(),
            photographer: self.photographer.clone(),
            file_path: self.file_path.clone(),
            likes: self.likes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateImageInput {
    pub id: String,
    pub location: String,
    pub photographer: String,
    pub file_path: String,
    pub likes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateImageInput {
    pub id: String,
    pub location: String,
    pub photographer: String,
    pub file_path: String,
    pub likes: u32,
}

/// One page of `listImages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConnection {
    pub items: Vec<Image>,
    #[serde(default)]
    pub next_token: Option<String>,
}

/// Substring filters, matching `ModelImageFilterInput`'s `contains` operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageFilter {
    pub location: Option<String>,
    pub photographer: Option<String>,
}

impl ImageFilter {
    pub fn is_empty(&self) -> bool {
        self.location.is_none() && self.photographer.is_none()
    }

    pub fn matches(&self, image: &Image) -> bool {
        let location_ok = self
            .location
            .as_deref()
            .is_none_or(|needle| image.location.contains(needle));
        let photographer_ok = self
            .photographer
            .as_deref()
            .is_none_or(|needle| image.photographer.contains(needle));
        location_ok && photographer_ok
    }

    pub fn to_graphql(&self) -> serde_json::Value {
        let mut filter = serde_json::Map::new();
        if let Some(location) = &self.location {
            filter.insert(
                "location".to_string(),
                serde_json::json!({ "contains": location }),
            );
        }
        if let Some(photographer) = &self.photographer {
            filter.insert(
                "photographer".to_string(),
                serde_json::json!({ "contains": photographer }),
            );
        }
        serde_json::Value::Object(filter)
    }
}

/// Arguments of `listImages`. The gallery always sends the default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListImagesParams {
    pub filter: Option<ImageFilter>,
    pub limit: Option<u32>,
    pub next_token: Option<String>,
}
