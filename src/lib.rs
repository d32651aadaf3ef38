//! A small photo gallery: browse images by like count, open one through a
//! short-lived signed link, like it, or upload a new one.
//!
//! Records live behind a GraphQL API ([`api::GraphqlClient`]) or, when no
//! endpoint is configured, in a JSON file ([`api::LocalImageApi`]). Files live
//! in [`storage::LocalObjectStorage`]. [`gallery::GalleryStore`] holds what
//! the page shows; [`web_pages`] and [`mcp_server`] are the two ways in.

pub mod api;
pub mod config;
pub mod error;
pub mod gallery;
pub mod mcp_server;
pub mod model;
pub mod storage;
pub mod tools;
pub mod upload;
pub mod web_pages;

#[cfg(test)]
pub(crate) mod testing;

use api::{ApiBackend, GraphqlClient, LocalImageApi};
use config::Config;
use gallery::GalleryStore;
use storage::LocalObjectStorage;

pub type AppStore = GalleryStore<ApiBackend, LocalObjectStorage>;

pub fn build_store(config: &Config) -> AppStore {
    let api = match &config.api_url {
        Some(url) => ApiBackend::Graphql(GraphqlClient::new(url.clone(), config.api_key.clone())),
        None => ApiBackend::Local(LocalImageApi::new(&config.storage_dir)),
    };
    let storage = LocalObjectStorage::new(
        config.storage_dir.clone(),
        config.public_url.clone(),
        config.signing_key.clone(),
    );
    GalleryStore::new(api, storage)
}
