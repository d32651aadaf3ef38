use std::sync::Arc;

use anyhow::Result;
use photo_gallery::{build_store, config::Config, mcp_server::GalleryServer, web_pages};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = Config::load()?;
    let store = Arc::new(build_store(&config));
    let store_for_service = store.clone();
    let service = StreamableHttpService::new(
        move || Ok(GalleryServer::new(store_for_service.clone())),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let mcp_path = config.route("/mcp");
    let router = web_pages::router(store, &config.route(""))
        .nest_service(&mcp_path, service)
        .layer(TraceLayer::new_for_http());

    let bind_address = config.bind_address();
    let tcp_listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(
        "Photo gallery listening on http://{bind_address}{}/, MCP at {mcp_path}, storage in {}",
        config.route(""),
        config.storage_dir.display()
    );

    axum::serve(tcp_listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
