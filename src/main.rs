use anyhow::Result;
use bucket_browser::{
    config::{AppConfig, StoreKind},
    services::browser::BrowserService,
    store::{ObjectStore, memory::MemoryStore, s3::S3Store},
};
use std::{io::ErrorKind, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config ---
    let cfg = AppConfig::from_env_and_args()?;

    tracing::info!("Starting bucket-browser with config: {:?}", cfg);

    // --- Initialize object store ---
    let store: Arc<dyn ObjectStore> = match cfg.store {
        StoreKind::S3 => Arc::new(S3Store::connect(&cfg).await?),
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory store; nothing survives a restart");
            Arc::new(MemoryStore::new())
        }
    };

    if let Err(err) = store.probe().await {
        tracing::warn!("Object store not reachable at startup: {}", err);
    }

    // --- Initialize core service ---
    let browser = BrowserService::new(store, &cfg.base_prefix);
    if browser.base_prefix.is_empty() {
        tracing::info!("No base prefix configured; the whole bucket is visible");
    } else {
        tracing::info!("Scoping all operations to prefix `{}/`", browser.base_prefix);
    }

    // --- Build router ---
    let app = bucket_browser::app(browser, cfg.max_upload_bytes);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
