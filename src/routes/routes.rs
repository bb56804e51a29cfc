//! Defines routes for the folder browser API.
//!
//! ## Structure
//! - **Navigation**
//!   - `GET    /api/list?folderPath=`          one folder level + breadcrumbs
//!
//! - **Mutations**
//!   - `POST   /api/folders`                   create folder (JSON body)
//!   - `POST   /api/upload`                    multipart upload of one file
//!   - `DELETE /api/delete?path=&type=`        delete a file or a folder tree
//!   - `POST   /api/delete/batch`              independent deletes, per-item results
//!
//! - **Transfers**
//!   - `GET    /api/download?path=&type=`      file stream or folder zip
//!
//! Paths are always relative to the configured base prefix.

use crate::{
    handlers::{
        browser_handlers::{
            create_folder, delete_batch, delete_entry, download_entry, list_folder, upload_file,
        },
        health_handlers::{healthz, readyz},
    },
    services::browser::BrowserService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
};

/// Build and return the router for the browser API.
///
/// The router carries shared state (`BrowserService`) to all handlers.
/// `max_upload_bytes` caps multipart request bodies.
pub fn routes(max_upload_bytes: usize) -> Router<BrowserService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/list", get(list_folder))
        .route("/api/folders", post(create_folder))
        .route(
            "/api/upload",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/api/delete", delete(delete_entry))
        .route("/api/delete/batch", post(delete_batch))
        .route("/api/download", get(download_entry))
}
