//! Folder-style browsing over a flat, prefix-keyed S3-compatible bucket.
//!
//! `services` holds the virtual filesystem (listing, folder markers, upload,
//! recursive delete, folder archives), `store` the object store capability it
//! runs on, and `handlers`/`routes` the HTTP surface.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use axum::Router;
use services::browser::BrowserService;

/// Router with state attached, ready to serve.
pub fn app(service: BrowserService, max_upload_bytes: usize) -> Router {
    routes::routes::routes(max_upload_bytes).with_state(service)
}
