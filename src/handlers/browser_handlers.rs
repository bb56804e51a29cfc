//! HTTP handlers for the folder browser.
//! Parse query/body parameters, delegate to `BrowserService`, shape JSON or
//! file responses. File downloads are streamed, folder downloads are sent as
//! one assembled zip.

use crate::{
    errors::AppError,
    models::{
        entry::{EntryKind, Listing},
        page::{Page, SortKey, SortOrder, paginate, sort_entries},
    },
    services::{
        browser::BrowserService,
        delete::{DeleteItem, DeleteItemOutcome, DeleteReport},
        download::DownloadBody,
        upload::{UploadOutcome, UploadRequest},
    },
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default page size when only `page` is given.
const DEFAULT_PAGE_SIZE: usize = 50;

/// Query params accepted by `GET /api/list`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub folder_path: Option<String>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    #[serde(flatten)]
    pub listing: Listing,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Page>,
}

/// Query params shared by delete and download.
#[derive(Debug, Deserialize)]
pub struct PathQuery {
    #[serde(alias = "filename")]
    pub path: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<EntryKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderReq {
    #[serde(default)]
    pub parent_path: String,
    #[serde(default)]
    pub folder_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderResp {
    pub key: String,
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchDeleteReq {
    pub items: Vec<DeleteItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchDeleteResp {
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<DeleteItemOutcome>,
}

/// `GET /api/list?folderPath=`: one folder level, optionally sorted and paged.
pub async fn list_folder(
    State(service): State<BrowserService>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let mut listing = service
        .list(q.folder_path.as_deref().unwrap_or_default())
        .await?;

    if q.sort.is_some() || q.order.is_some() {
        sort_entries(
            &mut listing.items,
            q.sort.unwrap_or_default(),
            q.order.unwrap_or_default(),
        );
    }

    let pagination = if q.page.is_some() || q.page_size.is_some() {
        let (items, page) = paginate(
            std::mem::take(&mut listing.items),
            q.page.unwrap_or(1),
            q.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        );
        listing.items = items;
        Some(page)
    } else {
        None
    };

    Ok(Json(ListResponse {
        listing,
        pagination,
    }))
}

/// `POST /api/folders`: create an (empty) folder.
pub async fn create_folder(
    State(service): State<BrowserService>,
    Json(req): Json<CreateFolderReq>,
) -> Result<impl IntoResponse, AppError> {
    let key = service
        .create_folder(&req.parent_path, &req.folder_name)
        .await?;
    let path = service
        .relative_for(&key)
        .trim_end_matches('/')
        .to_string();

    Ok((StatusCode::CREATED, Json(CreateFolderResp { key, path })))
}

/// `POST /api/upload`: multipart upload of a single file.
///
/// Fields: `file` (required), `currentPath`, `relativePath`, `preservePath`.
pub async fn upload_file(
    State(service): State<BrowserService>,
    mut multipart: Multipart,
) -> Result<Json<UploadOutcome>, AppError> {
    let mut req = UploadRequest::default();
    let mut file: Option<(String, Option<String>, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::bad_request(err.body_text()))?;
                file = Some((file_name, content_type, data));
            }
            "currentPath" | "relativePath" | "preservePath" => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::bad_request(err.body_text()))?;
                match name.as_str() {
                    "currentPath" => req.current_path = value,
                    "relativePath" => req.relative_path = Some(value),
                    _ => req.preserve_path = parse_flag(&value),
                }
            }
            other => debug!(field = other, "ignoring unknown upload field"),
        }
    }

    let Some((file_name, content_type, body)) = file else {
        return Err(AppError::bad_request("Missing file"));
    };
    req.file_name = file_name;
    req.content_type = content_type;
    req.body = body;

    Ok(Json(service.upload(req).await?))
}

/// `DELETE /api/delete?path=&type=file|folder`
pub async fn delete_entry(
    State(service): State<BrowserService>,
    Query(q): Query<PathQuery>,
) -> Result<Json<DeleteReport>, AppError> {
    let path = q.path.ok_or_else(|| AppError::bad_request("Missing path"))?;
    let report = service.delete(&path, q.kind.unwrap_or_default()).await?;
    Ok(Json(report))
}

/// `POST /api/delete/batch`: independent deletes, one result per item.
pub async fn delete_batch(
    State(service): State<BrowserService>,
    Json(req): Json<BatchDeleteReq>,
) -> Result<Json<BatchDeleteResp>, AppError> {
    if req.items.is_empty() {
        return Err(AppError::bad_request("No items to delete"));
    }
    let results = service.delete_each(req.items).await;
    let succeeded = results.iter().filter(|r| r.ok).count();

    Ok(Json(BatchDeleteResp {
        succeeded,
        failed: results.len() - succeeded,
        results,
    }))
}

/// `GET /api/download?path=&type=file|folder`: attachment response.
pub async fn download_entry(
    State(service): State<BrowserService>,
    Query(q): Query<PathQuery>,
) -> Result<Response, AppError> {
    let path = q.path.ok_or_else(|| AppError::bad_request("Missing path"))?;
    let download = service.download(&path, q.kind.unwrap_or_default()).await?;

    let content_length = download.content_length();
    let body = match download.body {
        DownloadBody::Stream(object) => Body::from_stream(object.stream),
        DownloadBody::Buffer(bytes) => Body::from(bytes),
    };

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::OK;
    set_download_headers(
        response.headers_mut(),
        &download.content_type,
        &download.filename,
        content_length,
    );
    Ok(response)
}

fn set_download_headers(
    headers: &mut HeaderMap,
    content_type: &str,
    filename: &str,
    content_length: Option<u64>,
) {
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    if let Ok(value) = HeaderValue::from_str(&content_disposition(filename)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }
}

/// RFC 5987 `attr-char` minus the alphanumerics.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// `attachment` disposition with an ASCII fallback name plus the RFC 5987
/// `filename*` form for everything else.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if fallback == filename {
        format!("attachment; filename=\"{fallback}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            utf8_percent_encode(filename, FILENAME_ENCODE_SET)
        )
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}
