//! HTTP surface: request parsing, status codes and response shapes.

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use bucket_browser::app;
use common::{FlakyStore, browser};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const BOUNDARY: &str = "XBOUNDARYX";

fn router(store: Arc<FlakyStore>, base: &str) -> Router {
    app(browser(store, base), 1024 * 1024)
}

async fn send(router: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, bytes.to_vec())
}

fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn multipart(fields: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, file_name, value) in fields {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match file_name {
            Some(file_name) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                ));
                body.push_str("Content-Type: text/plain\r\n\r\n");
            }
            None => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                ));
            }
        }
        body.push_str(value);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn healthz_is_ok() {
    let router = router(FlakyStore::new(), "");
    let (status, _, body) = send(&router, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["status"], "ok");
}

#[tokio::test]
async fn readyz_reports_store_check() {
    let router = router(FlakyStore::new(), "");
    let (status, _, body) = send(&router, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["checks"]["flaky"]["ok"], true);
}

#[tokio::test]
async fn list_returns_items_and_breadcrumbs() {
    let store = FlakyStore::new();
    store.seed("fossil/docs/a/", "").await;
    store.seed("fossil/docs/readme.txt", "hello").await;
    let router = router(store, "fossil");

    let (status, _, body) = send(&router, get("/api/list?folderPath=docs")).await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["currentPath"], "docs");
    assert_eq!(v["items"][0]["type"], "folder");
    assert_eq!(v["items"][0]["fullPath"], "docs/a");
    assert_eq!(v["items"][1]["type"], "file");
    assert_eq!(v["items"][1]["name"], "readme.txt");
    assert_eq!(v["items"][1]["size"], 5);
    assert_eq!(v["breadcrumbs"][0]["name"], "Home");
    assert_eq!(v["breadcrumbs"][1]["path"], "docs");
    assert!(v.get("pagination").is_none());
}

#[tokio::test]
async fn list_sorts_and_paginates_on_request() {
    let store = FlakyStore::new();
    for name in ["c.txt", "a.txt", "e.txt", "b.txt", "d.txt"] {
        store.seed(name, "x").await;
    }
    let router = router(store, "");

    let (status, _, body) = send(
        &router,
        get("/api/list?sort=name&order=desc&page=2&pageSize=2"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    let names: Vec<_> = v["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["c.txt", "b.txt"]);
    assert_eq!(v["pagination"]["totalPages"], 3);
    assert_eq!(v["pagination"]["window"]["pages"], serde_json::json!([1, 2, 3]));
}

#[tokio::test]
async fn upload_preserving_path_then_download() {
    let store = FlakyStore::new();
    let router = router(store.clone(), "");

    let (status, _, body) = send(
        &router,
        multipart(&[
            ("currentPath", None, "inbox"),
            ("relativePath", None, "trip/day1/notes.txt"),
            ("preservePath", None, "true"),
            ("file", Some("notes.txt"), "dear diary"),
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["key"], "inbox/trip/day1/notes.txt");
    assert_eq!(
        store.inner.keys().await,
        vec!["inbox/", "inbox/trip/", "inbox/trip/day1/", "inbox/trip/day1/notes.txt"]
    );

    let (status, headers, body) = send(
        &router,
        get("/api/download?path=inbox/trip/day1/notes.txt&type=file"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"notes.txt\""
    );
    assert_eq!(body, b"dear diary");
}

#[tokio::test]
async fn upload_without_file_is_bad_request() {
    let router = router(FlakyStore::new(), "");
    let (status, _, body) = send(&router, multipart(&[("currentPath", None, "x")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Missing file");
}

#[tokio::test]
async fn create_folder_then_list_parent() {
    let store = FlakyStore::new();
    let router = router(store, "");

    let req = Request::builder()
        .method("POST")
        .uri("/api/folders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"parentPath":"projects","folderName":"2025"}"#))
        .unwrap();
    let (status, _, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json(&body)["path"], "projects/2025");

    let (_, _, body) = send(&router, get("/api/list?folderPath=projects")).await;
    assert_eq!(json(&body)["items"][0]["fullPath"], "projects/2025");
}

#[tokio::test]
async fn create_folder_without_name_is_bad_request() {
    let store = FlakyStore::new();
    let router = router(store.clone(), "");

    let req = Request::builder()
        .method("POST")
        .uri("/api/folders")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"parentPath":"a"}"#))
        .unwrap();
    let (status, _, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "missing folder name");
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn delete_statuses() {
    let store = FlakyStore::new();
    store.seed("dir/a.txt", "a").await;
    let router = router(store.clone(), "");

    let delete = |uri: &str| {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _, _) = send(&router, delete("/api/delete?type=folder")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, _) = send(&router, delete("/api/delete?path=ghost&type=folder")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(&router, delete("/api/delete?path=dir&type=folder")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["deleted"], 1);
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn legacy_filename_param_deletes_a_file() {
    let store = FlakyStore::new();
    store.seed("fossil/old.txt", "a").await;
    let router = router(store.clone(), "fossil");

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/delete?filename=old.txt")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn batch_delete_reports_each_item() {
    let store = FlakyStore::new();
    store.seed("one.txt", "1").await;
    store.seed("two/x.txt", "2").await;
    let router = router(store.clone(), "");

    let req = Request::builder()
        .method("POST")
        .uri("/api/delete/batch")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"items":[{"path":"one.txt","type":"file"},{"path":"missing","type":"folder"},{"path":"two","type":"folder"}]}"#,
        ))
        .unwrap();
    let (status, _, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["succeeded"], 2);
    assert_eq!(v["failed"], 1);
    assert_eq!(v["results"][1]["ok"], false);
    assert!(store.inner.is_empty().await);
}

#[tokio::test]
async fn folder_download_is_a_zip_attachment() {
    let store = FlakyStore::new();
    store.seed("reports/q1.csv", "1,2").await;
    let router = router(store, "");

    let (status, headers, body) =
        send(&router, get("/api/download?path=reports&type=folder")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/zip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=\"reports.zip\""
    );
    assert_eq!(headers[header::CONTENT_LENGTH], body.len().to_string().as_str());
    // local file header signature
    assert_eq!(&body[..4], b"PK\x03\x04");
}

#[tokio::test]
async fn store_failures_surface_as_server_errors() {
    let store = FlakyStore::new();
    for i in 0..1001 {
        store.seed(&format!("big/{i}"), "x").await;
    }
    store
        .fail_delete_call
        .store(1, std::sync::atomic::Ordering::SeqCst);
    let router = router(store, "");

    let req = Request::builder()
        .method("DELETE")
        .uri("/api/delete?path=big&type=folder")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&router, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("SlowDown"));
}
