// Router-level tests: requests go through the real axum stack with fake adapters.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use common::{DownStore, TableScan, app_state};
use vanguard_posture::api::router;
use vanguard_posture::store::{MemoryRecordStore, RecordStore};

fn scan_table() -> Arc<TableScan> {
    Arc::new(TableScan::new(vec![
        ("example.com", vec![("93.184.216.34", "A"), ("93.184.216.35", "B")]),
        ("example.org", vec![("93.184.216.40", "A+")]),
        ("example.net", vec![]),
    ]))
}

async fn get(app: axum::Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .uri(uri)
                .header(header::ORIGIN, "https://dashboard.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

#[tokio::test]
async fn scan_returns_response_record() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    let (status, headers, body) = get(app, "/scan?site=example.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("application/json"));

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ssl_grade"], "B");
    assert_eq!(json["previous_ssl_grade"], "B");
    assert_eq!(json["servers_changed"], false);
    assert_eq!(json["is_down"], false);
    assert_eq!(json["title"], "title not found");
    assert_eq!(json["logo"], "logo not found");
    assert_eq!(json["servers"][0]["address"], "93.184.216.34");
    assert_eq!(json["servers"][0]["ssl_grade"], "A");
    assert_eq!(json["servers"][0]["owner"], "Owner of 93.184.216.34");
    assert_eq!(json["servers"][1]["country"], "US");
}

#[tokio::test]
async fn missing_site_is_rejected_before_scanning() {
    let scan = scan_table();
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan.clone(), store));

    let (status, _, body) = get(app, "/scan").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("site parameter is missing"));
    assert_eq!(scan.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_site_is_rejected() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    let (status, _, _) = get(app, "/scan?site=").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unreachable_scan_provider_is_a_server_error_and_writes_nothing() {
    let store = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store.clone()));

    let (status, _, body) = get(app, "/scan?site=unknown.example").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("Scan provider unavailable"));
    assert!(store.list_urls().await.unwrap().is_empty());
}

#[tokio::test]
async fn unavailable_store_fails_scan_with_plain_text() {
    let store: Arc<dyn RecordStore> = Arc::new(DownStore);
    let app = router(app_state(scan_table(), store));

    let (status, headers, body) = get(app, "/scan?site=example.com").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));
    assert!(String::from_utf8(body).unwrap().contains("Record store unavailable"));
}

#[tokio::test]
async fn unavailable_store_fails_visited() {
    let store: Arc<dyn RecordStore> = Arc::new(DownStore);
    let app = router(app_state(scan_table(), store));

    let (status, _, body) = get(app, "/visited").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8(body).unwrap().contains("Record store unavailable"));
}

#[tokio::test]
async fn legacy_route_accepts_web_url_parameter() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    let (status, _, body) = get(app, "/WebSearch?webURL=https://example.org/").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ssl_grade"], "A+");
}

#[tokio::test]
async fn both_parameter_names_scan_the_site_parameter() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    let (status, _, body) = get(app, "/scan?site=example.com&webURL=example.org").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ssl_grade"], "B");
}

#[tokio::test]
async fn visited_lists_each_site_once() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    for uri in [
        "/scan?site=example.com",
        "/scan?site=example.org",
        "/scan?site=example.net",
        "/scan?site=https://EXAMPLE.com/index.html",
    ] {
        let (status, _, _) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }

    let (status, _, body) = get(app, "/visited").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    let mut items: Vec<String> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap().to_string())
        .collect();
    items.sort();
    assert_eq!(items, vec!["example.com", "example.net", "example.org"]);
}

#[tokio::test]
async fn site_without_endpoints_reports_not_found_grade() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    let (_, _, body) = get(app, "/scan?site=example.net").await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["ssl_grade"], "not found");
    assert_eq!(json["servers"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn health_reports_ok() {
    let store: Arc<dyn RecordStore> = Arc::new(MemoryRecordStore::new());
    let app = router(app_state(scan_table(), store));

    let (status, _, body) = get(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}
