// src/api/handlers.rs

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::AppState;
use crate::core::models::{ResponseRecord, VisitedUrls};
use crate::core::target::normalize_target;
use crate::error::PostureError;

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub site: Option<String>,
    /// Parameter name of the legacy `/WebSearch` route.
    #[serde(rename = "webURL")]
    pub web_url: Option<String>,
}

impl ScanQuery {
    /// The requested site. `site` wins when both names are given.
    pub fn target(self) -> Option<String> {
        self.site.or(self.web_url)
    }
}

/// `GET /scan?site=<host>`: builds a fresh snapshot and reconciles it with history.
pub async fn scan_site(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ResponseRecord>, PostureError> {
    let site = query.target().ok_or_else(|| {
        warn!("Scan requested without a site parameter.");
        PostureError::InvalidTarget("site parameter is missing".to_string())
    })?;
    let target = normalize_target(&site)?;

    let snapshot = state.builder.build(&target).await?;
    let response = state.engine.reconcile(snapshot, &target).await?;
    info!(
        site = %target,
        ssl_grade = %response.ssl_grade,
        servers_changed = response.servers_changed,
        "Scan request served."
    );
    Ok(Json(response))
}

/// `GET /visited`: every site that has history.
pub async fn visited_sites(State(state): State<Arc<AppState>>) -> Result<Json<VisitedUrls>, PostureError> {
    let items = state.store.list_urls().await?;
    Ok(Json(VisitedUrls { items }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
