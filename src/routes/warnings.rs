//! Weather warnings extracted from the CWA RSS/Atom feed.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use tracing::info;

use super::{ApiError, AppState};
use crate::fetch::fetch_text;
use crate::models::WarningItem;
use crate::parsers::parse_warnings_feed_bytes;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/get-cwa-warnings", get(handler))
}

#[derive(Debug, Serialize)]
struct WarningsResponse {
    success: bool,
    warnings: Vec<WarningItem>,
}

async fn handler(State((client, config)): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("GET /get-cwa-warnings");

    let upstream = fetch_text(&client, &config.rss_warning_url, config.upstream_timeout())
        .await
        .map_err(|e| ApiError::new("failed to fetch the CWA warnings feed", e))?;

    let warnings = parse_warnings_feed_bytes(&upstream.body)
        .map_err(|e| ApiError::new("failed to parse the CWA warnings feed", e))?;

    info!("Returning {} warnings", warnings.len());
    Ok(Json(WarningsResponse {
        success: true,
        warnings,
    }))
}
