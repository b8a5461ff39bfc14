//! Pass-through of the CWA tropical cyclone JSON dataset.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use tracing::info;

use super::{ApiError, AppState};
use crate::error::Error;
use crate::fetch::fetch_with_api_key;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/get-typhoon-data", get(handler))
}

async fn handler(State((client, config)): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("GET /get-typhoon-data");

    let upstream = fetch_with_api_key(
        &client,
        &config.typhoon_api_url,
        &config.cwa_api_key,
        config.upstream_timeout(),
    )
    .await
    .map_err(|e| ApiError::new("failed to fetch typhoon data from CWA", e))?;

    let data: serde_json::Value = serde_json::from_slice(&upstream.body).map_err(|source| {
        let error = Error::UpstreamJson {
            url: upstream.url.clone(),
            status: upstream.status,
            body: upstream.text(),
            source,
        };
        ApiError::new("failed to parse CWA typhoon response as JSON", error)
    })?;

    Ok(Json(data))
}
