//! Track endpoints: one per upstream wire format.
//!
//! Each handler fetches one body, hands it to exactly one parser and returns
//! the normalized result. An unconfigured source answers "no data".

use std::collections::BTreeMap;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ApiError, AppState};
use crate::assemble::{select_track, Selector};
use crate::fetch::{fetch_first_success, fetch_text};
use crate::models::{CycloneTrack, NamedPolyline};
use crate::parsers::{
    parse_atcf_bulletin, parse_kml_tracks_bytes, resolve_csv_link, DEFAULT_TRACK_KEYWORDS,
};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/typhoon-tracks/kml", get(kml_handler))
        .route("/typhoon-tracks/csv", get(csv_handler))
        .route("/typhoon-tracks/atcf", get(atcf_handler))
}

#[derive(Debug, Serialize)]
struct PathsResponse {
    success: bool,
    paths: Vec<NamedPolyline>,
}

impl PathsResponse {
    fn new(paths: Vec<NamedPolyline>) -> Json<Self> {
        Json(Self {
            success: true,
            paths,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum AtcfResponse {
    One {
        success: bool,
        track: Option<CycloneTrack>,
    },
    All {
        success: bool,
        tracks: BTreeMap<String, CycloneTrack>,
    },
}

/// Query parameters of the ATCF endpoint.
#[derive(Debug, Deserialize)]
pub struct AtcfQuery {
    /// Cyclone identifier, e.g. `WP15`; the latest storm when absent.
    storm: Option<String>,
    /// Return every cyclone of the bulletin instead of one.
    #[serde(default)]
    all: bool,
}

async fn kml_handler(State((client, config)): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("GET /typhoon-tracks/kml");

    let Some(url) = config.track_kml_url.as_deref() else {
        debug!("TRACK_KML_URL is not configured");
        return Ok(PathsResponse::new(vec![]));
    };

    let upstream = fetch_text(&client, url, config.upstream_timeout())
        .await
        .map_err(|e| ApiError::new("failed to fetch the track KML", e))?;
    let paths = parse_kml_tracks_bytes(&upstream.body)
        .map_err(|e| ApiError::new("failed to parse the track KML", e))?;

    info!("Returning {} KML paths", paths.len());
    Ok(PathsResponse::new(paths))
}

async fn csv_handler(State((client, config)): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("GET /typhoon-tracks/csv");

    let Some(index_url) = config.track_csv_index_url.as_deref() else {
        debug!("TRACK_CSV_INDEX_URL is not configured");
        return Ok(PathsResponse::new(vec![]));
    };

    let index = fetch_text(&client, index_url, config.upstream_timeout())
        .await
        .map_err(|e| ApiError::new("failed to fetch the CSV index", e))?;
    let link = resolve_csv_link(&index.body, DEFAULT_TRACK_KEYWORDS)
        .map_err(|e| ApiError::new("failed to resolve the track link from the CSV index", e))?;

    let Some(link) = link else {
        info!("CSV index lists no current track");
        return Ok(PathsResponse::new(vec![]));
    };

    // Index links may be relative to the index itself.
    let track_url = Url::parse(index_url)
        .and_then(|base| base.join(&link))
        .map(String::from)
        .unwrap_or(link);

    let upstream = fetch_text(&client, &track_url, config.upstream_timeout())
        .await
        .map_err(|e| ApiError::new("failed to fetch the track KML linked from the CSV index", e))?;
    let paths = parse_kml_tracks_bytes(&upstream.body)
        .map_err(|e| ApiError::new("failed to parse the track KML linked from the CSV index", e))?;

    info!("Returning {} KML paths from {}", paths.len(), track_url);
    Ok(PathsResponse::new(paths))
}

async fn atcf_handler(
    Query(params): Query<AtcfQuery>,
    State((client, config)): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    // ---
    info!("GET /typhoon-tracks/atcf - {:?}", params);

    if config.atcf_urls.is_empty() {
        debug!("ATCF_URLS is not configured");
        return Ok(Json(empty_atcf_response(params.all)));
    }

    let upstream = fetch_first_success(&client, &config.atcf_urls, config.upstream_timeout())
        .await
        .map_err(|e| ApiError::new("failed to fetch an ATCF bulletin", e))?;

    let text = upstream.text();
    let dialect = config
        .atcf_dialect
        .resolve(&text)
        .with_agency(config.atcf_agency.clone());
    let tracks = parse_atcf_bulletin(&text, &dialect);

    if params.all {
        info!("Returning {} ATCF tracks from {}", tracks.len(), upstream.url);
        return Ok(Json(AtcfResponse::All {
            success: true,
            tracks,
        }));
    }

    let selector = match params.storm {
        Some(id) => Selector::Id(id.trim().to_ascii_uppercase()),
        None => Selector::Latest,
    };
    let track = select_track(&tracks, &selector).cloned();

    match &track {
        Some(t) => info!("Returning ATCF track {} ({} points)", t.id, t.point_count()),
        None => info!("No active storm matches {:?}", selector),
    }
    Ok(Json(AtcfResponse::One {
        success: true,
        track,
    }))
}

fn empty_atcf_response(all: bool) -> AtcfResponse {
    // ---
    if all {
        AtcfResponse::All {
            success: true,
            tracks: BTreeMap::new(),
        }
    } else {
        AtcfResponse::One {
            success: true,
            track: None,
        }
    }
}
