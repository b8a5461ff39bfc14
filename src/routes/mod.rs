//! Route gateway: merges every endpoint subrouter and maps library errors to
//! HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use reqwest::Client;
use serde::Serialize;
use tracing::error;

use crate::error::{Error, ErrorKind};
use crate::Config;

mod health;
mod tracks;
mod typhoon;
mod warnings;

/// Shared state of every handler.
pub type AppState = (Client, Config);

// ---

pub fn router(client: Client, config: Config) -> Router {
    // ---
    Router::new()
        .merge(typhoon::router())
        .merge(warnings::router())
        .merge(tracks::router())
        .merge(health::router())
        .with_state((client, config))
}

/// JSON error body. The upstream text is echoed for debugging only.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    details: String,
    upstream_status: Option<u16>,
    upstream_text: Option<String>,
}

/// A library error tagged with what the handler was doing.
#[derive(Debug)]
pub struct ApiError {
    context: &'static str,
    error: Error,
}

impl ApiError {
    pub fn new(context: &'static str, error: Error) -> Self {
        Self { context, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // ---
        error!("{}: {}", self.context, self.error);

        let status = match self.error.kind() {
            ErrorKind::Transport => StatusCode::BAD_GATEWAY,
            ErrorKind::Format => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.context,
            details: self.error.to_string(),
            upstream_status: self.error.upstream_status(),
            upstream_text: self.error.upstream_text().map(str::to_string),
        };

        (status, Json(body)).into_response()
    }
}
