//! Upstream retrieval.
//!
//! The only I/O in the crate. Parsers never call into this module; handlers
//! fetch a body here and hand the text to exactly one parser.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ---

/// A successful upstream response.
#[derive(Debug, Clone)]
pub struct Upstream {
    /// URL that served the body (without credentials).
    pub url: String,
    pub status: u16,
    pub body: Vec<u8>,
}

impl Upstream {
    /// Body as text; invalid UTF-8 sequences are replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// GET `url` with a timeout. Non-success statuses are transport errors that
/// carry the upstream status and body.
pub async fn fetch_text(client: &Client, url: &str, timeout: Duration) -> Result<Upstream> {
    send(client.get(url), url, timeout).await
}

/// GET `url` with the API key passed as the `Authorization` query parameter.
/// Errors and logs only ever show `url` without the key.
pub async fn fetch_with_api_key(
    client: &Client,
    url: &str,
    api_key: &str,
    timeout: Duration,
) -> Result<Upstream> {
    // ---
    let request = client.get(url).query(&[("Authorization", api_key)]);
    send(request, url, timeout).await
}

/// Try each candidate in order and return the first successful response.
///
/// When every candidate fails, the error of the last attempt is returned.
pub async fn fetch_first_success(
    client: &Client,
    urls: &[String],
    timeout: Duration,
) -> Result<Upstream> {
    // ---
    let mut last_error = None;

    for (attempt, url) in urls.iter().enumerate() {
        match fetch_text(client, url, timeout).await {
            Ok(upstream) => {
                debug!("Candidate {} of {} answered: {}", attempt + 1, urls.len(), url);
                return Ok(upstream);
            }
            Err(e) => {
                warn!("Candidate {} of {} failed: {}", attempt + 1, urls.len(), e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Error::Transport {
        url: String::new(),
        status: None,
        body: None,
        message: "no upstream candidates configured".to_string(),
    }))
}

async fn send(request: RequestBuilder, url: &str, timeout: Duration) -> Result<Upstream> {
    // ---
    debug!("Fetching {}", url);

    let response = request
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| Error::transport(url, e))?;

    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|e| Error::transport(url, e))?;

    if !status.is_success() {
        return Err(Error::Transport {
            url: url.to_string(),
            status: Some(status.as_u16()),
            body: Some(String::from_utf8_lossy(&body).into_owned()),
            message: format!("upstream answered {status}"),
        });
    }

    debug!("Fetched {} bytes from {}", body.len(), url);
    Ok(Upstream {
        url: url.to_string(),
        status: status.as_u16(),
        body: body.to_vec(),
    })
}
