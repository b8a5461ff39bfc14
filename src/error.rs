//! Error taxonomy for the ingestion core.
//!
//! Document- and transport-level failures are [`Error`] values that reach the
//! caller. Record-level problems are [`FieldError`] values that never leave a
//! parser: they are logged, counted in [`ParseStats`] and the record is
//! skipped. "No matching data" is not an error at all and is reported as
//! `Ok(None)` or an empty collection.

/// Result type alias for the ingestion core.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to the serving layer.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Upstream unreachable, timed out, or answered with a non-success status.
    #[error("upstream request to {url} failed: {message}")]
    Transport {
        url: String,
        status: Option<u16>,
        body: Option<String>,
        message: String,
    },

    /// RSS/Atom document is not well-formed XML.
    #[error("failed to parse warnings feed: {0}")]
    FeedParse(#[source] roxmltree::Error),

    /// KML document is not well-formed XML.
    #[error("failed to parse KML document: {0}")]
    KmlParse(#[source] roxmltree::Error),

    /// CSV index header lacks a required column.
    #[error("CSV index has no '{0}' column")]
    MissingColumn(String),

    /// Upstream bytes match none of the candidate encodings.
    #[error("{document} could not be decoded as {tried}")]
    Encoding { document: &'static str, tried: String },

    /// CSV index header could not be read.
    #[error("CSV index is unreadable: {0}")]
    Csv(#[from] csv::Error),

    /// Upstream body that should have been JSON was not.
    #[error("response from {url} is not valid JSON: {source}")]
    UpstreamJson {
        url: String,
        status: u16,
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse classification used when mapping errors to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Format,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        // ---
        match self {
            Error::Transport { .. } => ErrorKind::Transport,
            _ => ErrorKind::Format,
        }
    }

    /// Build a transport error from a failed `reqwest` call. The request URL
    /// is dropped from the message since it may carry credentials.
    pub fn transport(url: &str, source: reqwest::Error) -> Self {
        // ---
        let source = source.without_url();
        Error::Transport {
            url: url.to_string(),
            status: source.status().map(|s| s.as_u16()),
            body: None,
            message: source.to_string(),
        }
    }

    /// Upstream HTTP status, when one was received.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Error::Transport { status, .. } => *status,
            Error::UpstreamJson { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Raw upstream body, when one was received.
    pub fn upstream_text(&self) -> Option<&str> {
        match self {
            Error::Transport { body, .. } => body.as_deref(),
            Error::UpstreamJson { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Problems confined to a single record, line or coordinate token.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("expected at least {required} fields, found {found}")]
    TooFewFields { found: usize, required: usize },

    #[error("malformed coordinate '{0}'")]
    MalformedCoordinate(String),

    #[error("malformed timestamp '{0}'")]
    MalformedTimestamp(String),

    #[error("missing field '{0}'")]
    MissingField(&'static str),

    #[error("forecast hour {0} is out of range")]
    ForecastHourOutOfRange(u32),
}

/// Per-document parsing statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Candidate records seen (comment and blank lines excluded).
    pub total_records: usize,

    /// Records turned into points.
    pub records_parsed: usize,

    /// Records skipped because of a [`FieldError`].
    pub records_skipped: usize,

    /// One message per skipped record, for diagnostics.
    pub errors: Vec<String>,
}

impl ParseStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_parsed(&mut self) {
        self.total_records += 1;
        self.records_parsed += 1;
    }

    pub fn record_skipped(&mut self, line_no: usize, error: &FieldError) {
        // ---
        self.total_records += 1;
        self.records_skipped += 1;
        self.errors.push(format!("line {line_no}: {error}"));
    }

    /// Share of records that parsed, as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            (self.records_parsed as f64 / self.total_records as f64) * 100.0
        }
    }
}
