//! Typhoon track ingestion library.
//!
//! Converts the heterogeneous formats published by weather agencies into one
//! normalized track model for a map front end:
//! - RSS/Atom warning feeds ([`parse_warnings_feed`])
//! - KML placemark tracks ([`parse_kml_tracks`])
//! - CSV dataset indices ([`resolve_csv_link`])
//! - ATCF/TCVITALS bulletins ([`parse_atcf_bulletin`], [`select_track`])
//!
//! Parsers are pure and stateless. The [`fetch`] and [`routes`] modules form
//! the thin HTTP proxy around them.

pub mod assemble;
pub mod config;
pub mod error;
pub mod fetch;
pub mod models;
pub mod parsers;
pub mod routes;

pub use assemble::{select_track, Selector, ZeroHourPolicy};
pub use config::Config;
pub use error::{Error, ErrorKind, FieldError, ParseStats, Result};
pub use models::{CycloneTrack, GeoPoint, NamedPolyline, TrackPoint, WarningItem};
pub use parsers::{
    knots_to_mps, parse_atcf_bulletin, parse_compass_coordinate, parse_kml_tracks,
    parse_kml_tracks_bytes, parse_warnings_feed, parse_warnings_feed_bytes, resolve_csv_link,
    Dialect, DialectMode,
};
