//! One parser per wire format. Each is a pure function over already-fetched
//! text or bytes; none of them calls another or performs I/O.

pub mod atcf;
pub mod coords;
pub mod csv_index;
pub mod decode;
pub mod feed;
pub mod kml;

pub use atcf::{parse_atcf_bulletin, parse_atcf_bulletin_with_stats, Dialect, DialectMode};
pub use coords::{knots_to_mps, parse_compass_coordinate};
pub use csv_index::{resolve_csv_link, DEFAULT_TRACK_KEYWORDS};
pub use decode::{decode_text, decode_xml};
pub use feed::{parse_warnings_feed, parse_warnings_feed_bytes, DEFAULT_WARNING_KEYWORDS};
pub use kml::{parse_kml_tracks, parse_kml_tracks_bytes};
