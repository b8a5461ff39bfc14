//! ATCF / TCVITALS bulletin parsing.
//!
//! Each line is one comma-separated fix:
//!
//! ```text
//! WP, 15, 2025071512, BEST, 0,   0, 150N, 1250E, 65, 985, ...
//! 0   1   2           3     4    5  6     7      8   9
//! ```
//!
//! Lines are parsed independently. A line that cannot be parsed is logged,
//! counted in [`ParseStats`] and skipped; it never aborts the bulletin.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use tracing::{debug, info};

use super::coords::{parse_axis_coordinate, Axis};
use crate::assemble::{FixKind, TrackAccumulator, ZeroHourPolicy};
use crate::error::{FieldError, ParseStats};
use crate::models::{forecast_offset, CycloneTrack, GeoPoint, TrackPoint};

/// Technique code of observed best-track fixes.
pub const BEST_TECHNIQUE: &str = "BEST";

/// Placeholder name of systems that are not yet named.
pub const INVEST_NAME: &str = "INVEST";

const BASIN: usize = 0;
const CYCLONE_NUMBER: usize = 1;
const TIMESTAMP: usize = 2;
const TECHNIQUE: usize = 3;
const TECHNIQUE_FALLBACK: usize = 4;
const LATITUDE: usize = 6;
const LONGITUDE: usize = 7;
const MAX_WIND: usize = 8;
const PRESSURE: usize = 9;

/// Field count of a line carrying a storm name.
const NAMED_MIN_FIELDS: usize = 28;
const NAME: usize = 27;

// ---

/// Column layout of one bulletin dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    /// Lines with fewer fields are rejected.
    pub min_fields: usize,
    pub forecast_hour_index: usize,
    pub name_index: Option<usize>,
    /// Append the 4-digit year to the cyclone identifier (`WP152025`).
    pub year_suffix: bool,
    pub zero_hour_policy: ZeroHourPolicy,
    /// Agency label attached to every track.
    pub agency: String,
}

impl Dialect {
    /// Compact ATCF: 20 fields, forecast hour in field 5, no name.
    pub fn compact() -> Self {
        Self::layout(20, 5, None)
    }

    /// Full ATCF with a storm name in field 27.
    pub fn named() -> Self {
        Self::layout(NAMED_MIN_FIELDS, 5, Some(NAME))
    }

    /// TCVITALS-style layout: forecast hour in field 4, name in field 27.
    pub fn tcvitals() -> Self {
        Self::layout(NAMED_MIN_FIELDS, 4, Some(NAME))
    }

    fn layout(min_fields: usize, forecast_hour_index: usize, name_index: Option<usize>) -> Self {
        // ---
        Self {
            min_fields,
            forecast_hour_index,
            name_index,
            year_suffix: false,
            zero_hour_policy: ZeroHourPolicy::default(),
            agency: "JTWC".to_string(),
        }
    }

    /// Pick [`Dialect::named`] when any data line is long enough to carry a
    /// name, [`Dialect::compact`] otherwise.
    pub fn detect(text: &str) -> Self {
        // ---
        let named = data_lines(text).any(|(_, line)| line.split(',').count() >= NAMED_MIN_FIELDS);
        if named {
            Self::named()
        } else {
            Self::compact()
        }
    }

    pub fn with_agency(mut self, agency: impl Into<String>) -> Self {
        self.agency = agency.into();
        self
    }

    pub fn with_year_suffix(mut self, year_suffix: bool) -> Self {
        self.year_suffix = year_suffix;
        self
    }

    pub fn with_zero_hour_policy(mut self, policy: ZeroHourPolicy) -> Self {
        self.zero_hour_policy = policy;
        self
    }
}

/// Dialect selection as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialectMode {
    Auto,
    Compact,
    Named,
    Tcvitals,
}

impl DialectMode {
    pub fn resolve(self, text: &str) -> Dialect {
        // ---
        match self {
            DialectMode::Auto => Dialect::detect(text),
            DialectMode::Compact => Dialect::compact(),
            DialectMode::Named => Dialect::named(),
            DialectMode::Tcvitals => Dialect::tcvitals(),
        }
    }
}

impl FromStr for DialectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(DialectMode::Auto),
            "compact" | "atcf" => Ok(DialectMode::Compact),
            "named" => Ok(DialectMode::Named),
            "tcvitals" => Ok(DialectMode::Tcvitals),
            other => Err(format!("unknown ATCF dialect '{other}'")),
        }
    }
}

/// One successfully parsed line.
#[derive(Debug, Clone, PartialEq)]
pub struct AtcfRecord {
    pub cyclone_id: String,
    pub name: Option<String>,
    pub kind: FixKind,
    pub point: TrackPoint,
}

/// Parsed bulletin together with its line statistics.
#[derive(Debug, Clone)]
pub struct AtcfBulletin {
    pub tracks: BTreeMap<String, CycloneTrack>,
    pub stats: ParseStats,
}

/// Parse a bulletin into tracks keyed by cyclone identifier.
///
/// An empty or fully malformed bulletin yields an empty map ("no active storm").
pub fn parse_atcf_bulletin(text: &str, dialect: &Dialect) -> BTreeMap<String, CycloneTrack> {
    parse_atcf_bulletin_with_stats(text, dialect).tracks
}

/// Like [`parse_atcf_bulletin`], also reporting which lines were skipped.
pub fn parse_atcf_bulletin_with_stats(text: &str, dialect: &Dialect) -> AtcfBulletin {
    // ---
    let mut stats = ParseStats::new();
    let mut accumulator = TrackAccumulator::new(dialect.agency.clone(), dialect.zero_hour_policy);

    for (line_no, line) in data_lines(text) {
        match parse_line(line, dialect) {
            Ok(record) => {
                stats.record_parsed();
                accumulator.push(
                    &record.cyclone_id,
                    record.name.as_deref(),
                    record.kind,
                    record.point,
                );
            }
            Err(e) => {
                debug!("Skipping ATCF line {}: {}", line_no, e);
                stats.record_skipped(line_no, &e);
            }
        }
    }

    let tracks = accumulator.finish();
    info!(
        "ATCF bulletin: {} cyclones from {} lines ({} skipped, {:.1}% parsed)",
        tracks.len(),
        stats.total_records,
        stats.records_skipped,
        stats.success_rate()
    );

    AtcfBulletin { tracks, stats }
}

/// Parse a single bulletin line.
pub fn parse_line(line: &str, dialect: &Dialect) -> Result<AtcfRecord, FieldError> {
    // ---
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < dialect.min_fields {
        return Err(FieldError::TooFewFields {
            found: fields.len(),
            required: dialect.min_fields,
        });
    }

    let basin = required(&fields, BASIN, "basin")?.to_ascii_uppercase();
    let number = required(&fields, CYCLONE_NUMBER, "cyclone number")?;
    let raw_time = required(&fields, TIMESTAMP, "timestamp")?;
    let time = parse_timestamp(raw_time)?;

    let lat = parse_axis_coordinate(required(&fields, LATITUDE, "latitude")?, Axis::Latitude)?;
    let lon = parse_axis_coordinate(required(&fields, LONGITUDE, "longitude")?, Axis::Longitude)?;
    let position = GeoPoint::new(lat, lon)
        .ok_or_else(|| FieldError::MalformedCoordinate(format!("{lat},{lon}")))?;

    let wind = number_or_zero(&fields, MAX_WIND);
    let pressure = number_or_zero(&fields, PRESSURE);
    let forecast_hours = number_or_zero(&fields, dialect.forecast_hour_index);
    if time.checked_add_signed(forecast_offset(forecast_hours)).is_none() {
        return Err(FieldError::ForecastHourOutOfRange(forecast_hours));
    }

    let cyclone_id = if dialect.year_suffix {
        format!("{basin}{number}{:04}", time.year())
    } else {
        format!("{basin}{number}")
    };

    let name = dialect
        .name_index
        .and_then(|i| fields.get(i))
        .filter(|n| !n.is_empty())
        .map(|n| {
            if n.eq_ignore_ascii_case(INVEST_NAME) {
                format!("{INVEST_NAME} {number}")
            } else {
                n.to_string()
            }
        });

    Ok(AtcfRecord {
        cyclone_id,
        name,
        kind: technique_kind(&fields),
        point: TrackPoint::new(position, Some(time), wind, pressure, forecast_hours),
    })
}

/// Parse `YYMMDDHH` or `YYYYMMDDHH` as a UTC instant.
///
/// Two-digit years below 50 are 20xx, the rest 19xx.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, FieldError> {
    // ---
    let malformed = || FieldError::MalformedTimestamp(raw.to_string());

    if !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let (year, rest) = match raw.len() {
        8 => {
            let yy: i32 = raw[..2].parse().map_err(|_| malformed())?;
            let century = if yy < 50 { 2000 } else { 1900 };
            (century + yy, &raw[2..])
        }
        10 => (raw[..4].parse::<i32>().map_err(|_| malformed())?, &raw[4..]),
        _ => return Err(malformed()),
    };

    let month: u32 = rest[0..2].parse().map_err(|_| malformed())?;
    let day: u32 = rest[2..4].parse().map_err(|_| malformed())?;
    let hour: u32 = rest[4..6].parse().map_err(|_| malformed())?;

    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .ok_or_else(malformed)?;
    Ok(Utc.from_utc_datetime(&naive))
}

/// Non-comment, non-blank lines with their 1-based line numbers.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// `BEST` in the technique column marks an observed fix. Bulletins that
/// leave the technique-number column blank carry the code one field later.
fn technique_kind(fields: &[&str]) -> FixKind {
    // ---
    let technique = match fields.get(TECHNIQUE) {
        Some(t) if t.is_empty() => fields.get(TECHNIQUE_FALLBACK).copied().unwrap_or_default(),
        Some(t) => *t,
        None => "",
    };

    if technique.eq_ignore_ascii_case(BEST_TECHNIQUE) {
        FixKind::BestTrack
    } else {
        FixKind::Forecast
    }
}

fn required<'a>(fields: &[&'a str], index: usize, name: &'static str) -> Result<&'a str, FieldError> {
    fields
        .get(index)
        .copied()
        .filter(|f| !f.is_empty())
        .ok_or(FieldError::MissingField(name))
}

/// Non-negative integer field; anything else counts as zero.
fn number_or_zero(fields: &[&str], index: usize) -> u32 {
    fields
        .get(index)
        .and_then(|f| f.parse().ok())
        .unwrap_or(0)
}
