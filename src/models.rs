//! Normalized data models shared by every parser.
//!
//! All values are built fresh for a single request and are immutable once
//! produced. Field names serialize in the shape the map front end expects.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::parsers::coords::knots_to_mps;

// ---

/// A signed decimal-degree position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    // ---
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Build a point, rejecting values outside the valid lat/lon ranges.
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        // ---
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon);
        in_range.then_some(Self { lat, lon })
    }
}

/// One observed or forecast cyclone fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    // ---
    pub lat: f64,
    pub lon: f64,
    /// Issuance (or observation) time of the record.
    pub time: Option<DateTime<Utc>>,
    /// `time` shifted by the forecast horizon.
    #[serde(rename = "validTime")]
    pub valid_time: Option<DateTime<Utc>>,
    #[serde(rename = "windSpeed_knots")]
    pub wind_speed_knots: u32,
    #[serde(rename = "windSpeed_ms")]
    pub wind_speed_ms: f64,
    pub pressure_hpa: u32,
    #[serde(rename = "forecastPeriod_hours")]
    pub forecast_period_hours: u32,
}

impl TrackPoint {
    /// Create a point; the m/s wind speed and valid time are derived here.
    pub fn new(
        position: GeoPoint,
        time: Option<DateTime<Utc>>,
        wind_speed_knots: u32,
        pressure_hpa: u32,
        forecast_period_hours: u32,
    ) -> Self {
        // ---
        let valid_time =
            time.and_then(|t| t.checked_add_signed(forecast_offset(forecast_period_hours)));

        Self {
            lat: position.lat,
            lon: position.lon,
            time,
            valid_time,
            wind_speed_knots,
            wind_speed_ms: knots_to_mps(wind_speed_knots),
            pressure_hpa,
            forecast_period_hours,
        }
    }
}

/// Forecast horizon as a signed offset from the issuance time.
pub fn forecast_offset(hours: u32) -> Duration {
    Duration::hours(i64::from(hours))
}

/// Normalized track of one cyclone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycloneTrack {
    // ---
    pub id: String,
    pub name: String,
    pub agency: String,
    /// Latest fix of `past_track`, or `None` when nothing was observed.
    pub current_position: Option<TrackPoint>,
    /// Observed fixes, oldest first.
    pub past_track: Vec<TrackPoint>,
    /// Forecast fixes, shortest horizon first.
    pub forecast_track: Vec<TrackPoint>,
}

impl CycloneTrack {
    pub fn is_empty(&self) -> bool {
        self.past_track.is_empty() && self.forecast_track.is_empty()
    }

    pub fn point_count(&self) -> usize {
        self.past_track.len() + self.forecast_track.len()
    }
}

/// A warning bulletin extracted from an RSS item or Atom entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningItem {
    // ---
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
}

/// A named, ordered path read from a KML placemark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPolyline {
    // ---
    pub name: String,
    pub path: Vec<GeoPoint>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::TimeZone;

    fn sample_point(forecast_hours: u32) -> TrackPoint {
        // ---
        TrackPoint::new(
            GeoPoint::new(15.0, 125.0).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 7, 15, 12, 0, 0).unwrap()),
            65,
            985,
            forecast_hours,
        )
    }

    #[test]
    fn test_geo_point_range() {
        // ---
        assert!(GeoPoint::new(90.0, 180.0).is_some());
        assert!(GeoPoint::new(-90.0, -180.0).is_some());
        assert!(GeoPoint::new(90.1, 0.0).is_none());
        assert!(GeoPoint::new(0.0, -180.5).is_none());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_none());
    }

    #[test]
    fn test_track_point_derived_fields() {
        // ---
        let point = sample_point(12);

        assert_eq!(point.wind_speed_ms, 33.4);
        assert_eq!(
            point.valid_time,
            Some(Utc.with_ymd_and_hms(2025, 7, 16, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_track_point_without_time() {
        // ---
        let point = TrackPoint::new(GeoPoint::new(1.0, 2.0).unwrap(), None, 0, 0, 24);

        assert!(point.time.is_none());
        assert!(point.valid_time.is_none());
        assert_eq!(point.wind_speed_ms, 0.0);
    }

    #[test]
    fn test_unrepresentable_valid_time_is_none() {
        // ---
        let point = sample_point(u32::MAX);

        assert!(point.time.is_some());
        assert!(point.valid_time.is_none());
    }

    #[test]
    fn test_serialized_field_names() {
        // ---
        let track = CycloneTrack {
            id: "WP15".to_string(),
            name: "MAWAR".to_string(),
            agency: "JTWC".to_string(),
            current_position: Some(sample_point(0)),
            past_track: vec![sample_point(0)],
            forecast_track: vec![],
        };

        let json = serde_json::to_value(&track).unwrap();

        assert!(json.get("currentPosition").is_some());
        assert!(json.get("pastTrack").is_some());
        assert!(json.get("forecastTrack").is_some());

        let point = &json["pastTrack"][0];
        assert_eq!(point["windSpeed_knots"], 65);
        assert_eq!(point["windSpeed_ms"], 33.4);
        assert_eq!(point["pressure_hpa"], 985);
        assert_eq!(point["forecastPeriod_hours"], 0);
    }

    #[test]
    fn test_warning_item_pub_date_name() {
        // ---
        let item = WarningItem {
            pub_date: "Tue, 15 Jul 2025 12:00:00 +0800".to_string(),
            ..WarningItem::default()
        };

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["pubDate"], "Tue, 15 Jul 2025 12:00:00 +0800");
        assert_eq!(json["title"], "");
    }
}
