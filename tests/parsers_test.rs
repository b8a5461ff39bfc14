//! Fixture-driven tests of the public parser API.

use typhoon_tracks::assemble::{select_track, Selector};
use typhoon_tracks::parsers::atcf::parse_atcf_bulletin_with_stats;
use typhoon_tracks::parsers::csv_index::DEFAULT_TRACK_KEYWORDS;
use typhoon_tracks::{
    parse_atcf_bulletin, parse_kml_tracks, parse_warnings_feed, resolve_csv_link, Dialect,
    DialectMode, GeoPoint,
};

const WARNINGS_XML: &str = include_str!("fixtures/cwa_warning.xml");
const TRACK_KML: &str = include_str!("fixtures/track.kml");
const DATASET_INDEX: &str = include_str!("fixtures/dataset_index.csv");
const ATCF_BULLETIN: &str = include_str!("fixtures/atcf_bulletin.txt");

#[test]
fn warnings_feed_keeps_bulletins_only() {
    // ---
    let warnings = parse_warnings_feed(WARNINGS_XML).unwrap();

    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].title, "海上陸上颱風警報");
    assert!(warnings[0].description.contains("MAWAR"));
    assert_eq!(warnings[0].pub_date, "Tue, 15 Jul 2025 20:30:00 +0800");
    assert_eq!(warnings[1].title, "豪雨特報");
    assert_eq!(warnings[1].link, "");
}

#[test]
fn kml_fixture_yields_line_placemarks_only() {
    // ---
    let paths = parse_kml_tracks(TRACK_KML).unwrap();

    let names: Vec<&str> = paths.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["MAWAR past track", "MAWAR forecast"]);
    assert_eq!(paths[0].path.len(), 3);
    assert_eq!(paths[0].path[2], GeoPoint { lat: 15.0, lon: 125.0 });
    assert_eq!(paths[1].path.len(), 4);
    assert_eq!(paths[1].path[3], GeoPoint { lat: 19.0, lon: 129.5 });
}

#[test]
fn csv_index_resolves_track_link() {
    // ---
    let link = resolve_csv_link(DATASET_INDEX.as_bytes(), DEFAULT_TRACK_KEYWORDS).unwrap();
    assert_eq!(link.as_deref(), Some("track.kml"));
}

#[test]
fn atcf_fixture_groups_sorts_and_skips() {
    // ---
    let bulletin = parse_atcf_bulletin_with_stats(ATCF_BULLETIN, &Dialect::named());

    assert_eq!(bulletin.stats.total_records, 11);
    assert_eq!(bulletin.stats.records_parsed, 9);
    assert_eq!(bulletin.stats.records_skipped, 2);

    let tracks = &bulletin.tracks;
    assert_eq!(tracks.len(), 2);

    let wp15 = &tracks["WP15"];
    assert_eq!(wp15.name, "MAWAR");
    assert_eq!(wp15.agency, "JTWC");

    let past_lats: Vec<f64> = wp15.past_track.iter().map(|p| p.lat).collect();
    assert_eq!(past_lats, vec![14.0, 14.5, 15.0]);

    let horizons: Vec<u32> = wp15
        .forecast_track
        .iter()
        .map(|p| p.forecast_period_hours)
        .collect();
    assert_eq!(horizons, vec![0, 12, 24, 48]);

    let current = wp15.current_position.as_ref().unwrap();
    assert_eq!((current.lat, current.lon), (15.0, 125.0));
    assert_eq!(current.wind_speed_knots, 65);
    assert_eq!(current.pressure_hpa, 985);

    assert_eq!(tracks["WP14"].name, "DANAS");
    assert_eq!(tracks["WP14"].past_track.len(), 2);
    assert!(tracks["WP14"].forecast_track.is_empty());
}

#[test]
fn atcf_point_count_matches_valid_lines() {
    // ---
    let tracks = parse_atcf_bulletin(ATCF_BULLETIN, &Dialect::named());

    let points: usize = tracks.values().map(|t| t.point_count()).sum();
    assert_eq!(points, 9);
}

#[test]
fn atcf_selection_and_auto_dialect() {
    // ---
    let dialect = DialectMode::Auto.resolve(ATCF_BULLETIN);
    assert_eq!(dialect, Dialect::named());

    let tracks = parse_atcf_bulletin(ATCF_BULLETIN, &dialect);

    assert_eq!(select_track(&tracks, &Selector::Latest).unwrap().id, "WP15");
    assert_eq!(
        select_track(&tracks, &Selector::Id("WP14".to_string())).unwrap().name,
        "DANAS"
    );
    assert!(select_track(&tracks, &Selector::Id("WP16".to_string())).is_none());
}

#[test]
fn atcf_year_suffixed_identifiers() {
    // ---
    let tracks = parse_atcf_bulletin(ATCF_BULLETIN, &Dialect::named().with_year_suffix(true));

    let ids: Vec<&str> = tracks.keys().map(String::as_str).collect();
    assert_eq!(ids, vec!["WP142025", "WP152025"]);
    assert_eq!(select_track(&tracks, &Selector::Latest).unwrap().id, "WP152025");
}

#[test]
fn track_json_shape() {
    // ---
    let tracks = parse_atcf_bulletin(ATCF_BULLETIN, &Dialect::named());
    let json = serde_json::to_value(&tracks["WP15"]).unwrap();

    assert_eq!(json["id"], "WP15");
    assert_eq!(json["currentPosition"]["windSpeed_ms"], 33.4);
    assert_eq!(json["forecastTrack"][3]["forecastPeriod_hours"], 48);
    assert_eq!(json["pastTrack"][0]["time"], "2025-07-15T00:00:00Z");
    assert_eq!(json["forecastTrack"][3]["validTime"], "2025-07-17T12:00:00Z");
}
