//! KML placemark track extraction.
//!
//! Every `Placemark` holding a `LineString` becomes one [`NamedPolyline`].
//! KML writes coordinates as `lon,lat[,alt]`, the reverse of [`GeoPoint`].

use roxmltree::{Document, Node};
use tracing::{debug, warn};

use super::decode::decode_xml;
use super::feed::{child_text, lenient_options};
use crate::assemble::assemble_polyline;
use crate::error::{Error, FieldError, Result};
use crate::models::{GeoPoint, NamedPolyline};

/// Namespace of KML 2.2 documents.
pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";

// ---

/// Parse every placemark path in a KML document.
///
/// Placemarks without a `LineString`, or whose coordinates yield no valid
/// point, are left out. A document without placemarks yields an empty list.
pub fn parse_kml_tracks(kml: &str) -> Result<Vec<NamedPolyline>> {
    // ---
    let doc = Document::parse_with_options(kml, lenient_options()).map_err(|e| {
        warn!("KML document is not well-formed XML: {}", e);
        Error::KmlParse(e)
    })?;

    let placemarks: Vec<Node> = doc
        .descendants()
        .filter(|n| is_kml_element(n, "Placemark"))
        .collect();

    let tracks: Vec<NamedPolyline> = placemarks
        .iter()
        .enumerate()
        .filter_map(|(index, placemark)| placemark_track(*placemark, index))
        .collect();

    debug!(
        "KML: {} of {} placemarks produced a path",
        tracks.len(),
        placemarks.len()
    );
    Ok(tracks)
}

/// Decode raw KML bytes by their declared encoding and parse them.
pub fn parse_kml_tracks_bytes(bytes: &[u8]) -> Result<Vec<NamedPolyline>> {
    let kml = decode_xml(bytes, "KML document")?;
    parse_kml_tracks(&kml)
}

/// Parse a KML `coordinates` text into points, skipping malformed tuples.
pub fn parse_coordinates(text: &str) -> Vec<GeoPoint> {
    // ---
    text.split_whitespace()
        .filter_map(|token| match parse_coordinate_tuple(token) {
            Ok(point) => Some(point),
            Err(e) => {
                debug!("Skipping KML coordinate: {}", e);
                None
            }
        })
        .collect()
}

fn parse_coordinate_tuple(token: &str) -> std::result::Result<GeoPoint, FieldError> {
    // ---
    let malformed = || FieldError::MalformedCoordinate(token.to_string());

    let mut parts = token.split(',').map(str::trim);
    let lon: f64 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)?;
    let lat: f64 = parts
        .next()
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)?;

    GeoPoint::new(lat, lon).ok_or_else(malformed)
}

fn placemark_track(placemark: Node, index: usize) -> Option<NamedPolyline> {
    // ---
    let coordinates = placemark
        .descendants()
        .filter(|n| is_kml_element(n, "LineString"))
        .find_map(|line| line.children().find(|n| is_kml_element(n, "coordinates")))?;

    let text: String = coordinates
        .children()
        .filter(|c| c.is_text())
        .filter_map(|c| c.text())
        .collect();

    let name = child_text(placemark, "name").trim().to_string();
    let name = if name.is_empty() {
        format!("unnamed-path-{index}")
    } else {
        name
    };

    assemble_polyline(name, parse_coordinates(&text))
}

/// Element named `name` in the KML namespace, or in no namespace at all.
fn is_kml_element(node: &Node, name: &str) -> bool {
    // ---
    let tag = node.tag_name();
    node.is_element()
        && tag.name() == name
        && tag.namespace().map_or(true, |ns| ns == KML_NAMESPACE)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn kml(placemarks: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><name>Tracks</name>{placemarks}</Document></kml>"#
        )
    }

    #[test]
    fn test_valid_and_empty_placemarks() {
        // ---
        let doc = kml(
            r#"<Placemark><name>MAWAR</name><LineString><coordinates>
                125.0,15.0,0 126.0,15.5,0
                127.0,16.0,0
            </coordinates></LineString></Placemark>
            <Placemark><name>Empty</name><LineString><coordinates>  </coordinates></LineString></Placemark>"#,
        );

        let tracks = parse_kml_tracks(&doc).unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].name, "MAWAR");
        assert_eq!(
            tracks[0].path,
            vec![
                GeoPoint { lat: 15.0, lon: 125.0 },
                GeoPoint { lat: 15.5, lon: 126.0 },
                GeoPoint { lat: 16.0, lon: 127.0 },
            ]
        );
    }

    #[test]
    fn test_bad_tokens_are_skipped() {
        // ---
        let doc = kml(
            "<Placemark><name>Partial</name><LineString><coordinates>\
             121.5,23.5 abc,23.0 122.0 122.5,x 123.0,24.0,100 200.0,10.0\
             </coordinates></LineString></Placemark>",
        );

        let tracks = parse_kml_tracks(&doc).unwrap();

        assert_eq!(tracks.len(), 1);
        assert_eq!(
            tracks[0].path,
            vec![
                GeoPoint { lat: 23.5, lon: 121.5 },
                GeoPoint { lat: 24.0, lon: 123.0 },
            ]
        );
    }

    #[test]
    fn test_unnamed_and_non_line_placemarks() {
        // ---
        let doc = kml(
            "<Placemark><name>Station</name><Point><coordinates>121.0,25.0</coordinates></Point></Placemark>\
             <Placemark><LineString><coordinates>120,22 121,23</coordinates></LineString></Placemark>\
             <Placemark><name>  </name><MultiGeometry><LineString><coordinates>130,20</coordinates></LineString></MultiGeometry></Placemark>",
        );

        let tracks = parse_kml_tracks(&doc).unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].name, "unnamed-path-1");
        assert_eq!(tracks[0].path.len(), 2);
        assert_eq!(tracks[1].name, "unnamed-path-2");
        assert_eq!(tracks[1].path, vec![GeoPoint { lat: 20.0, lon: 130.0 }]);
    }

    #[test]
    fn test_no_placemarks_is_empty_not_error() {
        // ---
        let tracks = parse_kml_tracks(&kml("")).unwrap();
        assert!(tracks.is_empty());
    }

    #[test]
    fn test_namespace_free_kml() {
        // ---
        let doc = "<kml><Placemark><name>Plain</name><LineString>\
                   <coordinates>121,24 122,25</coordinates></LineString></Placemark></kml>";

        let tracks = parse_kml_tracks(doc).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].path.len(), 2);
    }

    #[test]
    fn test_foreign_namespace_ignored() {
        // ---
        let doc = r#"<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:x="urn:other">
            <x:Placemark><name>Foreign</name><LineString><coordinates>121,24</coordinates></LineString></x:Placemark>
        </kml>"#;

        assert!(parse_kml_tracks(doc).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_kml() {
        // ---
        let result = parse_kml_tracks("<kml><Placemark></kml>");
        assert!(matches!(result, Err(Error::KmlParse(_))));
    }
}
