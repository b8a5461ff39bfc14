//! Compass-suffixed coordinate parsing and wind unit conversion.

use crate::error::FieldError;

/// Knots to metres per second.
const KNOT_IN_MPS: f64 = 0.514444;

/// Axis a compass coordinate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn accepts(self, suffix: char) -> bool {
        match self {
            Axis::Latitude => matches!(suffix, 'N' | 'S'),
            Axis::Longitude => matches!(suffix, 'E' | 'W'),
        }
    }

    fn limit(self) -> f64 {
        match self {
            Axis::Latitude => 90.0,
            Axis::Longitude => 180.0,
        }
    }
}

/// Parse an integer-tenths value with a trailing compass letter.
///
/// `"150N"` is `15.0`, `"1234W"` is `-123.4`. `S` and `W` negate; `N` and
/// `E` keep the value positive. Suffixes are case-insensitive.
pub fn parse_compass_coordinate(raw: &str) -> Result<f64, FieldError> {
    // ---
    let malformed = || FieldError::MalformedCoordinate(raw.to_string());

    let trimmed = raw.trim();
    let suffix = trimmed.chars().last().ok_or_else(malformed)?;
    let digits = &trimmed[..trimmed.len() - suffix.len_utf8()];

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let tenths: u64 = digits.parse().map_err(|_| malformed())?;
    let value = tenths as f64 / 10.0;

    match suffix.to_ascii_uppercase() {
        'N' | 'E' => Ok(value),
        'S' | 'W' => Ok(-value),
        _ => Err(malformed()),
    }
}

/// Parse a compass coordinate and check it belongs to `axis` and is in range.
pub fn parse_axis_coordinate(raw: &str, axis: Axis) -> Result<f64, FieldError> {
    // ---
    let on_axis = raw
        .trim()
        .chars()
        .last()
        .is_some_and(|c| axis.accepts(c.to_ascii_uppercase()));

    let value = parse_compass_coordinate(raw)?;
    if !on_axis || value.abs() > axis.limit() {
        return Err(FieldError::MalformedCoordinate(raw.to_string()));
    }
    Ok(value)
}

/// Convert knots to m/s, rounded to one decimal.
pub fn knots_to_mps(knots: u32) -> f64 {
    (f64::from(knots) * KNOT_IN_MPS * 10.0).round() / 10.0
}
