//! Normalized track assembly.
//!
//! Parsers push individual fixes here; [`TrackAccumulator::finish`] groups
//! them into [`CycloneTrack`]s with sorted past/forecast tracks and a current
//! position. No I/O happens in this module.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::models::{CycloneTrack, GeoPoint, NamedPolyline, TrackPoint};
use crate::parsers::atcf::INVEST_NAME;

/// Display name used until a record supplies one.
pub const UNKNOWN_NAME: &str = "unknown";

// ---

/// Whether a fix is an observed best-track position or model/forecast output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixKind {
    BestTrack,
    Forecast,
}

/// Routing of zero-hour fixes that are not best-track records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ZeroHourPolicy {
    /// Only best-track zero-hour fixes are history; the zero-hour analysis of a
    /// forecast run stays with the forecast track.
    #[default]
    ForecastRun,
    /// Any zero-hour fix is a candidate for the current position. Non-best
    /// analyses are kept out of both tracks; the latest analysis wins over an
    /// older or equally old best-track fix.
    AnalysisAsCurrent,
}

/// How to choose one track out of a bulletin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// The lexicographically greatest identifier, i.e. the most recently
    /// numbered storm.
    Latest,
    /// An exact cyclone identifier.
    Id(String),
}

/// Real names outrank placeholders; among equals the newer fix wins.
type NameRank = (bool, Option<DateTime<Utc>>);

#[derive(Debug, Default)]
struct TrackGroup {
    name: Option<(NameRank, String)>,
    past: Vec<TrackPoint>,
    forecast: Vec<TrackPoint>,
    analyses: Vec<TrackPoint>,
}

/// Collects fixes per cyclone identifier.
#[derive(Debug)]
pub struct TrackAccumulator {
    agency: String,
    policy: ZeroHourPolicy,
    groups: BTreeMap<String, TrackGroup>,
}

impl TrackAccumulator {
    pub fn new(agency: impl Into<String>, policy: ZeroHourPolicy) -> Self {
        // ---
        Self {
            agency: agency.into(),
            policy,
            groups: BTreeMap::new(),
        }
    }

    /// Add one fix. A non-empty `name` replaces the cyclone's current name
    /// unless that one belongs to a newer fix or the new one is an `INVEST`
    /// placeholder replacing a real name.
    pub fn push(&mut self, id: &str, name: Option<&str>, kind: FixKind, point: TrackPoint) {
        // ---
        let group = self.groups.entry(id.to_string()).or_default();

        if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
            let rank = (!is_placeholder_name(name), point.time);
            if group.name.as_ref().map_or(true, |(best, _)| rank >= *best) {
                group.name = Some((rank, name.to_string()));
            }
        }

        let zero_hour = point.forecast_period_hours == 0;
        match (kind, zero_hour, self.policy) {
            (FixKind::BestTrack, true, _) => group.past.push(point),
            (FixKind::Forecast, true, ZeroHourPolicy::AnalysisAsCurrent) => {
                group.analyses.push(point)
            }
            _ => group.forecast.push(point),
        }
    }

    /// Sort every group and produce the final tracks keyed by identifier.
    pub fn finish(self) -> BTreeMap<String, CycloneTrack> {
        // ---
        let agency = self.agency;

        self.groups
            .into_iter()
            .map(|(id, mut group)| {
                group.past.sort_by_key(|p| p.time);
                group.forecast.sort_by_key(|p| p.forecast_period_hours);

                let latest_best = group.past.last().cloned();
                let latest_analysis = group.analyses.into_iter().max_by_key(|p| p.time);
                let current_position = match (latest_best, latest_analysis) {
                    (Some(best), Some(analysis)) if best.time > analysis.time => Some(best),
                    (best, analysis) => analysis.or(best),
                };

                let track = CycloneTrack {
                    id: id.clone(),
                    name: group
                        .name
                        .map(|(_, name)| name)
                        .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                    agency: agency.clone(),
                    current_position,
                    past_track: group.past,
                    forecast_track: group.forecast,
                };
                (id, track)
            })
            .collect()
    }
}

/// Pick one track. Tracks with neither past nor forecast fixes are never chosen.
pub fn select_track<'a>(
    tracks: &'a BTreeMap<String, CycloneTrack>,
    selector: &Selector,
) -> Option<&'a CycloneTrack> {
    // ---
    match selector {
        Selector::Latest => tracks.values().rev().find(|t| !t.is_empty()),
        Selector::Id(id) => tracks.get(id).filter(|t| !t.is_empty()),
    }
}

fn is_placeholder_name(name: &str) -> bool {
    name.split_whitespace()
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case(INVEST_NAME))
}

/// Wrap a parsed path; an empty path is not a track.
pub fn assemble_polyline(name: String, path: Vec<GeoPoint>) -> Option<NamedPolyline> {
    (!path.is_empty()).then_some(NamedPolyline { name, path })
}
