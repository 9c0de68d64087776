//! Arrival extraction and aggregation.
//!
//! Turns decoded GTFS-RT snapshots into [`ArrivalRecord`]s for one target
//! station and merges the per-source lists into a single list ordered by
//! minutes until arrival.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FetchFailure;
use crate::gtfs_rt::FeedMessage;
use crate::gtfs_rt::trip_update::StopTimeUpdate;

/// Outcome of fetching one source: a decoded snapshot or the reason there
/// is none.
pub type FetchOutcome = Result<FeedMessage, FetchFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Uptown,
    Downtown,
}

impl Direction {
    /// Classifies a stop by the direction letter in its id.
    ///
    /// NYCT stop ids end in `N` or `S` (`A17N`, `A17S`). Any id containing
    /// an `N` anywhere is Uptown; everything else is Downtown.
    pub fn from_stop_id(stop_id: &str) -> Self {
        if stop_id.contains('N') {
            Direction::Uptown
        } else {
            Direction::Downtown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Uptown => "Uptown",
            Direction::Downtown => "Downtown",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uptown" | "north" | "northbound" | "n" => Ok(Direction::Uptown),
            "downtown" | "south" | "southbound" | "s" => Ok(Direction::Downtown),
            other => Err(format!("unknown direction {other:?}")),
        }
    }
}

/// One predicted train arrival at the target station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalRecord {
    pub route_id: String,
    pub source_line: String,
    pub direction: Direction,
    pub arrival_instant: DateTime<Utc>,
    pub minutes_until_arrival: i64,
    pub stop_id: String,
}

/// Walks a snapshot and emits every future arrival at `station_id`.
///
/// A failed fetch contributes nothing. Records come out in feed order; the
/// caller is expected to [`aggregate`] them.
pub fn extract_arrivals(
    snapshot: &FetchOutcome,
    station_id: &str,
    source_tag: &str,
    now: DateTime<Utc>,
) -> Vec<ArrivalRecord> {
    let Ok(feed) = snapshot else {
        return Vec::new();
    };

    let mut records = Vec::new();

    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        let route_id = trip_update.trip.route_id.clone().unwrap_or_default();

        for update in &trip_update.stop_time_update {
            let Some(stop_id) = update.stop_id.as_deref() else {
                continue;
            };
            if !stop_id.starts_with(station_id) {
                continue;
            }
            let Some(arrival_instant) = predicted_time(update) else {
                continue;
            };
            if arrival_instant <= now {
                continue;
            }

            records.push(ArrivalRecord {
                route_id: route_id.clone(),
                source_line: source_tag.to_string(),
                direction: Direction::from_stop_id(stop_id),
                arrival_instant,
                minutes_until_arrival: minutes_between(now, arrival_instant),
                stop_id: stop_id.to_string(),
            });
        }
    }

    records
}

/// Arrival time if an arrival event is present, otherwise departure time.
///
/// An arrival event without a time does not fall back to departure, and an
/// epoch of zero counts as unset.
fn predicted_time(update: &StopTimeUpdate) -> Option<DateTime<Utc>> {
    let seconds = match (&update.arrival, &update.departure) {
        (Some(arrival), _) => arrival.time,
        (None, Some(departure)) => departure.time,
        (None, None) => None,
    }?;
    if seconds == 0 {
        return None;
    }
    DateTime::from_timestamp(seconds, 0)
}

fn minutes_between(now: DateTime<Utc>, then: DateTime<Utc>) -> i64 {
    let millis = (then - now).num_milliseconds() as f64;
    (millis / 60_000.0).round() as i64
}

/// Concatenates per-source lists (in source order) and sorts by minutes
/// until arrival. The sort is stable, so equal minutes keep source order
/// and then feed order.
pub fn aggregate<I>(per_source: I) -> Vec<ArrivalRecord>
where
    I: IntoIterator<Item = Vec<ArrivalRecord>>,
{
    let mut all: Vec<ArrivalRecord> = per_source.into_iter().flatten().collect();
    all.sort_by_key(|record| record.minutes_until_arrival);
    all
}
