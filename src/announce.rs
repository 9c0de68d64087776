//! Spoken summaries of upcoming arrivals.

use crate::arrivals::{ArrivalRecord, Direction};

/// Most arrivals announced per source line.
pub const PER_SOURCE_CAP: usize = 2;

/// Sentence spoken when no arrivals match.
pub fn empty_message(station: &str, filter: Option<Direction>) -> String {
    match filter {
        Some(direction) => format!("No upcoming {direction} trains found for {station}."),
        None => format!("No upcoming trains found for {station}."),
    }
}

fn render(record: &ArrivalRecord) -> String {
    format!(
        "{} {} train in {} mins",
        record.direction, record.route_id, record.minutes_until_arrival
    )
}

/// Builds the announcement for an already sorted arrival list.
///
/// Records are partitioned by source line, one partition per entry of
/// `source_tags` in that order; each contributes at most
/// [`PER_SOURCE_CAP`] entries and empty partitions are skipped. Records
/// from a source not in `source_tags` are not announced. Returns `None`
/// when every partition is empty.
pub fn compose_arrivals(
    arrivals: &[ArrivalRecord],
    source_tags: &[&str],
    filter: Option<Direction>,
    station: &str,
) -> Option<String> {
    let body = source_tags
        .iter()
        .map(|tag| {
            arrivals
                .iter()
                .filter(|r| r.source_line == *tag)
                .filter(|r| filter.is_none_or(|d| r.direction == d))
                .take(PER_SOURCE_CAP)
                .map(render)
                .collect::<Vec<_>>()
        })
        .filter(|entries| !entries.is_empty())
        .map(|entries| entries.join(", "))
        .collect::<Vec<_>>()
        .join(" and ");

    if body.is_empty() {
        return None;
    }

    Some(match filter {
        Some(direction) => format!("Next {direction} trains at {station}: {body}"),
        None => format!("Next trains at {station}: {body}"),
    })
}

/// Like [`compose_arrivals`], falling back to [`empty_message`].
pub fn compose(
    arrivals: &[ArrivalRecord],
    source_tags: &[&str],
    filter: Option<Direction>,
    station: &str,
) -> String {
    compose_arrivals(arrivals, source_tags, filter, station)
        .unwrap_or_else(|| empty_message(station, filter))
}
