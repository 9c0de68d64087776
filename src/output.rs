//! Output of arrival lists for the command-line tools.
//!
//! Supports structured logging and CSV append.

use anyhow::Result;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::{debug, info};

use crate::arrivals::ArrivalRecord;

/// Logs each arrival as a structured event.
pub fn log_arrivals(station: &str, arrivals: &[ArrivalRecord]) {
    info!(station, count = arrivals.len(), "Upcoming trains");
    for record in arrivals {
        info!(
            route_id = %record.route_id,
            source = %record.source_line,
            direction = %record.direction,
            minutes = record.minutes_until_arrival,
            stop_id = %record.stop_id,
            "Arrival"
        );
    }
}

/// Appends arrivals as rows to a CSV file.
///
/// Writes the header row only when the file is missing or empty.
pub fn append_records(path: &str, arrivals: &[ArrivalRecord]) -> Result<()> {
    let has_content = Path::new(path)
        .metadata()
        .map(|m| m.len() > 0)
        .unwrap_or(false);
    debug!(path, has_content, rows = arrivals.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content)
        .from_writer(file);

    for record in arrivals {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}
