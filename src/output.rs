//! Output formatting and persistence for traffic snapshots.
//!
//! Supports a logged summary, JSON serialization, and CSV append.

use anyhow::Result;
use tracing::{debug, info};

use crate::report::{StationTraffic, TrafficSnapshot};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs the snapshot totals and its `top` busiest stations.
pub fn print_pretty(snapshot: &TrafficSnapshot, top: usize) {
    info!(
        time = %snapshot.time_label,
        window_minutes = snapshot.window_minutes,
        departures = snapshot.total_departures,
        arrivals = snapshot.total_arrivals,
        active_stations = snapshot.active_stations,
        max_traffic = snapshot.max_traffic,
        "Traffic snapshot"
    );

    for (rank, row) in snapshot.top(top).iter().enumerate() {
        info!(
            rank = rank + 1,
            station = %row.station,
            name = row.name.as_deref().unwrap_or(""),
            total = row.total_traffic,
            departures = row.departures,
            arrivals = row.arrivals,
            "{} trips ({} departures, {} arrivals)",
            row.total_traffic,
            row.departures,
            row.arrivals
        );
    }

    debug!("{:#?}", snapshot.top(top));
}

/// Logs the snapshot as pretty-printed JSON.
pub fn print_json(snapshot: &TrafficSnapshot) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

/// Appends station traffic rows to a CSV file.
///
/// Creates the file with headers if it does not already exist. Nothing is
/// written, and no file is created, when `rows` is empty.
pub fn append_records(path: &str, rows: &[StationTraffic]) -> Result<()> {
    if rows.is_empty() {
        debug!(path, "No CSV records to append");
        return Ok(());
    }

    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = rows.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(())
}
