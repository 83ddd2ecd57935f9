//! Parsers for the station JSON and trip CSV datasets.

use anyhow::Result;
use serde::Deserialize;
use tracing::info;

use crate::error::TrafficError;
use crate::model::{Station, Trip, TripRecord};

#[derive(Deserialize)]
#[serde(untagged)]
enum StationDocument {
    Gbfs { data: StationData },
    List(Vec<Station>),
}

#[derive(Deserialize)]
struct StationData {
    stations: Vec<Station>,
}

/// Decodes stations from a GBFS `station_information` document or a bare JSON array.
///
/// # Errors
///
/// Returns an error if the bytes are neither shape.
pub fn parse_stations(bytes: &[u8]) -> Result<Vec<Station>> {
    let stations = match serde_json::from_slice(bytes)? {
        StationDocument::Gbfs { data } => data.stations,
        StationDocument::List(stations) => stations,
    };
    info!(count = stations.len(), "Stations parsed");
    Ok(stations)
}

/// Decodes trips from CSV with `started_at`, `ended_at`, `start_station_id` and
/// `end_station_id` columns. Other columns are ignored.
///
/// # Errors
///
/// Fails on the first malformed row; timestamp failures carry the 1-based data row.
pub fn parse_trips(bytes: &[u8]) -> Result<Vec<Trip>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut trips = Vec::new();

    for (i, result) in rdr.deserialize::<TripRecord>().enumerate() {
        let record = result?;
        let trip = Trip::try_from(record).map_err(|e| TrafficError::InvalidTrip {
            row: i + 1,
            source: Box::new(e),
        })?;
        trips.push(trip);
    }

    info!(count = trips.len(), "Trips parsed");
    Ok(trips)
}
