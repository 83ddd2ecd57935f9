//! Serializable traffic snapshots for one time filter.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::index::{TrafficCounts, TrafficIndex};
use crate::minute::TimeFilter;
use crate::model::{FlowBalance, Station};

/// One station's traffic, flattened for CSV and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationTraffic {
    pub time_filter: i32,
    pub time_label: String,
    pub station: String,
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub arrivals: usize,
    pub departures: usize,
    pub total_traffic: usize,
    pub departure_ratio: Option<f64>,
    pub flow_balance: Option<FlowBalance>,
}

impl StationTraffic {
    pub fn from_station(station: &Station, filter: TimeFilter) -> Self {
        StationTraffic {
            time_filter: filter.as_raw(),
            time_label: filter.label(),
            station: station.key.clone(),
            name: station.name.clone(),
            lat: station.lat,
            lon: station.lon,
            arrivals: station.arrivals,
            departures: station.departures,
            total_traffic: station.total_traffic,
            departure_ratio: station.departure_ratio(),
            flow_balance: station.flow_balance(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TrafficSnapshot {
    pub generated_at: DateTime<Utc>,
    pub time_filter: i32,
    pub time_label: String,
    pub window_minutes: u16,
    pub total_departures: usize,
    pub total_arrivals: usize,
    pub max_traffic: usize,
    pub active_stations: usize,
    pub stations: Vec<StationTraffic>,
}

impl TrafficSnapshot {
    /// Runs `filter` against `stations` and records the result, busiest stations first.
    pub fn capture(index: &TrafficIndex, stations: &mut [Station], filter: TimeFilter) -> Self {
        index.query(stations, filter);

        let mut rows: Vec<StationTraffic> = stations
            .iter()
            .map(|s| StationTraffic::from_station(s, filter))
            .collect();
        rows.sort_by(|a, b| {
            b.total_traffic
                .cmp(&a.total_traffic)
                .then_with(|| a.station.cmp(&b.station))
        });

        TrafficSnapshot {
            generated_at: Utc::now(),
            time_filter: filter.as_raw(),
            time_label: filter.label(),
            window_minutes: index.window().half_width(),
            total_departures: rows.iter().map(|r| r.departures).sum(),
            total_arrivals: rows.iter().map(|r| r.arrivals).sum(),
            max_traffic: rows.first().map_or(0, |r| r.total_traffic),
            active_stations: rows.iter().filter(|r| r.total_traffic > 0).count(),
            stations: rows,
        }
    }

    /// The `n` busiest stations.
    pub fn top(&self, n: usize) -> &[StationTraffic] {
        &self.stations[..n.min(self.stations.len())]
    }
}

/// Station keys that trips refer to but that match no station record.
///
/// Traffic for these keys is never attributed to any station.
pub fn unmatched_keys<'a>(counts: &TrafficCounts<'a>, stations: &[Station]) -> Vec<&'a str> {
    let known: HashSet<&str> = stations.iter().map(|s| s.key.as_str()).collect();
    counts
        .keys()
        .into_iter()
        .filter(|k| !known.contains(k))
        .collect()
}
