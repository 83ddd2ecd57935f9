//! Station and trip records.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrafficError};
use crate::minute::{MinuteOfDay, parse_timestamp};

/// Short key identifying a station; trips refer to stations by this key.
pub type StationKey = String;

/// One bicycle rental.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub ride_id: Option<String>,
    pub bike_type: Option<String>,
    pub is_member: Option<bool>,
    pub start_station_id: StationKey,
    pub end_station_id: StationKey,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

impl Trip {
    pub fn new(
        start_station_id: impl Into<StationKey>,
        end_station_id: impl Into<StationKey>,
        started_at: NaiveDateTime,
        ended_at: NaiveDateTime,
    ) -> Self {
        Self {
            ride_id: None,
            bike_type: None,
            is_member: None,
            start_station_id: start_station_id.into(),
            end_station_id: end_station_id.into(),
            started_at,
            ended_at,
        }
    }

    pub fn departure_minute(&self) -> MinuteOfDay {
        MinuteOfDay::from_time(&self.started_at)
    }

    pub fn arrival_minute(&self) -> MinuteOfDay {
        MinuteOfDay::from_time(&self.ended_at)
    }
}

/// A trip row as it appears in the trips CSV, before timestamp validation.
#[derive(Debug, Deserialize)]
pub struct TripRecord {
    #[serde(default)]
    pub ride_id: Option<String>,
    #[serde(default)]
    pub bike_type: Option<String>,
    #[serde(default)]
    pub is_member: Option<String>,
    pub start_station_id: String,
    pub end_station_id: String,
    pub started_at: String,
    pub ended_at: String,
}

impl TryFrom<TripRecord> for Trip {
    type Error = TrafficError;

    fn try_from(record: TripRecord) -> Result<Self> {
        Ok(Trip {
            ride_id: record.ride_id.filter(|id| !id.is_empty()),
            bike_type: record.bike_type.filter(|t| !t.is_empty()),
            is_member: record.is_member.as_deref().and_then(parse_flag),
            start_station_id: record.start_station_id,
            end_station_id: record.end_station_id,
            started_at: parse_timestamp(&record.started_at)?,
            ended_at: parse_timestamp(&record.ended_at)?,
        })
    }
}

/// Reads a membership flag written as `1`/`0` or `true`/`false`; anything else is unknown.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "member" => Some(true),
        "0" | "false" | "casual" => Some(false),
        _ => None,
    }
}

/// A docking station. Traffic fields are derived and overwritten by every query.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Station {
    #[serde(rename = "short_name")]
    pub key: StationKey,
    #[serde(default)]
    pub station_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub capacity: Option<u32>,

    #[serde(default)]
    pub arrivals: usize,
    #[serde(default)]
    pub departures: usize,
    #[serde(default)]
    pub total_traffic: usize,
}

impl Station {
    pub fn new(key: impl Into<StationKey>, lon: f64, lat: f64) -> Self {
        Self {
            key: key.into(),
            station_id: None,
            name: None,
            lon,
            lat,
            capacity: None,
            arrivals: 0,
            departures: 0,
            total_traffic: 0,
        }
    }

    pub fn set_traffic(&mut self, arrivals: usize, departures: usize) {
        self.arrivals = arrivals;
        self.departures = departures;
        self.total_traffic = arrivals + departures;
    }

    /// Share of traffic that departs from this station, `None` when it saw no traffic.
    pub fn departure_ratio(&self) -> Option<f64> {
        if self.total_traffic == 0 {
            None
        } else {
            Some(self.departures as f64 / self.total_traffic as f64)
        }
    }

    pub fn flow_balance(&self) -> Option<FlowBalance> {
        self.departure_ratio().map(FlowBalance::from_ratio)
    }
}

/// Departure ratio quantized into three equal bins over `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowBalance {
    Arrivals,
    Balanced,
    Departures,
}

impl FlowBalance {
    pub fn from_ratio(ratio: f64) -> Self {
        let bin = (ratio.clamp(0.0, 1.0) * 3.0).floor() as usize;
        match bin {
            0 => FlowBalance::Arrivals,
            1 => FlowBalance::Balanced,
            _ => FlowBalance::Departures,
        }
    }
}
