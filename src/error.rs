//! Error type for the traffic index and its input parsing.

/// Errors raised when input falls outside the domain the index understands.
#[derive(thiserror::Error, Debug)]
pub enum TrafficError {
    #[error("time filter {0} is outside -1 or 0..=1439")]
    InvalidTimeFilter(i32),
    #[error("minute of day {0} is outside 0..=1439")]
    InvalidMinute(u16),
    #[error("window half-width {0} is outside 1..=719 minutes")]
    InvalidWindow(u16),
    #[error("unrecognized timestamp '{value}'")]
    InvalidTimestamp { value: String },
    #[error("trip row {row}: {source}")]
    InvalidTrip {
        row: usize,
        #[source]
        source: Box<TrafficError>,
    },
}

pub type Result<T> = std::result::Result<T, TrafficError>;
