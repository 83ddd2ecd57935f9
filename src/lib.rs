pub mod config;
pub mod error;
pub mod fetch;
pub mod index;
pub mod loader;
pub mod minute;
pub mod model;
pub mod output;
pub mod report;

pub use error::TrafficError;
pub use index::{TrafficCounts, TrafficIndex};
pub use minute::{MinuteOfDay, TimeFilter, Window};
pub use model::{FlowBalance, Station, StationKey, Trip};
