//! Dataset locations and window settings.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::minute::{DEFAULT_WINDOW_MINUTES, Window};

pub const DEFAULT_STATIONS_SOURCE: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-stations.json";
pub const DEFAULT_TRIPS_SOURCE: &str =
    "https://dsc106.com/labs/lab07/data/bluebikes-traffic-2024-03.csv";

pub const STATIONS_ENV: &str = "BIKESHARE_STATIONS";
pub const TRIPS_ENV: &str = "BIKESHARE_TRIPS";
pub const WINDOW_ENV: &str = "BIKESHARE_WINDOW_MINUTES";

/// Where the datasets live and how wide the query window is.
///
/// Stored as a JSON object on disk; every field is optional:
/// ```json
/// {
///   "stations_source": "data/bluebikes-stations.json",
///   "trips_source": "data/bluebikes-traffic-2024-03.csv.gz",
///   "window_minutes": 30
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrafficConfig {
    pub stations_source: String,
    pub trips_source: String,
    pub window_minutes: u16,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            stations_source: DEFAULT_STATIONS_SOURCE.to_string(),
            trips_source: DEFAULT_TRIPS_SOURCE.to_string(),
            window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }
}

impl TrafficConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("invalid config file {path}"))?;
        Ok(config)
    }

    /// Applies `BIKESHARE_*` overrides from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Applies overrides resolved through `lookup`, keyed by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(STATIONS_ENV) {
            self.stations_source = v;
        }
        if let Some(v) = lookup(TRIPS_ENV) {
            self.trips_source = v;
        }
        if let Some(v) = lookup(WINDOW_ENV) {
            self.window_minutes = v
                .trim()
                .parse()
                .with_context(|| format!("{WINDOW_ENV} must be a number of minutes, got '{v}'"))?;
        }
        Ok(self)
    }

    pub fn window(&self) -> Result<Window> {
        Ok(Window::new(self.window_minutes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::fs;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = TrafficConfig::default();
        assert_eq!(config.window_minutes, 60);
        assert_eq!(config.window().unwrap(), Window::default());
        assert!(config.trips_source.ends_with(".csv"));
    }

    #[test]
    fn test_load_partial_file() {
        let path = format!("{}/bikeshare_traffic_test_config.json", env::temp_dir().display());
        fs::write(&path, r#"{"window_minutes": 30}"#).unwrap();

        let config = TrafficConfig::load(&path).unwrap();
        assert_eq!(config.window_minutes, 30);
        assert_eq!(config.stations_source, DEFAULT_STATIONS_SOURCE);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_overrides() {
        let config = TrafficConfig::default()
            .with_overrides(lookup(&[(TRIPS_ENV, "trips.csv"), (WINDOW_ENV, " 45 ")]))
            .unwrap();
        assert_eq!(config.trips_source, "trips.csv");
        assert_eq!(config.window_minutes, 45);
        assert_eq!(config.stations_source, DEFAULT_STATIONS_SOURCE);
    }

    #[test]
    fn test_bad_window_override() {
        let result = TrafficConfig::default().with_overrides(lookup(&[(WINDOW_ENV, "an hour")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_out_of_range_window() {
        let config = TrafficConfig {
            window_minutes: 0,
            ..Default::default()
        };
        assert!(config.window().is_err());
    }
}
