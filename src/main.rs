//! CLI entry point for the bikeshare traffic tool.
//!
//! Loads station and trip datasets, builds the minute-bucketed index, and
//! reports per-station traffic for one time of day or for a sweep across the day.

use anyhow::{Context, Result, bail};
use bikeshare_traffic::{
    config::TrafficConfig,
    fetch::{BasicClient, read_source},
    index::TrafficIndex,
    loader::{parse_stations, parse_trips},
    minute::{MINUTES_PER_DAY, MinuteOfDay, TimeFilter},
    model::Station,
    output::{append_records, print_json, print_pretty},
    report::{TrafficSnapshot, unmatched_keys},
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bikeshare_traffic")]
#[command(about = "Station traffic by time of day for bike-share trip data", long_about = None)]
struct Cli {
    /// JSON config file with dataset sources and window width
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Station information JSON (path or URL)
    #[arg(long, global = true)]
    stations: Option<String>,

    /// Trip CSV, optionally gzipped (path or URL)
    #[arg(long, global = true)]
    trips: Option<String>,

    /// Half-width of the time window in minutes
    #[arg(short, long, global = true)]
    window: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Station traffic around one minute of the day, or over all trips
    Query {
        /// Minute of the day (0-1439), or -1 for all trips
        #[arg(short, long, default_value_t = -1, allow_negative_numbers = true)]
        time: i32,

        /// Number of busiest stations to log
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// CSV file to append station rows to
        #[arg(short, long)]
        output: Option<String>,

        /// Log the whole snapshot as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Station traffic at regular steps across the whole day
    Sweep {
        /// Minutes between successive snapshots
        #[arg(short, long, default_value_t = 60)]
        step: u16,

        /// CSV file to append station rows to
        #[arg(short, long, default_value = "sweep.csv")]
        output: String,
    },
    /// Summarize the loaded datasets
    Stations,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/bikeshare_traffic.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bikeshare_traffic.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    config.window()?;
    let action = plan(cli.command)?;
    let (index, mut stations) = load(&config).await?;

    match action {
        Plan::Query {
            filter,
            top,
            output,
            json,
        } => {
            let snapshot = TrafficSnapshot::capture(&index, &mut stations, filter);

            if json {
                print_json(&snapshot)?;
            } else {
                print_pretty(&snapshot, top);
            }

            if let Some(path) = output {
                append_records(&path, &snapshot.stations)?;
                info!(path = %path, rows = snapshot.stations.len(), "Rows written");
            }
        }
        Plan::Sweep { step, output } => {
            let mut rows_written = 0;
            for minute in (0..MINUTES_PER_DAY).step_by(step as usize) {
                let filter = TimeFilter::At(MinuteOfDay::new(minute)?);
                let snapshot = TrafficSnapshot::capture(&index, &mut stations, filter);
                info!(
                    time = %snapshot.time_label,
                    departures = snapshot.total_departures,
                    arrivals = snapshot.total_arrivals,
                    max_traffic = snapshot.max_traffic,
                    "Sweep step"
                );
                append_records(&output, &snapshot.stations)?;
                rows_written += snapshot.stations.len();
            }

            info!(path = %output, rows = rows_written, "Sweep complete");
        }
        Plan::Stations => {
            let counts = index.counts(TimeFilter::Any);
            let unmatched = unmatched_keys(&counts, &stations);
            let active = stations
                .iter()
                .filter(|s| counts.departures(&s.key) + counts.arrivals(&s.key) > 0)
                .count();

            info!(
                stations = stations.len(),
                active_stations = active,
                trips = index.len(),
                unmatched_keys = unmatched.len(),
                "Dataset summary"
            );

            for key in unmatched {
                warn!(
                    station = key,
                    departures = counts.departures(key),
                    arrivals = counts.arrivals(key),
                    "Trips reference a station with no station record"
                );
            }
        }
    }

    Ok(())
}

/// A subcommand whose arguments have been checked.
#[derive(Debug, PartialEq)]
enum Plan {
    Query {
        filter: TimeFilter,
        top: usize,
        output: Option<String>,
        json: bool,
    },
    Sweep {
        step: u16,
        output: String,
    },
    Stations,
}

/// Rejects bad arguments before any dataset is downloaded.
fn plan(command: Commands) -> Result<Plan> {
    match command {
        Commands::Query {
            time,
            top,
            output,
            json,
        } => Ok(Plan::Query {
            filter: TimeFilter::from_raw(time)?,
            top,
            output,
            json,
        }),
        Commands::Sweep { step, output } => {
            if step == 0 || step >= MINUTES_PER_DAY {
                bail!("step must be between 1 and {} minutes", MINUTES_PER_DAY - 1);
            }
            Ok(Plan::Sweep { step, output })
        }
        Commands::Stations => Ok(Plan::Stations),
    }
}

/// Defaults, then the config file, then the environment, then CLI flags.
fn resolve_config(cli: &Cli) -> Result<TrafficConfig> {
    let config = match &cli.config {
        Some(path) => TrafficConfig::load(path)?,
        None => TrafficConfig::default(),
    };
    let mut config = config.with_env()?;

    if let Some(stations) = &cli.stations {
        config.stations_source = stations.clone();
    }
    if let Some(trips) = &cli.trips {
        config.trips_source = trips.clone();
    }
    if let Some(window) = cli.window {
        config.window_minutes = window;
    }

    Ok(config)
}

/// Downloads or reads both datasets and builds the index.
#[tracing::instrument(skip_all, fields(stations = %config.stations_source, trips = %config.trips_source))]
async fn load(config: &TrafficConfig) -> Result<(TrafficIndex, Vec<Station>)> {
    let window = config.window()?;
    let client = BasicClient::with_timeout(Duration::from_secs(300))?;

    let (station_bytes, trip_bytes) = tokio::try_join!(
        read_source(&client, &config.stations_source),
        read_source(&client, &config.trips_source),
    )?;

    let stations = parse_stations(&station_bytes).context("failed to parse stations")?;
    let trips = parse_trips(&trip_bytes).context("failed to parse trips")?;

    let index = TrafficIndex::with_window(trips, window);
    info!(
        stations = stations.len(),
        trips = index.len(),
        window_minutes = window.half_width(),
        "Datasets loaded"
    );

    Ok((index, stations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bikeshare_traffic::TrafficError;

    fn query(time: i32) -> Commands {
        Commands::Query {
            time,
            top: 10,
            output: None,
            json: false,
        }
    }

    fn sweep(step: u16) -> Commands {
        Commands::Sweep {
            step,
            output: "sweep.csv".to_string(),
        }
    }

    #[test]
    fn test_plan_decodes_time_filter() {
        match plan(query(-1)).unwrap() {
            Plan::Query { filter, .. } => assert_eq!(filter, TimeFilter::Any),
            other => panic!("unexpected plan: {other:?}"),
        }
        match plan(query(500)).unwrap() {
            Plan::Query { filter, .. } => assert_eq!(filter.as_raw(), 500),
            other => panic!("unexpected plan: {other:?}"),
        }
    }

    #[test]
    fn test_plan_rejects_out_of_range_time() {
        let err = plan(query(5000)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrafficError>(),
            Some(TrafficError::InvalidTimeFilter(5000))
        ));
        assert!(plan(query(-2)).is_err());
    }

    #[test]
    fn test_plan_checks_sweep_step() {
        assert!(plan(sweep(0)).is_err());
        assert!(plan(sweep(MINUTES_PER_DAY)).is_err());
        assert_eq!(
            plan(sweep(15)).unwrap(),
            Plan::Sweep {
                step: 15,
                output: "sweep.csv".to_string()
            }
        );
        assert_eq!(plan(Commands::Stations).unwrap(), Plan::Stations);
    }

    #[test]
    fn test_cli_parses_negative_time() {
        let cli = Cli::try_parse_from(["bikeshare_traffic", "query", "--time", "-1"]).unwrap();
        assert_eq!(
            plan(cli.command).unwrap(),
            Plan::Query {
                filter: TimeFilter::Any,
                top: 10,
                output: None,
                json: false
            }
        );
    }
}
