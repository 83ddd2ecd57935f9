//! Minute-bucketed traffic index.
//!
//! Trips are bucketed once by departure and arrival minute-of-day. Queries then
//! only touch the slots inside the requested window, so their cost follows the
//! number of trips near the selected time rather than the size of the dataset.

use std::collections::HashMap;

use tracing::debug;

use crate::minute::{MINUTES_PER_DAY, MinuteOfDay, TimeFilter, Window};
use crate::model::{Station, Trip};

/// Per-station departure and arrival counts for one time filter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrafficCounts<'a> {
    departures: HashMap<&'a str, usize>,
    arrivals: HashMap<&'a str, usize>,
}

impl<'a> TrafficCounts<'a> {
    /// Departures from `key`; stations absent from the window count zero.
    pub fn departures(&self, key: &str) -> usize {
        self.departures.get(key).copied().unwrap_or(0)
    }

    /// Arrivals at `key`; stations absent from the window count zero.
    pub fn arrivals(&self, key: &str) -> usize {
        self.arrivals.get(key).copied().unwrap_or(0)
    }

    pub fn total_departures(&self) -> usize {
        self.departures.values().sum()
    }

    pub fn total_arrivals(&self) -> usize {
        self.arrivals.values().sum()
    }

    /// Every station key that appears in the window, sorted.
    pub fn keys(&self) -> Vec<&'a str> {
        let mut keys: Vec<&'a str> = self
            .departures
            .keys()
            .chain(self.arrivals.keys())
            .copied()
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

/// Trips bucketed into 1440 departure slots and 1440 arrival slots.
///
/// Built once; read-only afterwards.
#[derive(Debug)]
pub struct TrafficIndex {
    trips: Vec<Trip>,
    departures: Vec<Vec<usize>>,
    arrivals: Vec<Vec<usize>>,
    window: Window,
}

impl TrafficIndex {
    /// Buckets `trips` using the default ±60 minute window.
    pub fn build(trips: Vec<Trip>) -> Self {
        Self::with_window(trips, Window::default())
    }

    pub fn with_window(trips: Vec<Trip>, window: Window) -> Self {
        let slots = MINUTES_PER_DAY as usize;
        let mut departures = vec![Vec::new(); slots];
        let mut arrivals = vec![Vec::new(); slots];

        for (i, trip) in trips.iter().enumerate() {
            departures[trip.departure_minute().index()].push(i);
            arrivals[trip.arrival_minute().index()].push(i);
        }

        debug!(
            trips = trips.len(),
            window_minutes = window.half_width(),
            "Traffic index built"
        );

        Self {
            trips,
            departures,
            arrivals,
            window,
        }
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn window(&self) -> Window {
        self.window
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn departures_at(&self, minute: MinuteOfDay) -> impl Iterator<Item = &Trip> {
        self.departures[minute.index()]
            .iter()
            .map(|&i| &self.trips[i])
    }

    pub fn arrivals_at(&self, minute: MinuteOfDay) -> impl Iterator<Item = &Trip> {
        self.arrivals[minute.index()].iter().map(|&i| &self.trips[i])
    }

    /// Groups the trips selected by `filter` by station.
    ///
    /// Departures are keyed by start station, arrivals by end station. The maps
    /// are rebuilt from scratch on every call.
    pub fn counts(&self, filter: TimeFilter) -> TrafficCounts<'_> {
        let mut counts = TrafficCounts::default();

        for i in self.select(&self.departures, filter) {
            *counts
                .departures
                .entry(self.trips[i].start_station_id.as_str())
                .or_default() += 1;
        }

        for i in self.select(&self.arrivals, filter) {
            *counts
                .arrivals
                .entry(self.trips[i].end_station_id.as_str())
                .or_default() += 1;
        }

        counts
    }

    /// Sets `arrivals`, `departures` and `total_traffic` on every station for `filter`.
    pub fn query(&self, stations: &mut [Station], filter: TimeFilter) {
        let counts = self.counts(filter);

        for station in stations.iter_mut() {
            let arrivals = counts.arrivals(&station.key);
            let departures = counts.departures(&station.key);
            station.set_traffic(arrivals, departures);
        }

        debug!(
            filter = filter.as_raw(),
            stations = stations.len(),
            departures = counts.total_departures(),
            arrivals = counts.total_arrivals(),
            "Station traffic computed"
        );
    }

    fn select<'s>(
        &'s self,
        table: &'s [Vec<usize>],
        filter: TimeFilter,
    ) -> impl Iterator<Item = usize> + 's {
        let ranges = match filter {
            TimeFilter::Any => vec![0..table.len()],
            TimeFilter::At(center) => self.window.slot_ranges(center),
        };

        ranges
            .into_iter()
            .flat_map(move |r| table[r].iter().flatten().copied())
    }
}
