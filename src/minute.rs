//! Minute-of-day arithmetic on the circular 1440-minute clock.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike};
use serde::Serialize;

use crate::error::{Result, TrafficError};

pub const MINUTES_PER_DAY: u16 = 1440;

/// Half-width used when none is configured.
pub const DEFAULT_WINDOW_MINUTES: u16 = 60;

/// A minute of the day, `hour * 60 + minute`, always in `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    pub fn new(minute: u16) -> Result<Self> {
        if minute < MINUTES_PER_DAY {
            Ok(Self(minute))
        } else {
            Err(TrafficError::InvalidMinute(minute))
        }
    }

    /// Minutes since midnight of a wall-clock time. Date and seconds are discarded.
    pub fn from_time<T: Timelike>(time: &T) -> Self {
        // hour() < 24 and minute() < 60, so this never leaves the day.
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn get(self) -> u16 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MinuteOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Which trips a query considers: all of them, or those near a minute of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFilter {
    Any,
    At(MinuteOfDay),
}

impl TimeFilter {
    /// Decodes the slider value: `-1` means no filter, `0..=1439` selects a minute.
    ///
    /// # Errors
    ///
    /// Any other value is rejected with [`TrafficError::InvalidTimeFilter`].
    pub fn from_raw(raw: i32) -> Result<Self> {
        match raw {
            -1 => Ok(TimeFilter::Any),
            0..=1439 => Ok(TimeFilter::At(MinuteOfDay(raw as u16))),
            _ => Err(TrafficError::InvalidTimeFilter(raw)),
        }
    }

    pub fn as_raw(self) -> i32 {
        match self {
            TimeFilter::Any => -1,
            TimeFilter::At(minute) => minute.get() as i32,
        }
    }

    /// Label shown next to the slider.
    pub fn label(self) -> String {
        match self {
            TimeFilter::Any => "any time".to_string(),
            TimeFilter::At(minute) => format_time(minute),
        }
    }
}

/// A symmetric window of `half_width` minutes on either side of a center minute.
///
/// The window is half-open: `[center - half_width, center + half_width)`,
/// wrapping across midnight when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    half_width: u16,
}

impl Window {
    /// # Errors
    ///
    /// A half-width of zero selects nothing and one of 720 or more collapses
    /// the circular range, so both are rejected with [`TrafficError::InvalidWindow`].
    pub fn new(half_width: u16) -> Result<Self> {
        if (1..MINUTES_PER_DAY / 2).contains(&half_width) {
            Ok(Self { half_width })
        } else {
            Err(TrafficError::InvalidWindow(half_width))
        }
    }

    pub fn half_width(self) -> u16 {
        self.half_width
    }

    /// Bounds `(min, max)` of the window around `center`, each in `0..1440`.
    pub fn bounds(self, center: MinuteOfDay) -> (u16, u16) {
        let min = (center.0 + MINUTES_PER_DAY - self.half_width) % MINUTES_PER_DAY;
        let max = (center.0 + self.half_width) % MINUTES_PER_DAY;
        (min, max)
    }

    /// Slot ranges covered by the window: one range, or two when it straddles midnight.
    pub fn slot_ranges(self, center: MinuteOfDay) -> Vec<Range<usize>> {
        let (min, max) = self.bounds(center);
        let (min, max) = (min as usize, max as usize);
        if min <= max {
            vec![min..max]
        } else {
            vec![min..MINUTES_PER_DAY as usize, 0..max]
        }
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            half_width: DEFAULT_WINDOW_MINUTES,
        }
    }
}

/// Formats a minute of the day as `h:mm AM`.
pub fn format_time(minute: MinuteOfDay) -> String {
    let time = NaiveTime::from_hms_opt((minute.0 / 60) as u32, (minute.0 % 60) as u32, 0)
        .unwrap_or(NaiveTime::MIN);
    time.format("%-I:%M %p").to_string()
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a trip timestamp into local wall-clock time.
///
/// Timestamps without an offset are taken as-is. RFC 3339 timestamps keep the
/// wall clock of their own offset.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| TrafficError::InvalidTimestamp {
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minute(m: u16) -> MinuteOfDay {
        MinuteOfDay::new(m).unwrap()
    }

    #[test]
    fn test_minute_bounds() {
        assert!(MinuteOfDay::new(0).is_ok());
        assert!(MinuteOfDay::new(1439).is_ok());
        assert!(matches!(
            MinuteOfDay::new(1440),
            Err(TrafficError::InvalidMinute(1440))
        ));
    }

    #[test]
    fn test_from_time_discards_seconds() {
        let t = NaiveTime::from_hms_opt(13, 45, 59).unwrap();
        assert_eq!(MinuteOfDay::from_time(&t).get(), 13 * 60 + 45);

        let t = NaiveTime::from_hms_opt(23, 59, 59).unwrap();
        assert_eq!(MinuteOfDay::from_time(&t).get(), 1439);
    }

    #[test]
    fn test_time_filter_from_raw() {
        assert_eq!(TimeFilter::from_raw(-1).unwrap(), TimeFilter::Any);
        assert_eq!(TimeFilter::from_raw(0).unwrap(), TimeFilter::At(minute(0)));
        assert_eq!(
            TimeFilter::from_raw(1439).unwrap(),
            TimeFilter::At(minute(1439))
        );
        assert!(TimeFilter::from_raw(1440).is_err());
        assert!(TimeFilter::from_raw(-2).is_err());
    }

    #[test]
    fn test_time_filter_raw_round_trip() {
        assert_eq!(TimeFilter::Any.as_raw(), -1);
        assert_eq!(TimeFilter::At(minute(500)).as_raw(), 500);
    }

    #[test]
    fn test_window_non_wrapping() {
        let w = Window::default();
        assert_eq!(w.bounds(minute(500)), (440, 560));
        assert_eq!(w.slot_ranges(minute(500)), vec![440..560]);
    }

    #[test]
    fn test_window_wrapping_before_midnight() {
        let w = Window::default();
        assert_eq!(w.bounds(minute(10)), (1390, 70));
        assert_eq!(w.slot_ranges(minute(10)), vec![1390..1440, 0..70]);
    }

    #[test]
    fn test_window_wrapping_after_midnight() {
        let w = Window::default();
        assert_eq!(w.slot_ranges(minute(1400)), vec![1340..1440, 0..20]);
        // Upper bound lands exactly on midnight: second range is empty.
        assert_eq!(w.slot_ranges(minute(1380)), vec![1320..1440, 0..0]);
    }

    #[test]
    fn test_window_covers_120_slots() {
        let w = Window::default();
        for center in [0, 59, 60, 500, 1380, 1439] {
            let total: usize = w.slot_ranges(minute(center)).iter().map(|r| r.len()).sum();
            assert_eq!(total, 120, "center {center}");
        }
    }

    #[test]
    fn test_window_validation() {
        assert!(Window::new(0).is_err());
        assert!(Window::new(720).is_err());
        assert_eq!(Window::new(719).unwrap().half_width(), 719);
        assert_eq!(Window::new(15).unwrap().bounds(minute(100)), (85, 115));
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(minute(0)), "12:00 AM");
        assert_eq!(format_time(minute(5)), "12:05 AM");
        assert_eq!(format_time(minute(720)), "12:00 PM");
        assert_eq!(format_time(minute(13 * 60 + 7)), "1:07 PM");
        assert_eq!(TimeFilter::Any.label(), "any time");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let cases = [
            ("2024-03-01 08:15:42.123", 8 * 60 + 15),
            ("2024-03-01 08:15:42", 8 * 60 + 15),
            ("2024-03-01T23:59:01", 23 * 60 + 59),
            ("2024-03-01 00:05", 5),
            ("2024-03-01T17:30:00-04:00", 17 * 60 + 30),
        ];
        for (input, expected) in cases {
            let ts = parse_timestamp(input).unwrap();
            assert_eq!(MinuteOfDay::from_time(&ts).get(), expected, "{input}");
        }
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(TrafficError::InvalidTimestamp { .. })
        ));
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2024-03-01 25:00:00").is_err());
    }
}
