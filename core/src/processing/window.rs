use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How far back records are considered current. Zero hours means no bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeWindow {
    hours: u32,
}

impl TimeWindow {
    pub const ALL_TIME: TimeWindow = TimeWindow { hours: 0 };

    /// Selector choices, in display order.
    pub const PRESETS: [TimeWindow; 7] = [
        TimeWindow { hours: 6 },
        TimeWindow { hours: 12 },
        TimeWindow { hours: 24 },
        TimeWindow { hours: 48 },
        TimeWindow { hours: 168 },
        TimeWindow { hours: 720 },
        TimeWindow::ALL_TIME,
    ];

    pub const fn from_hours(hours: u32) -> Self {
        Self { hours }
    }

    pub fn hours(&self) -> u32 {
        self.hours
    }

    pub fn is_bounded(&self) -> bool {
        self.hours > 0
    }

    /// Oldest instant still inside the window, or `None` for all time.
    ///
    /// A window reaching back before year 1 has no cutoff either.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_bounded() {
            return None;
        }
        now.checked_sub_signed(Duration::hours(i64::from(self.hours)))
            .filter(|cutoff| cutoff.year() >= 1)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.cutoff(now).map_or(true, |cutoff| timestamp >= cutoff)
    }

    pub fn label(&self) -> String {
        match self.hours {
            0 => "All time".into(),
            168 => "Last week".into(),
            720 => "Last month".into(),
            hours => format!("Last {hours} hours"),
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self { hours: 24 }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
