use crate::interface::PointList;
use crate::processing::window::TimeWindow;
use serde::{Deserialize, Serialize};

pub const LOADING_MESSAGE: &str = "Loading crime data...";

/// What a single load produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Documents came back; `points` may still be empty if every record was invalid.
    Loaded { points: PointList, rejected: usize },
    /// The query matched no documents.
    Empty,
    Failed { reason: String },
}

impl LoadOutcome {
    pub fn points(&self) -> PointList {
        match self {
            LoadOutcome::Loaded { points, .. } => points.clone(),
            LoadOutcome::Empty | LoadOutcome::Failed { .. } => PointList::new(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, LoadOutcome::Failed { .. })
    }

    pub fn status_message(&self, window: TimeWindow) -> String {
        match self {
            LoadOutcome::Loaded { points, .. } if window.is_bounded() => format!(
                "Showing {} crimes from the last {} hours",
                points.len(),
                window.hours()
            ),
            LoadOutcome::Loaded { points, .. } => {
                format!("Showing all {} crime locations", points.len())
            }
            LoadOutcome::Empty => "No crime data found".into(),
            LoadOutcome::Failed { reason } => format!("Error loading crime data: {reason}"),
        }
    }
}

/// Identity of one initiated load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Idle,
    Loading(LoadToken),
}

/// Tracks load cycles so that only the most recently initiated load is applied.
///
/// `begin` issues a fresh token; `complete` accepts an outcome only when its token is
/// the latest one issued. Earlier loads that resolve late are discarded.
#[derive(Debug, Clone)]
pub struct LoadCycle {
    issued: u64,
    phase: LoadPhase,
    window: TimeWindow,
    last: Option<LoadOutcome>,
}

impl LoadCycle {
    pub fn new() -> Self {
        Self {
            issued: 0,
            phase: LoadPhase::Idle,
            window: TimeWindow::default(),
            last: None,
        }
    }

    pub fn begin(&mut self, window: TimeWindow) -> LoadToken {
        self.issued += 1;
        let token = LoadToken(self.issued);
        self.phase = LoadPhase::Loading(token);
        self.window = window;
        token
    }

    /// Applies `outcome` if `token` is current; returns `None` for stale results.
    pub fn complete(&mut self, token: LoadToken, outcome: LoadOutcome) -> Option<&LoadOutcome> {
        if !self.is_current(token) {
            return None;
        }
        self.phase = LoadPhase::Idle;
        self.last = Some(outcome);
        self.last.as_ref()
    }

    pub fn is_current(&self, token: LoadToken) -> bool {
        token.0 == self.issued
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading(_))
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn last(&self) -> Option<&LoadOutcome> {
        self.last.as_ref()
    }

    pub fn status_message(&self) -> Option<String> {
        if self.is_loading() {
            return Some(LOADING_MESSAGE.into());
        }
        self.last
            .as_ref()
            .map(|outcome| outcome.status_message(self.window))
    }
}

impl Default for LoadCycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::{GeoPoint, HeatPoint};

    fn loaded(count: usize) -> LoadOutcome {
        let points = (0..count)
            .map(|i| HeatPoint::Plain {
                location: GeoPoint::new(i as f64, 0.0).unwrap(),
            })
            .collect();
        LoadOutcome::Loaded { points, rejected: 0 }
    }

    #[test]
    fn cycle_moves_through_loading_back_to_idle() {
        let mut cycle = LoadCycle::new();
        assert_eq!(cycle.phase(), LoadPhase::Idle);
        assert_eq!(cycle.status_message(), None);

        let token = cycle.begin(TimeWindow::from_hours(24));
        assert_eq!(cycle.phase(), LoadPhase::Loading(token));
        assert_eq!(cycle.status_message().as_deref(), Some(LOADING_MESSAGE));

        assert!(cycle.complete(token, loaded(4)).is_some());
        assert_eq!(cycle.phase(), LoadPhase::Idle);
        assert_eq!(
            cycle.status_message().as_deref(),
            Some("Showing 4 crimes from the last 24 hours")
        );
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut cycle = LoadCycle::new();
        let first = cycle.begin(TimeWindow::ALL_TIME);
        let second = cycle.begin(TimeWindow::ALL_TIME);
        assert!(second > first);

        assert!(cycle.complete(second, loaded(2)).is_some());
        assert!(cycle.complete(first, loaded(9)).is_none());
        assert_eq!(cycle.last(), Some(&loaded(2)));
        assert_eq!(
            cycle.status_message().as_deref(),
            Some("Showing all 2 crime locations")
        );
    }

    #[test]
    fn early_resolution_of_older_load_keeps_loading() {
        let mut cycle = LoadCycle::new();
        let first = cycle.begin(TimeWindow::default());
        let second = cycle.begin(TimeWindow::default());

        assert!(cycle.complete(first, LoadOutcome::Empty).is_none());
        assert!(cycle.is_loading());
        assert!(cycle.complete(second, LoadOutcome::Empty).is_some());
        assert!(!cycle.is_loading());
    }

    #[test]
    fn status_messages_cover_every_outcome() {
        let window = TimeWindow::from_hours(48);
        assert_eq!(LoadOutcome::Empty.status_message(window), "No crime data found");
        assert_eq!(
            LoadOutcome::Failed {
                reason: "request timed out".into()
            }
            .status_message(window),
            "Error loading crime data: request timed out"
        );
        assert_eq!(
            loaded(0).status_message(window),
            "Showing 0 crimes from the last 48 hours"
        );
    }

    #[test]
    fn outcome_round_trips_through_json() {
        let json = serde_json::to_value(loaded(1)).unwrap();
        assert_eq!(json["status"], "loaded");
        let failed: LoadOutcome =
            serde_json::from_str(r#"{"status":"failed","reason":"boom"}"#).unwrap();
        assert!(failed.is_failure());
        assert!(failed.points().is_empty());
    }
}
