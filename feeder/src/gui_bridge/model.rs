use heatcore::processing::{LoadCycle, LoadOutcome, LoadPhase};
use heatcore::telemetry::LoadMetrics;
use serde::{Deserialize, Serialize};

/// Snapshot served by `/status`: the latest applied load and the counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusModel {
    pub loading: bool,
    pub window_hours: u32,
    pub message: Option<String>,
    pub points: usize,
    pub rejected: usize,
    pub metrics: LoadMetrics,
}

impl StatusModel {
    pub fn from_cycle(cycle: &LoadCycle, metrics: LoadMetrics) -> Self {
        let (points, rejected) = match cycle.last() {
            Some(LoadOutcome::Loaded { points, rejected }) => (points.len(), *rejected),
            _ => (0, 0),
        };
        Self {
            loading: matches!(cycle.phase(), LoadPhase::Loading(_)),
            window_hours: cycle.window().hours(),
            message: cycle.status_message(),
            points,
            rejected,
            metrics,
        }
    }
}
