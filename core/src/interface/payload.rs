use crate::interface::PointList;
use crate::processing::{LoadOutcome, LoadToken, TimeWindow};
use serde::{Deserialize, Serialize};

/// Bridge reply for one load: the outcome plus the status line to show for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsPayload {
    pub token: LoadToken,
    pub window: TimeWindow,
    pub outcome: LoadOutcome,
    pub message: String,
}

impl PointsPayload {
    pub fn new(token: LoadToken, window: TimeWindow, outcome: LoadOutcome) -> Self {
        let message = outcome.status_message(window);
        Self {
            token,
            window,
            outcome,
            message,
        }
    }

    pub fn points(&self) -> PointList {
        self.outcome.points()
    }
}
