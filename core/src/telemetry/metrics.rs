use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Counters for load cycles, shared between request handlers.
pub struct MetricsRecorder {
    inner: Mutex<LoadMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadMetrics {
    pub loads: usize,
    pub points: usize,
    pub rejected: usize,
    pub failures: usize,
    pub stale: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LoadMetrics::default()),
        }
    }

    pub fn record_load(&self, points: usize, rejected: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.loads += 1;
            metrics.points += points;
            metrics.rejected += rejected;
        }
    }

    pub fn record_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.loads += 1;
            metrics.failures += 1;
        }
    }

    pub fn record_stale(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.stale += 1;
        }
    }

    pub fn snapshot(&self) -> LoadMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            LoadMetrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
