use crate::generator::scatter::SyntheticSource;
use crate::workflow::config::FeederConfig;
use anyhow::Context;
use heatcore::interface::RawRecord;
use heatcore::prelude::{LoadResult, PointSource};
use heatcore::processing::{LoadOutcome, PointLoader, TimeWindow};
use heatcore::store::{FirestoreStore, FixtureSource};
use heatcore::telemetry::{LoadMetrics, MetricsRecorder};

/// The source picked for this run: a fixture file, synthetic records, or the store.
#[derive(Debug, Clone)]
pub enum FeedSource {
    Store(FirestoreStore),
    Fixture(FixtureSource),
    Synthetic(SyntheticSource),
}

impl FeedSource {
    pub fn from_config(config: &FeederConfig) -> anyhow::Result<Self> {
        let timestamp_field = config.store.timestamp_field.clone();
        if let Some(path) = &config.records {
            let source = FixtureSource::new(path);
            return Ok(FeedSource::Fixture(match timestamp_field {
                Some(field) => source.with_timestamp_field(field),
                None => source,
            }));
        }
        if let Some(synthetic) = &config.synthetic {
            return Ok(FeedSource::Synthetic(SyntheticSource::new(
                synthetic.clone(),
                timestamp_field,
            )));
        }
        let store = FirestoreStore::new(config.store.clone()).context("configuring store")?;
        Ok(FeedSource::Store(store))
    }
}

impl PointSource for FeedSource {
    fn describe(&self) -> String {
        match self {
            FeedSource::Store(source) => source.describe(),
            FeedSource::Fixture(source) => source.describe(),
            FeedSource::Synthetic(source) => source.describe(),
        }
    }

    async fn fetch(&self, window: TimeWindow) -> LoadResult<Vec<RawRecord>> {
        match self {
            FeedSource::Store(source) => source.fetch(window).await,
            FeedSource::Fixture(source) => source.fetch(window).await,
            FeedSource::Synthetic(source) => source.fetch(window).await,
        }
    }
}

/// Runs load cycles against the configured source and keeps the counters.
pub struct Runner {
    loader: PointLoader<FeedSource>,
    metrics: MetricsRecorder,
}

impl Runner {
    pub fn new(source: FeedSource) -> Self {
        Self {
            loader: PointLoader::new(source),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn describe(&self) -> String {
        self.loader.source().describe()
    }

    pub async fn execute(&self, window: TimeWindow) -> LoadOutcome {
        let outcome = self.loader.load(window).await;
        match &outcome {
            LoadOutcome::Loaded { points, rejected } => {
                self.metrics.record_load(points.len(), *rejected)
            }
            LoadOutcome::Empty => self.metrics.record_load(0, 0),
            LoadOutcome::Failed { .. } => self.metrics.record_failure(),
        }
        outcome
    }

    pub fn record_stale(&self) {
        self.metrics.record_stale();
    }

    pub fn metrics(&self) -> LoadMetrics {
        self.metrics.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::scatter::SyntheticConfig;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn runner_executes_fixture_load() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            br#"[{"id": "a", "latitude": 28.6, "longitude": 77.2, "severity": 3},
                 {"id": "b", "latitude": 999, "longitude": 77.2},
                 {"id": "c", "latitude": 28.5, "longitude": 77.1}]"#,
        )
        .unwrap();
        let config = FeederConfig {
            records: Some(temp.path().to_path_buf()),
            ..Default::default()
        };

        let runner = Runner::new(FeedSource::from_config(&config).unwrap());
        let outcome = runner.execute(TimeWindow::ALL_TIME).await;

        assert_eq!(
            outcome.status_message(TimeWindow::ALL_TIME),
            "Showing all 2 crime locations"
        );
        let metrics = runner.metrics();
        assert_eq!(metrics.loads, 1);
        assert_eq!(metrics.points, 2);
        assert_eq!(metrics.rejected, 1);
    }

    #[tokio::test]
    async fn runner_counts_failures() {
        let config = FeederConfig {
            records: Some("/missing/records.json".into()),
            ..Default::default()
        };
        let runner = Runner::new(FeedSource::from_config(&config).unwrap());
        assert!(runner.execute(TimeWindow::default()).await.is_failure());
        assert_eq!(runner.metrics().failures, 1);
    }

    #[test]
    fn source_selection_prefers_fixture_then_synthetic() {
        let synthetic = FeederConfig {
            synthetic: Some(SyntheticConfig::default()),
            ..Default::default()
        };
        assert!(matches!(
            FeedSource::from_config(&synthetic).unwrap(),
            FeedSource::Synthetic(_)
        ));

        let store_without_project = FeederConfig::default();
        assert!(FeedSource::from_config(&store_without_project).is_err());
    }
}
