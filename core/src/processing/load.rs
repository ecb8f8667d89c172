use crate::prelude::PointSource;
use crate::processing::cycle::LoadOutcome;
use crate::processing::validate::Normalizer;
use crate::processing::window::TimeWindow;
use crate::telemetry::log::LogManager;

/// Loader and normalizer run back to back: one fetch, one validation pass.
pub struct PointLoader<S> {
    source: S,
    normalizer: Normalizer,
    logger: LogManager,
}

impl<S: PointSource> PointLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            normalizer: Normalizer::new(),
            logger: LogManager::new("loader"),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn load(&self, window: TimeWindow) -> LoadOutcome {
        self.logger.detail(&format!(
            "querying {} ({})",
            self.source.describe(),
            window.label()
        ));

        let records = match self.source.fetch(window).await {
            Ok(records) => records,
            Err(err) => {
                self.logger
                    .diagnostic(&format!("error getting crime data: {err}"));
                return LoadOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        if records.is_empty() {
            self.logger.record("query returned no documents");
            return LoadOutcome::Empty;
        }

        let normalized = self.normalizer.normalize(&records);
        self.logger.record(&format!(
            "{} documents -> {} points ({} weighted, {} rejected)",
            records.len(),
            normalized.points.len(),
            normalized.points.weighted_count(),
            normalized.rejected.len()
        ));

        LoadOutcome::Loaded {
            points: normalized.points,
            rejected: normalized.rejected.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::RawRecord;
    use crate::prelude::{LoadError, LoadResult};
    use serde_json::json;
    use std::sync::Mutex;

    struct StubSource {
        reply: Mutex<Option<LoadResult<Vec<RawRecord>>>>,
        windows: Mutex<Vec<TimeWindow>>,
    }

    impl StubSource {
        fn new(reply: LoadResult<Vec<RawRecord>>) -> Self {
            Self {
                reply: Mutex::new(Some(reply)),
                windows: Mutex::new(Vec::new()),
            }
        }
    }

    impl PointSource for StubSource {
        fn describe(&self) -> String {
            "stub".into()
        }

        async fn fetch(&self, window: TimeWindow) -> LoadResult<Vec<RawRecord>> {
            self.windows.lock().unwrap().push(window);
            self.reply.lock().unwrap().take().unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn record(id: &str, value: serde_json::Value) -> RawRecord {
        RawRecord::new(id, value.as_object().cloned().unwrap())
    }

    #[tokio::test]
    async fn load_validates_fetched_records() {
        let source = StubSource::new(Ok(vec![
            record("a", json!({"latitude": 28.6, "longitude": 77.2, "severity": 3})),
            record("b", json!({"latitude": 999, "longitude": 77.2})),
        ]));
        let loader = PointLoader::new(source);

        let outcome = loader.load(TimeWindow::from_hours(12)).await;

        match outcome {
            LoadOutcome::Loaded { points, rejected } => {
                assert_eq!(points.len(), 1);
                assert_eq!(rejected, 1);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(
            loader.source().windows.lock().unwrap().as_slice(),
            &[TimeWindow::from_hours(12)]
        );
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let loader = PointLoader::new(StubSource::new(Ok(Vec::new())));
        assert_eq!(loader.load(TimeWindow::ALL_TIME).await, LoadOutcome::Empty);
    }

    #[tokio::test]
    async fn fetch_failure_carries_the_description() {
        let loader = PointLoader::new(StubSource::new(Err(LoadError::Backend(
            "permission denied".into(),
        ))));
        assert_eq!(
            loader.load(TimeWindow::default()).await,
            LoadOutcome::Failed {
                reason: "backend error: permission denied".into()
            }
        );
    }
}
