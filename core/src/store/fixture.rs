use crate::interface::RawRecord;
use crate::prelude::{LoadError, LoadResult, PointSource};
use crate::processing::TimeWindow;
use crate::store::retain_window;
use chrono::Utc;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Reads records from a JSON array on disk, one array element per document.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
    timestamp_field: Option<String>,
}

impl FixtureSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            timestamp_field: None,
        }
    }

    pub fn with_timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.timestamp_field = Some(field.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Parses a fixture document. Non-object elements become records with no fields.
pub fn parse_records(contents: &str) -> LoadResult<Vec<RawRecord>> {
    let parsed: Value =
        serde_json::from_str(contents).map_err(|e| LoadError::Parse(e.to_string()))?;
    let Value::Array(items) = parsed else {
        return Err(LoadError::Parse("fixture must be a JSON array".into()));
    };

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => RawRecord::from_object(object, index.to_string()),
            _ => RawRecord::new(index.to_string(), Map::new()),
        })
        .collect())
}

impl PointSource for FixtureSource {
    fn describe(&self) -> String {
        format!("fixture {}", self.path.display())
    }

    async fn fetch(&self, window: TimeWindow) -> LoadResult<Vec<RawRecord>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        let records = parse_records(&contents)?;
        Ok(match &self.timestamp_field {
            Some(field) => retain_window(records, field, window, Utc::now()),
            None => records,
        })
    }
}
