//! Read-only client for a Firestore collection over the REST `runQuery` endpoint.
//!
//! `runQuery` streams every matching document back in a single response, so one
//! load is exactly one round-trip with no page tokens to follow.

use crate::interface::RawRecord;
use crate::prelude::{LoadError, LoadResult, PointSource};
use crate::processing::TimeWindow;
use crate::telemetry::log::LogManager;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Connection settings for the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub api_key: Option<String>,
    /// Field the time window filters on. When unset the cutoff is computed but the
    /// whole collection is fetched.
    pub timestamp_field: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            project_id: String::new(),
            database: "(default)".into(),
            collection: "crime".into(),
            api_key: None,
            timestamp_field: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: Client,
    config: StoreConfig,
    logger: LogManager,
}

impl FirestoreStore {
    pub fn new(config: StoreConfig) -> LoadResult<Self> {
        if config.project_id.trim().is_empty() {
            return Err(LoadError::Config("store project_id is empty".into()));
        }
        if config.collection.trim().is_empty() {
            return Err(LoadError::Config("store collection is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            config,
            logger: LogManager::new("firestore"),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn query_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/{}/documents:runQuery",
            self.config.endpoint.trim_end_matches('/'),
            self.config.project_id,
            self.config.database
        )
    }

    /// Structured query for the collection, bounded by the window when a timestamp
    /// field is configured.
    pub fn query_body(&self, window: TimeWindow, now: DateTime<Utc>) -> Value {
        let mut query = json!({
            "from": [{ "collectionId": self.config.collection }],
        });

        if let Some(cutoff) = window.cutoff(now) {
            let stamp = cutoff.to_rfc3339_opts(SecondsFormat::Millis, true);
            match &self.config.timestamp_field {
                Some(field) => {
                    query["where"] = json!({
                        "fieldFilter": {
                            "field": { "fieldPath": field },
                            "op": "GREATER_THAN_OR_EQUAL",
                            "value": { "timestampValue": stamp },
                        }
                    });
                }
                None => self.logger.detail(&format!(
                    "cutoff {stamp} computed but no timestamp field configured; fetching all documents"
                )),
            }
        }

        json!({ "structuredQuery": query })
    }
}

impl PointSource for FirestoreStore {
    fn describe(&self) -> String {
        format!(
            "firestore {}/{}",
            self.config.project_id, self.config.collection
        )
    }

    async fn fetch(&self, window: TimeWindow) -> LoadResult<Vec<RawRecord>> {
        let mut request = self
            .client
            .post(self.query_url())
            .json(&self.query_body(window, Utc::now()));
        if let Some(key) = &self.config.api_key {
            request = request.query(&[("key", key)]);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| status.to_string());
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LoadError::Auth(message),
                _ => LoadError::Backend(format!("{status}: {message}")),
            });
        }

        let entries: Vec<QueryEntry> = response
            .json()
            .await
            .map_err(|e| LoadError::Parse(e.to_string()))?;
        Ok(decode_entries(entries))
    }
}

#[derive(Debug, Deserialize)]
struct QueryEntry {
    #[serde(default)]
    document: Option<WireDocument>,
}

#[derive(Debug, Deserialize)]
struct WireDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

fn decode_entries(entries: Vec<QueryEntry>) -> Vec<RawRecord> {
    entries
        .into_iter()
        .filter_map(|entry| entry.document)
        .map(|document| {
            let id = document
                .name
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            let fields = document
                .fields
                .iter()
                .map(|(key, value)| (key.clone(), decode_value(value)))
                .collect();
            RawRecord::new(id, fields)
        })
        .collect()
}

/// Flattens a typed Firestore value into plain JSON.
///
/// Integers arrive as strings and are turned back into numbers. Non-finite doubles
/// arrive as `"NaN"` or `"Infinity"` and stay strings, so they never read as numeric.
pub fn decode_value(value: &Value) -> Value {
    let Some(object) = value.as_object() else {
        return value.clone();
    };
    let Some((kind, inner)) = object.iter().next() else {
        return Value::Null;
    };

    match kind.as_str() {
        "nullValue" => Value::Null,
        "integerValue" => match inner {
            Value::String(text) => text
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| inner.clone()),
            _ => inner.clone(),
        },
        "mapValue" => {
            let fields = inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(key, value)| (key.clone(), decode_value(value)))
                        .collect::<Map<_, _>>()
                })
                .unwrap_or_default();
            Value::Object(fields)
        }
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        _ => inner.clone(),
    }
}

fn error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let error = match &parsed {
        Value::Array(items) => items.first()?.get("error")?,
        other => other.get("error")?,
    };
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}
