//! Point sources: the hosted document store and local JSON fixtures.

pub mod firestore;
pub mod fixture;

pub use firestore::{FirestoreStore, StoreConfig};
pub use fixture::FixtureSource;

use crate::interface::RawRecord;
use crate::processing::TimeWindow;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Keeps records whose `field` holds an RFC 3339 timestamp inside `window`.
///
/// Records without a readable timestamp are dropped, matching how a range filter on the
/// store excludes documents that lack the field.
pub fn retain_window(
    records: Vec<RawRecord>,
    field: &str,
    window: TimeWindow,
    now: DateTime<Utc>,
) -> Vec<RawRecord> {
    let Some(cutoff) = window.cutoff(now) else {
        return records;
    };
    records
        .into_iter()
        .filter(|record| match record.get(field) {
            Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
                .map(|ts| ts.with_timezone(&Utc) >= cutoff)
                .unwrap_or(false),
            _ => false,
        })
        .collect()
}
