use chrono::{DateTime, Duration, SecondsFormat, Utc};
use heatcore::interface::RawRecord;
use heatcore::prelude::{LoadResult, PointSource};
use heatcore::processing::TimeWindow;
use heatcore::store::retain_window;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Configuration for generating synthetic crime records around a city center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub count: usize,
    pub seed: u64,
    pub center_lat: f64,
    pub center_lng: f64,
    pub spread_deg: f64,
    pub max_severity: f64,
    /// Share of records generated without a severity.
    pub unweighted_ratio: f64,
    /// Share of records generated with unusable coordinates.
    pub malformed_ratio: f64,
    /// Records are stamped uniformly over this many hours before now.
    pub span_hours: u32,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 200,
            seed: 0,
            center_lat: 28.5956,
            center_lng: 77.1673,
            spread_deg: 0.08,
            max_severity: 5.0,
            unweighted_ratio: 0.2,
            malformed_ratio: 0.05,
            span_hours: 720,
        }
    }
}

pub fn build_records(config: &SyntheticConfig, now: DateTime<Utc>) -> Vec<RawRecord> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let spread = config.spread_deg.abs().max(f64::EPSILON);
    let span_minutes = i64::from(config.span_hours.max(1)) * 60;

    (0..config.count)
        .map(|index| {
            let mut fields = Map::new();
            let roll: f64 = rng.gen();

            if roll < config.malformed_ratio {
                // one of the shapes the normalizer has to drop
                match index % 3 {
                    0 => fields.insert("latitude".into(), json!(999.0)),
                    1 => fields.insert("latitude".into(), json!("unknown")),
                    _ => None,
                };
                fields.insert("longitude".into(), json!(config.center_lng));
            } else {
                // sum of two uniforms keeps most points near the center
                let lat_offset = (rng.gen_range(-spread..spread) + rng.gen_range(-spread..spread)) / 2.0;
                let lng_offset = (rng.gen_range(-spread..spread) + rng.gen_range(-spread..spread)) / 2.0;
                fields.insert(
                    "latitude".into(),
                    json!((config.center_lat + lat_offset).clamp(-90.0, 90.0)),
                );
                fields.insert(
                    "longitude".into(),
                    json!((config.center_lng + lng_offset).clamp(-180.0, 180.0)),
                );
            }

            if rng.gen::<f64>() >= config.unweighted_ratio {
                let severity = rng.gen_range(1.0..=config.max_severity.max(1.0)).round();
                fields.insert("severity".into(), json!(severity));
            }

            let age = Duration::minutes(rng.gen_range(0..span_minutes));
            fields.insert(
                "timestamp".into(),
                Value::String((now - age).to_rfc3339_opts(SecondsFormat::Secs, true)),
            );

            RawRecord::new(format!("synthetic-{index:05}"), fields)
        })
        .collect()
}

/// In-memory source that regenerates the same seeded records on every fetch.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    config: SyntheticConfig,
    timestamp_field: Option<String>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig, timestamp_field: Option<String>) -> Self {
        Self {
            config,
            timestamp_field,
        }
    }
}

impl PointSource for SyntheticSource {
    fn describe(&self) -> String {
        format!(
            "synthetic {} records (seed {})",
            self.config.count, self.config.seed
        )
    }

    async fn fetch(&self, window: TimeWindow) -> LoadResult<Vec<RawRecord>> {
        let now = Utc::now();
        let records = build_records(&self.config, now);
        Ok(match &self.timestamp_field {
            Some(field) => retain_window(records, field, window, now),
            None => records,
        })
    }
}
