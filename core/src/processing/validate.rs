use crate::interface::record::{LATITUDE_FIELD, LONGITUDE_FIELD};
use crate::interface::{CoordinateError, GeoPoint, HeatPoint, PointList, RawRecord, Weight};
use crate::telemetry::log::LogManager;
use std::fmt;

/// Why a record was left out of the point list.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    Missing(&'static str),
    NotNumeric(&'static str),
    OutOfRange(CoordinateError),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Missing(field) => write!(f, "missing {field}"),
            RejectReason::NotNumeric(field) => write!(f, "{field} is not numeric"),
            RejectReason::OutOfRange(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub id: String,
    pub reason: RejectReason,
}

/// Result of normalizing one batch of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub points: PointList,
    pub rejected: Vec<Rejection>,
}

/// Turns raw documents into heatmap points, dropping anything without usable coordinates.
pub struct Normalizer {
    logger: LogManager,
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("normalizer"),
        }
    }

    pub fn normalize(&self, records: &[RawRecord]) -> Normalized {
        let mut normalized = Normalized::default();

        for record in records {
            match to_heat_point(record) {
                Ok(point) => normalized.points.push(point),
                Err(reason) => {
                    self.logger.diagnostic(&format!(
                        "invalid coordinates in document {}: {}",
                        record.id, reason
                    ));
                    normalized.rejected.push(Rejection {
                        id: record.id.clone(),
                        reason,
                    });
                }
            }
        }

        normalized
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a single record; severity only decides between plain and weighted.
pub fn to_heat_point(record: &RawRecord) -> Result<HeatPoint, RejectReason> {
    let lat = coordinate(record, LATITUDE_FIELD)?;
    let lng = coordinate(record, LONGITUDE_FIELD)?;
    let location = GeoPoint::new(lat, lng).map_err(RejectReason::OutOfRange)?;

    Ok(match record.severity() {
        Some(severity) => HeatPoint::Weighted {
            location,
            weight: Weight::from_severity(severity),
        },
        None => HeatPoint::Plain { location },
    })
}

fn coordinate(record: &RawRecord, field: &'static str) -> Result<f64, RejectReason> {
    match record.get(field) {
        None | Some(serde_json::Value::Null) => Err(RejectReason::Missing(field)),
        Some(_) => record.number(field).ok_or(RejectReason::NotNumeric(field)),
    }
}
