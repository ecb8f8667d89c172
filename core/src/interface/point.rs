use serde::{Deserialize, Serialize};
use std::fmt;

/// Smallest weight a point may carry; severities below it are raised to it.
pub const MIN_WEIGHT: f64 = 0.1;

/// Latitude/longitude pair that is known to be inside geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct UncheckedGeoPoint {
    lat: f64,
    lng: f64,
}

impl TryFrom<UncheckedGeoPoint> for GeoPoint {
    type Error = CoordinateError;

    fn try_from(value: UncheckedGeoPoint) -> Result<Self, Self::Error> {
        GeoPoint::new(value.lat, value.lng)
    }
}

/// Coordinate that fell outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateError {
    Latitude(f64),
    Longitude(f64),
}

impl fmt::Display for CoordinateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateError::Latitude(v) => write!(f, "latitude {v} outside [-90, 90]"),
            CoordinateError::Longitude(v) => write!(f, "longitude {v} outside [-180, 180]"),
        }
    }
}

impl std::error::Error for CoordinateError {}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, CoordinateError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !(-180.0..=180.0).contains(&lng) {
            return Err(CoordinateError::Longitude(lng));
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// Strictly positive heat weight.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Weight(f64);

impl Weight {
    /// Weight for a record severity: `max(0.1, severity)`.
    pub fn from_severity(severity: f64) -> Self {
        Self(MIN_WEIGHT.max(severity))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Weight {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && value >= MIN_WEIGHT {
            Ok(Self(value))
        } else {
            Err(format!("weight {value} must be finite and at least {MIN_WEIGHT}"))
        }
    }
}

impl From<Weight> for f64 {
    fn from(weight: Weight) -> Self {
        weight.0
    }
}

/// One entry of a heatmap point list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeatPoint {
    Plain { location: GeoPoint },
    Weighted { location: GeoPoint, weight: Weight },
}

impl HeatPoint {
    pub fn location(&self) -> GeoPoint {
        match self {
            HeatPoint::Plain { location } | HeatPoint::Weighted { location, .. } => *location,
        }
    }

    /// Weight the renderer should use; plain points count as 1.
    pub fn intensity(&self) -> f64 {
        match self {
            HeatPoint::Plain { .. } => 1.0,
            HeatPoint::Weighted { weight, .. } => weight.value(),
        }
    }

    pub fn weight(&self) -> Option<Weight> {
        match self {
            HeatPoint::Plain { .. } => None,
            HeatPoint::Weighted { weight, .. } => Some(*weight),
        }
    }
}

/// Ordered list of validated points produced by one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PointList(Vec<HeatPoint>);

impl PointList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, point: HeatPoint) {
        self.0.push(point);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeatPoint> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[HeatPoint] {
        &self.0
    }

    pub fn weighted_count(&self) -> usize {
        self.0.iter().filter(|p| p.weight().is_some()).count()
    }

    pub fn max_intensity(&self) -> f64 {
        self.0.iter().map(HeatPoint::intensity).fold(0.0, f64::max)
    }
}

impl From<Vec<HeatPoint>> for PointList {
    fn from(points: Vec<HeatPoint>) -> Self {
        Self(points)
    }
}

impl FromIterator<HeatPoint> for PointList {
    fn from_iter<I: IntoIterator<Item = HeatPoint>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointList {
    type Item = &'a HeatPoint;
    type IntoIter = std::slice::Iter<'a, HeatPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
