pub mod payload;
pub mod point;
pub mod record;

pub use payload::PointsPayload;
pub use point::{CoordinateError, GeoPoint, HeatPoint, PointList, Weight, MIN_WEIGHT};
pub use record::RawRecord;
