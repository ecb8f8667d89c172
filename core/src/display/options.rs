use crate::prelude::{DisplayError, DisplayResult};
use serde::{Deserialize, Serialize};

/// Heatmap influence radius in pixels, 10 to 50.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Radius(u32);

impl Radius {
    pub const MIN: u32 = 10;
    pub const MAX: u32 = 50;

    pub fn new(pixels: u32) -> DisplayResult<Self> {
        if (Self::MIN..=Self::MAX).contains(&pixels) {
            Ok(Self(pixels))
        } else {
            Err(DisplayError::InvalidParameter(format!(
                "radius {pixels} outside {}..={}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Snaps a slider reading into range.
    pub fn clamped(pixels: f64) -> Self {
        Self((pixels.round() as u32).clamp(Self::MIN, Self::MAX))
    }

    pub fn pixels(&self) -> u32 {
        self.0
    }
}

impl Default for Radius {
    fn default() -> Self {
        Self(20)
    }
}

impl TryFrom<u32> for Radius {
    type Error = DisplayError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Radius::new(value)
    }
}

impl From<Radius> for u32 {
    fn from(radius: Radius) -> Self {
        radius.0
    }
}

/// Layer opacity from 0.1 to 1.0 in steps of 0.1, kept as tenths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "f32", into = "f32")]
pub struct Opacity(u8);

impl Opacity {
    pub const MIN: f32 = 0.1;
    pub const MAX: f32 = 1.0;
    pub const STEP: f32 = 0.1;

    pub fn new(value: f32) -> DisplayResult<Self> {
        if !value.is_finite() || value < Self::MIN - f32::EPSILON || value > Self::MAX + f32::EPSILON
        {
            return Err(DisplayError::InvalidParameter(format!(
                "opacity {value} outside {}..={}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self::clamped(value))
    }

    /// Rounds to the nearest step and clamps into range.
    pub fn clamped(value: f32) -> Self {
        let tenths = if value.is_finite() {
            (value * 10.0).round().clamp(1.0, 10.0) as u8
        } else {
            10
        };
        Self(tenths)
    }

    pub fn value(&self) -> f32 {
        f32::from(self.0) / 10.0
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self(7)
    }
}

impl TryFrom<f32> for Opacity {
    type Error = DisplayError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Opacity::new(value)
    }
}

impl From<Opacity> for f32 {
    fn from(opacity: Opacity) -> Self {
        opacity.value()
    }
}

/// Display parameters pushed to the renderer alongside the points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOptions {
    pub radius: Radius,
    pub opacity: Opacity,
}
