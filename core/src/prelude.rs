use crate::display::LayerOptions;
use crate::interface::{PointList, RawRecord};
use crate::processing::TimeWindow;
use std::future::Future;

/// Errors raised while acquiring records from a point source.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request timed out")]
    Timeout,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("failed to parse response: {0}")]
    Parse(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for LoadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LoadError::Timeout
        } else if err.is_connect() {
            LoadError::Connection(err.to_string())
        } else if err.is_decode() {
            LoadError::Parse(err.to_string())
        } else {
            LoadError::Http(err.to_string())
        }
    }
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised by the display adapter and its renderer.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DisplayError {
    #[error("heatmap visualization library not loaded")]
    RendererUnavailable,
    #[error("map provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("failed to create heatmap layer: {0}")]
    Attach(String),
    #[error("invalid display parameter: {0}")]
    InvalidParameter(String),
}

pub type DisplayResult<T> = Result<T, DisplayError>;

/// Backend that yields raw records for a time window.
///
/// One call is one round-trip: implementations must not retry, cache, or paginate.
pub trait PointSource: Send + Sync {
    fn describe(&self) -> String;

    fn fetch(&self, window: TimeWindow)
        -> impl Future<Output = LoadResult<Vec<RawRecord>>> + Send;
}

/// Visualization primitive the display adapter drives.
pub trait HeatmapRenderer {
    type Layer;

    /// Whether heatmap support is loaded; when false no layer may be touched.
    fn is_available(&self) -> bool;

    fn attach(&mut self, points: PointList, options: LayerOptions) -> DisplayResult<Self::Layer>;

    fn update(&mut self, layer: &mut Self::Layer, options: LayerOptions);

    fn detach(&mut self, layer: Self::Layer);
}
