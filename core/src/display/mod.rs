pub mod adapter;
pub mod options;
pub mod provider;

pub use adapter::{DisplayOutcome, HeatmapDisplay};
pub use options::{LayerOptions, Opacity, Radius};
pub use provider::{
    Acquisition, ProviderCapabilities, ProviderGuard, ProviderRegistry, ProviderRequest,
    VISUALIZATION_LIBRARY,
};
