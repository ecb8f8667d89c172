//! Core record loading, validation, and heatmap display for the crime heatmap.
//!
//! Records flow from a point source through the normalizer into a display adapter:
//! sources return raw documents, the normalizer keeps only well-formed coordinates,
//! and the adapter owns the single live heatmap layer.

pub mod display;
pub mod interface;
pub mod prelude;
pub mod processing;
pub mod store;
pub mod telemetry;

pub use prelude::{DisplayError, HeatmapRenderer, LoadError, PointSource};
