use crate::display::options::{LayerOptions, Opacity, Radius};
use crate::interface::PointList;
use crate::prelude::{DisplayError, DisplayResult, HeatmapRenderer};
use crate::telemetry::log::LogManager;

/// What `show` did to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayOutcome {
    Attached { points: usize },
    Cleared,
}

/// Owns the single live heatmap layer on top of a renderer.
///
/// Every new point list replaces the previous layer outright; radius and opacity
/// changes are pushed into the live layer without rebuilding it.
pub struct HeatmapDisplay<R: HeatmapRenderer> {
    renderer: R,
    layer: Option<R::Layer>,
    options: LayerOptions,
    logger: LogManager,
}

impl<R: HeatmapRenderer> HeatmapDisplay<R> {
    pub fn new(renderer: R, options: LayerOptions) -> Self {
        Self {
            renderer,
            layer: None,
            options,
            logger: LogManager::new("display"),
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn options(&self) -> LayerOptions {
        self.options
    }

    pub fn has_layer(&self) -> bool {
        self.layer.is_some()
    }

    pub fn show(&mut self, points: PointList) -> DisplayResult<DisplayOutcome> {
        if !self.renderer.is_available() {
            self.logger
                .diagnostic("heatmap visualization library not loaded");
            return Err(DisplayError::RendererUnavailable);
        }

        self.detach_layer();

        if points.is_empty() {
            return Ok(DisplayOutcome::Cleared);
        }

        let count = points.len();
        let layer = self.renderer.attach(points, self.options).map_err(|err| {
            self.logger
                .diagnostic(&format!("error creating heatmap: {err}"));
            err
        })?;
        self.layer = Some(layer);
        Ok(DisplayOutcome::Attached { points: count })
    }

    pub fn set_radius(&mut self, radius: Radius) {
        self.set_options(LayerOptions {
            radius,
            ..self.options
        });
    }

    pub fn set_opacity(&mut self, opacity: Opacity) {
        self.set_options(LayerOptions {
            opacity,
            ..self.options
        });
    }

    pub fn set_options(&mut self, options: LayerOptions) {
        if options == self.options {
            return;
        }
        self.options = options;
        if let Some(layer) = self.layer.as_mut() {
            self.renderer.update(layer, options);
        }
    }

    /// Detaches the live layer, if any.
    pub fn teardown(&mut self) {
        self.detach_layer();
    }

    fn detach_layer(&mut self) {
        if let Some(layer) = self.layer.take() {
            self.renderer.detach(layer);
        }
    }
}

impl<R: HeatmapRenderer> Drop for HeatmapDisplay<R> {
    fn drop(&mut self) {
        self.detach_layer();
    }
}
