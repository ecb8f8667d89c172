use crate::projection::MapView;
use heatcore::display::LayerOptions;
use heatcore::interface::PointList;
use heatcore::prelude::{DisplayError, DisplayResult, HeatmapRenderer};
use iced::{
    mouse,
    widget::canvas::{self, Frame, Geometry, Path, Stroke},
    Color, Point, Rectangle, Renderer, Theme,
};

/// Spacing of the background graticule, in degrees.
const GRID_STEP_DEG: f64 = 0.05;
const FALLOFF_RINGS: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerId(u64);

/// A heat layer as the canvas will draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasLayer {
    pub id: LayerId,
    pub points: PointList,
    pub options: LayerOptions,
}

/// Keeps attached layers in memory for the canvas to paint.
#[derive(Debug, Default)]
pub struct CanvasRenderer {
    available: bool,
    next_id: u64,
    layers: Vec<CanvasLayer>,
}

impl CanvasRenderer {
    /// `available` mirrors whether the provider reported heatmap support.
    pub fn new(available: bool) -> Self {
        Self {
            available,
            next_id: 0,
            layers: Vec::new(),
        }
    }

    pub fn layers(&self) -> &[CanvasLayer] {
        &self.layers
    }
}

impl HeatmapRenderer for CanvasRenderer {
    type Layer = LayerId;

    fn is_available(&self) -> bool {
        self.available
    }

    fn attach(&mut self, points: PointList, options: LayerOptions) -> DisplayResult<LayerId> {
        if !self.available {
            return Err(DisplayError::RendererUnavailable);
        }
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.push(CanvasLayer {
            id,
            points,
            options,
        });
        Ok(id)
    }

    fn update(&mut self, layer: &mut LayerId, options: LayerOptions) {
        if let Some(entry) = self.layers.iter_mut().find(|entry| entry.id == *layer) {
            entry.options = options;
        }
    }

    fn detach(&mut self, layer: LayerId) {
        self.layers.retain(|entry| entry.id != layer);
    }
}

/// Green through yellow to red as `t` goes from 0 to 1.
pub fn heat_color(t: f32, alpha: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let (r, g) = if t <= 0.5 {
        (t * 2.0, 1.0)
    } else {
        (1.0, (1.0 - t) * 2.0)
    };
    Color::from_rgba(r, g, 0.0, alpha.clamp(0.0, 1.0))
}

#[derive(Clone)]
pub struct HeatmapCanvas {
    view: MapView,
    layers: Vec<CanvasLayer>,
}

impl HeatmapCanvas {
    pub fn new(view: MapView, layers: &[CanvasLayer]) -> Self {
        Self {
            view,
            layers: layers.to_vec(),
        }
    }

    fn draw_grid(&self, frame: &mut Frame, bounds: Rectangle) {
        let size = bounds.size();
        let half_span = f64::from(bounds.width.max(bounds.height)) * self.view.degrees_per_pixel();
        let steps = (half_span / GRID_STEP_DEG).ceil() as i64;
        let base_lat = (self.view.latitude / GRID_STEP_DEG).round() * GRID_STEP_DEG;
        let base_lng = (self.view.longitude / GRID_STEP_DEG).round() * GRID_STEP_DEG;

        let grid = Path::new(|builder| {
            for offset in -steps..=steps {
                let delta = offset as f64 * GRID_STEP_DEG;
                let x = self.view.project(self.view.latitude, base_lng + delta, size).x;
                builder.move_to(Point::new(x, 0.0));
                builder.line_to(Point::new(x, size.height));
                let y = self.view.project(base_lat + delta, self.view.longitude, size).y;
                builder.move_to(Point::new(0.0, y));
                builder.line_to(Point::new(size.width, y));
            }
        });
        frame.stroke(
            &grid,
            Stroke::default()
                .with_color(Color::from_rgb(0.16, 0.18, 0.22))
                .with_width(1.0),
        );

        let center = Point::new(size.width / 2.0, size.height / 2.0);
        let marker = Path::new(|builder| builder.circle(center, 3.0));
        frame.stroke(
            &marker,
            Stroke::default().with_color(Color::from_rgb(0.35, 0.35, 0.45)),
        );
    }

    fn draw_layer(&self, frame: &mut Frame, bounds: Rectangle, layer: &CanvasLayer) {
        let max = layer.points.max_intensity();
        if max <= 0.0 {
            return;
        }
        let radius = layer.options.radius.pixels() as f32;
        let opacity = layer.options.opacity.value();

        for point in &layer.points {
            let location = point.location();
            let center = self.view.project(location.lat(), location.lng(), bounds.size());
            if center.x < -radius
                || center.y < -radius
                || center.x > bounds.width + radius
                || center.y > bounds.height + radius
            {
                continue;
            }

            let level = (point.intensity() / max) as f32;
            // stacked rings fade toward the rim
            let ring_alpha = opacity * level.max(0.15) / FALLOFF_RINGS as f32;
            for ring in (1..=FALLOFF_RINGS).rev() {
                let ring_radius = radius * ring as f32 / FALLOFF_RINGS as f32;
                let disc = Path::new(|builder| builder.circle(center, ring_radius));
                frame.fill(&disc, heat_color(level, ring_alpha));
            }
        }
    }
}

impl<Message> canvas::Program<Message> for HeatmapCanvas {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.06, 0.08),
        );

        self.draw_grid(&mut frame, bounds);
        for layer in &self.layers {
            self.draw_layer(&mut frame, bounds, layer);
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatcore::display::{HeatmapDisplay, Opacity, Radius};
    use heatcore::interface::{GeoPoint, HeatPoint, Weight};

    fn points(count: usize) -> PointList {
        (0..count)
            .map(|i| HeatPoint::Weighted {
                location: GeoPoint::new(28.5 + i as f64 * 0.01, 77.1).unwrap(),
                weight: Weight::from_severity(i as f64 + 1.0),
            })
            .collect()
    }

    #[test]
    fn renderer_tracks_attached_layers() {
        let mut renderer = CanvasRenderer::new(true);
        let first = renderer.attach(points(2), LayerOptions::default()).unwrap();
        let mut second = renderer.attach(points(3), LayerOptions::default()).unwrap();
        assert_ne!(first, second);
        assert_eq!(renderer.layers().len(), 2);

        let options = LayerOptions {
            radius: Radius::clamped(35.0),
            opacity: Opacity::clamped(0.4),
        };
        renderer.update(&mut second, options);
        assert_eq!(renderer.layers()[1].options, options);
        assert_eq!(renderer.layers()[0].options, LayerOptions::default());

        renderer.detach(first);
        assert_eq!(renderer.layers().len(), 1);
        assert_eq!(renderer.layers()[0].id, second);
    }

    #[test]
    fn unavailable_renderer_refuses_layers() {
        let mut renderer = CanvasRenderer::new(false);
        assert_eq!(
            renderer.attach(points(1), LayerOptions::default()),
            Err(DisplayError::RendererUnavailable)
        );
        assert!(renderer.layers().is_empty());
    }

    #[test]
    fn display_keeps_a_single_canvas_layer() {
        let mut display = HeatmapDisplay::new(CanvasRenderer::new(true), LayerOptions::default());
        display.show(points(4)).unwrap();
        display.show(points(2)).unwrap();
        assert_eq!(display.renderer().layers().len(), 1);
        assert_eq!(display.renderer().layers()[0].points.len(), 2);

        display.set_radius(Radius::clamped(50.0));
        assert_eq!(display.renderer().layers()[0].options.radius.pixels(), 50);

        display.show(PointList::new()).unwrap();
        assert!(display.renderer().layers().is_empty());
    }

    #[test]
    fn heat_ramp_runs_green_to_red() {
        let cold = heat_color(0.0, 0.5);
        let warm = heat_color(0.5, 0.5);
        let hot = heat_color(1.0, 2.0);
        assert_eq!((cold.r, cold.g), (0.0, 1.0));
        assert_eq!((warm.r, warm.g), (1.0, 1.0));
        assert_eq!((hot.r, hot.g), (1.0, 0.0));
        assert_eq!(hot.a, 1.0);
    }
}
