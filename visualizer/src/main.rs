use config::ViewConfig;
use heatcore::display::{
    Acquisition, HeatmapDisplay, LayerOptions, Opacity, ProviderCapabilities, ProviderGuard,
    ProviderRegistry, ProviderRequest, Radius,
};
use heatcore::interface::PointsPayload;
use heatcore::prelude::{DisplayError, LoadError};
use heatcore::processing::{LoadCycle, LoadOutcome, LoadToken, TimeWindow, LOADING_MESSAGE};
use heatmap::{CanvasRenderer, HeatmapCanvas};
use iced::{
    widget::{button, canvas::Canvas, column, pick_list, row, slider, text, Container},
    Element, Length, Task, Theme,
};
use log::{debug, info, warn};
use projection::MapView;

mod config;
mod heatmap;
mod projection;

/// Registry marker for the heatmap-capable map provider.
const PROVIDER_MARKER: &str = "heatmap.visualization";
const PROVIDER_ERROR: &str = "Error loading map provider";
const RENDERER_MISSING: &str = "Heatmap visualization library not loaded";
const ATTACH_ERROR: &str = "Error creating heatmap visualization";

fn main() -> iced::Result {
    env_logger::init();
    iced::application(Visualizer::boot, Visualizer::update, Visualizer::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Visualizer) -> String {
    "Crime Heatmap".into()
}

fn application_theme(_: &Visualizer) -> Theme {
    Theme::Dark
}

#[derive(Debug, Clone, PartialEq)]
enum MapState {
    Pending,
    Ready,
    Failed(DisplayError),
}

struct Visualizer {
    config: ViewConfig,
    map: MapState,
    provider: Option<ProviderGuard>,
    display: Option<HeatmapDisplay<CanvasRenderer>>,
    cycle: LoadCycle,
    window: TimeWindow,
    options: LayerOptions,
    status: String,
}

#[derive(Debug, Clone)]
enum Message {
    ProviderLoaded(Result<ProviderCapabilities, String>),
    WindowSelected(TimeWindow),
    RadiusChanged(u32),
    OpacityChanged(f32),
    ApplyFilters,
    Refresh,
    PointsFetched(LoadToken, LoadOutcome),
}

impl Visualizer {
    fn new(config: ViewConfig) -> Self {
        Self {
            config,
            map: MapState::Pending,
            provider: None,
            display: None,
            cycle: LoadCycle::new(),
            window: TimeWindow::default(),
            options: LayerOptions::default(),
            status: LOADING_MESSAGE.into(),
        }
    }

    fn boot() -> (Self, Task<Message>) {
        let mut state = Visualizer::new(ViewConfig::default());
        let task = state.acquire_provider(&ProviderRegistry::global());
        (state, task)
    }

    /// Requests the provider once per process; later callers reuse its capabilities.
    fn acquire_provider(&mut self, registry: &ProviderRegistry) -> Task<Message> {
        match registry.acquire(PROVIDER_MARKER) {
            Acquisition::Owner(guard) => {
                self.provider = Some(guard);
                Task::perform(
                    load_provider(self.config.provider_request()),
                    Message::ProviderLoaded,
                )
            }
            Acquisition::Present(capabilities) => self.map_ready(capabilities),
            Acquisition::InFlight => {
                debug!("map provider load already in flight");
                Task::none()
            }
            Acquisition::Failed(reason) => {
                self.provider_failed(reason);
                Task::none()
            }
        }
    }

    /// The map stays unavailable for the rest of the process.
    fn provider_failed(&mut self, reason: String) {
        let err = DisplayError::ProviderUnavailable(reason);
        warn!("{err}");
        self.map = MapState::Failed(err);
        self.status = PROVIDER_ERROR.into();
    }

    fn map_detail(&self) -> String {
        match &self.map {
            MapState::Failed(err) => err.to_string(),
            MapState::Pending | MapState::Ready => String::new(),
        }
    }

    fn map_ready(&mut self, capabilities: ProviderCapabilities) -> Task<Message> {
        if !capabilities.supports_heatmap() {
            warn!("map provider loaded without heatmap support");
        }
        self.map = MapState::Ready;
        self.display = Some(HeatmapDisplay::new(
            CanvasRenderer::new(capabilities.supports_heatmap()),
            self.options,
        ));
        self.start_load()
    }

    fn start_load(&mut self) -> Task<Message> {
        if self.map != MapState::Ready {
            return Task::none();
        }
        let window = self.window;
        let token = self.cycle.begin(window);
        self.status = LOADING_MESSAGE.into();
        info!("loading points for {}", window.label());
        Task::perform(
            fetch_points(self.config.points_url(), window),
            move |outcome| Message::PointsFetched(token, outcome),
        )
    }

    fn apply_outcome(&mut self, token: LoadToken, outcome: LoadOutcome) {
        let window = self.cycle.window();
        let Some(outcome) = self.cycle.complete(token, outcome).cloned() else {
            debug!("dropping result of superseded load {}", token.value());
            return;
        };
        self.status = outcome.status_message(window);

        if outcome.is_failure() {
            return;
        }
        let Some(display) = self.display.as_mut() else {
            return;
        };
        match display.show(outcome.points()) {
            Ok(shown) => debug!("heatmap updated: {shown:?}"),
            Err(DisplayError::RendererUnavailable) => self.status = RENDERER_MISSING.into(),
            Err(err) => {
                warn!("heatmap update failed: {err}");
                self.status = ATTACH_ERROR.into();
            }
        }
    }

    fn controls_enabled(&self) -> bool {
        self.map == MapState::Ready && !self.cycle.is_loading()
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::ProviderLoaded(result) => {
                let task = match &result {
                    Ok(capabilities) => state.map_ready(capabilities.clone()),
                    Err(reason) => {
                        state.provider_failed(reason.clone());
                        Task::none()
                    }
                };
                if let Some(guard) = &state.provider {
                    guard.resolve(result);
                }
                task
            }
            Message::WindowSelected(window) => {
                if !state.controls_enabled() || window == state.window {
                    return Task::none();
                }
                state.window = window;
                state.start_load()
            }
            Message::RadiusChanged(pixels) => {
                if state.controls_enabled() {
                    state.options.radius = Radius::clamped(f64::from(pixels));
                    if let Some(display) = state.display.as_mut() {
                        display.set_radius(state.options.radius);
                    }
                }
                Task::none()
            }
            Message::OpacityChanged(value) => {
                if state.controls_enabled() {
                    state.options.opacity = Opacity::clamped(value);
                    if let Some(display) = state.display.as_mut() {
                        display.set_opacity(state.options.opacity);
                    }
                }
                Task::none()
            }
            Message::ApplyFilters | Message::Refresh => {
                if state.controls_enabled() {
                    state.start_load()
                } else {
                    Task::none()
                }
            }
            Message::PointsFetched(token, outcome) => {
                state.apply_outcome(token, outcome);
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let enabled = state.controls_enabled();
        let radius = state.options.radius.pixels();
        let opacity = state.options.opacity.value();

        let controls = column![
            text("Crime Heatmap").size(26),
            text("Time range").size(14),
            pick_list(
                TimeWindow::PRESETS,
                Some(state.window),
                Message::WindowSelected
            ),
            text(format!("Heatmap radius: {radius}px")).size(14),
            slider(Radius::MIN..=Radius::MAX, radius, Message::RadiusChanged),
            text(format!("Opacity: {opacity:.1}")).size(14),
            slider(Opacity::MIN..=Opacity::MAX, opacity, Message::OpacityChanged)
                .step(Opacity::STEP),
            row![
                button("Apply Filters")
                    .on_press_maybe(enabled.then_some(Message::ApplyFilters))
                    .padding(10),
                button("Refresh Data")
                    .on_press_maybe(enabled.then_some(Message::Refresh))
                    .padding(10),
            ]
            .spacing(10),
            text(&state.status).size(14),
            text(state.map_detail()).size(12),
        ]
        .spacing(10)
        .padding(16)
        .width(Length::Fixed(320.0));

        let layers = state
            .display
            .as_ref()
            .map(|display| display.renderer().layers())
            .unwrap_or_default();
        let view = MapView::new(
            state.config.latitude,
            state.config.longitude,
            state.config.zoom,
        );
        let map = Canvas::new(HeatmapCanvas::new(view, layers))
            .width(Length::Fill)
            .height(Length::Fill);

        Container::new(row![controls, map].spacing(12))
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

async fn load_provider(request: ProviderRequest) -> Result<ProviderCapabilities, String> {
    let client = reqwest::Client::new();
    let response = client
        .get(request.url())
        .query(&request.query())
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("provider returned {}", response.status()));
    }
    response
        .json::<ProviderCapabilities>()
        .await
        .map_err(|e| e.to_string())
}

async fn request_points(url: String, window: TimeWindow) -> Result<PointsPayload, LoadError> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .query(&[("hours", window.hours())])
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(LoadError::Backend(format!("{status}: {body}")));
    }
    Ok(response.json::<PointsPayload>().await?)
}

/// Every failure, transport included, comes back as a failed outcome.
async fn fetch_points(url: String, window: TimeWindow) -> LoadOutcome {
    match request_points(url, window).await {
        Ok(payload) => payload.outcome,
        Err(err) => LoadOutcome::Failed {
            reason: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatcore::display::VISUALIZATION_LIBRARY;
    use heatcore::interface::{GeoPoint, HeatPoint, PointList};

    fn heatmap_caps() -> ProviderCapabilities {
        ProviderCapabilities {
            libraries: vec![VISUALIZATION_LIBRARY.into()],
        }
    }

    fn ready_visualizer() -> Visualizer {
        let mut state = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = state.map_ready(heatmap_caps());
        state
    }

    fn loaded(count: usize) -> LoadOutcome {
        let points: PointList = (0..count)
            .map(|i| HeatPoint::Plain {
                location: GeoPoint::new(28.5 + i as f64 * 0.001, 77.1).unwrap(),
            })
            .collect();
        LoadOutcome::Loaded { points, rejected: 0 }
    }

    fn current_token(state: &Visualizer) -> LoadToken {
        match state.cycle.phase() {
            heatcore::processing::LoadPhase::Loading(token) => token,
            heatcore::processing::LoadPhase::Idle => panic!("no load in flight"),
        }
    }

    fn layer_count(state: &Visualizer) -> usize {
        state
            .display
            .as_ref()
            .map(|display| display.renderer().layers().len())
            .unwrap_or(0)
    }

    #[test]
    fn provider_ready_starts_first_load() {
        let state = ready_visualizer();
        assert!(state.cycle.is_loading());
        assert_eq!(state.status, LOADING_MESSAGE);
        assert!(!state.controls_enabled());
    }

    #[test]
    fn loaded_points_replace_the_layer() {
        let mut state = ready_visualizer();
        let token = current_token(&state);
        let _ = Visualizer::update(&mut state, Message::PointsFetched(token, loaded(3)));
        assert_eq!(state.status, "Showing 3 crimes from the last 24 hours");
        assert_eq!(layer_count(&state), 1);
        assert!(state.controls_enabled());

        let _ = Visualizer::update(&mut state, Message::Refresh);
        let token = current_token(&state);
        let _ = Visualizer::update(&mut state, Message::PointsFetched(token, LoadOutcome::Empty));
        assert_eq!(state.status, "No crime data found");
        assert_eq!(layer_count(&state), 0);
    }

    #[test]
    fn superseded_result_is_ignored() {
        let mut state = ready_visualizer();
        let stale = current_token(&state);
        state.cycle.complete(stale, LoadOutcome::Empty);
        let _ = Visualizer::update(&mut state, Message::WindowSelected(TimeWindow::ALL_TIME));
        let fresh = current_token(&state);

        let _ = Visualizer::update(&mut state, Message::PointsFetched(stale, loaded(5)));
        assert_eq!(layer_count(&state), 0);
        assert_eq!(state.status, LOADING_MESSAGE);

        let _ = Visualizer::update(&mut state, Message::PointsFetched(fresh, loaded(2)));
        assert_eq!(state.status, "Showing all 2 crime locations");
        assert_eq!(layer_count(&state), 1);
    }

    #[test]
    fn failure_keeps_previous_layer() {
        let mut state = ready_visualizer();
        let token = current_token(&state);
        let _ = Visualizer::update(&mut state, Message::PointsFetched(token, loaded(2)));

        let _ = Visualizer::update(&mut state, Message::ApplyFilters);
        let token = current_token(&state);
        let failure = LoadOutcome::Failed {
            reason: "connection failed".into(),
        };
        let _ = Visualizer::update(&mut state, Message::PointsFetched(token, failure));
        assert_eq!(state.status, "Error loading crime data: connection failed");
        assert_eq!(layer_count(&state), 1);
    }

    #[test]
    fn missing_heatmap_library_is_reported() {
        let mut state = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = state.map_ready(ProviderCapabilities::default());
        let token = current_token(&state);
        let _ = Visualizer::update(&mut state, Message::PointsFetched(token, loaded(2)));
        assert_eq!(state.status, RENDERER_MISSING);
        assert_eq!(layer_count(&state), 0);
    }

    #[test]
    fn sliders_update_the_live_layer() {
        let mut state = ready_visualizer();
        let token = current_token(&state);
        let _ = Visualizer::update(&mut state, Message::PointsFetched(token, loaded(2)));

        let _ = Visualizer::update(&mut state, Message::RadiusChanged(42));
        let _ = Visualizer::update(&mut state, Message::OpacityChanged(0.3));
        let display = state.display.as_ref().unwrap();
        let layer = &display.renderer().layers()[0];
        assert_eq!(layer.options.radius.pixels(), 42);
        assert!((layer.options.opacity.value() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn provider_failure_is_sticky() {
        let registry = ProviderRegistry::new();
        let mut first = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = first.acquire_provider(&registry);
        assert!(first.provider.is_some());

        let mut second = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = second.acquire_provider(&registry);
        assert_eq!(second.map, MapState::Pending);

        let _ = Visualizer::update(&mut first, Message::ProviderLoaded(Err("offline".into())));
        assert_eq!(first.status, PROVIDER_ERROR);
        assert_eq!(
            first.map,
            MapState::Failed(DisplayError::ProviderUnavailable("offline".into()))
        );
        assert_eq!(first.map_detail(), "map provider unavailable: offline");

        let mut third = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = third.acquire_provider(&registry);
        assert!(matches!(
            third.map,
            MapState::Failed(DisplayError::ProviderUnavailable(ref reason)) if reason == "offline"
        ));
        assert_eq!(third.status, PROVIDER_ERROR);
    }

    #[test]
    fn loaded_provider_is_reused() {
        let registry = ProviderRegistry::new();
        let mut first = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = first.acquire_provider(&registry);
        let _ = Visualizer::update(&mut first, Message::ProviderLoaded(Ok(heatmap_caps())));
        assert_eq!(first.map, MapState::Ready);

        let mut second = Visualizer::new(ViewConfig::from_lookup(|_| None));
        let _ = second.acquire_provider(&registry);
        assert!(second.provider.is_none());
        assert_eq!(second.map, MapState::Ready);
        assert!(second.cycle.is_loading());
    }
}
