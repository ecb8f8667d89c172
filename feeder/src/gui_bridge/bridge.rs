use crate::gui_bridge::model::StatusModel;
use crate::workflow::config::BridgeConfig;
use crate::workflow::runner::Runner;
use heatcore::display::ProviderCapabilities;
use heatcore::interface::PointsPayload;
use heatcore::processing::{LoadCycle, LoadOutcome, LoadToken, TimeWindow};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread;
use tokio::runtime::Builder;
use warp::Filter;

#[derive(Debug, Default, Deserialize)]
struct PointsQuery {
    hours: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderQuery {
    key: Option<String>,
    libraries: Option<String>,
}

impl ProviderQuery {
    fn has_credential(&self) -> bool {
        self.key.as_deref().is_some_and(|key| !key.trim().is_empty())
    }
}

/// State shared by every bridge request.
#[derive(Clone)]
pub struct BridgeState {
    cycle: Arc<RwLock<LoadCycle>>,
    runner: Arc<Runner>,
    libraries: Arc<Vec<String>>,
}

impl BridgeState {
    pub fn new(runner: Arc<Runner>, libraries: Vec<String>) -> Self {
        Self {
            cycle: Arc::new(RwLock::new(LoadCycle::new())),
            runner,
            libraries: Arc::new(libraries),
        }
    }

    fn begin(&self, window: TimeWindow) -> LoadToken {
        self.cycle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .begin(window)
    }

    /// Applies the outcome only if no newer load started meanwhile.
    fn complete(&self, token: LoadToken, outcome: LoadOutcome) -> bool {
        let applied = self
            .cycle
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .complete(token, outcome)
            .is_some();
        if !applied {
            debug!("load {} superseded by a newer request", token.value());
            self.runner.record_stale();
        }
        applied
    }

    pub fn status(&self) -> StatusModel {
        let cycle = self.cycle.read().unwrap_or_else(PoisonError::into_inner);
        StatusModel::from_cycle(&cycle, self.runner.metrics())
    }
}

/// Routes: `GET /points?hours=N`, `GET /status`, `GET /provider?key=..&libraries=..`.
pub fn routes(
    state: BridgeState,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    let points_route = warp::path("points")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<PointsQuery>())
        .and(state_filter.clone())
        .and_then(load_points);

    let status_route = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| warp::reply::json(&state.status()));

    let provider_route = warp::path("provider")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<ProviderQuery>())
        .and(state_filter)
        .map(|query: ProviderQuery, state: BridgeState| {
            warp::reply::json(&provider_capabilities(&query, &state.libraries))
        });

    points_route.or(status_route).or(provider_route)
}

async fn load_points(query: PointsQuery, state: BridgeState) -> Result<impl warp::Reply, Infallible> {
    let window = query.hours.map(TimeWindow::from_hours).unwrap_or_default();
    let token = state.begin(window);
    let outcome = run_load(state.runner.clone(), window).await;
    state.complete(token, outcome.clone());
    Ok(warp::reply::json(&PointsPayload::new(token, window, outcome)))
}

/// Runs one load on its own task; a panicking load still yields an outcome for the token.
async fn run_load(runner: Arc<Runner>, window: TimeWindow) -> LoadOutcome {
    match tokio::spawn(async move { runner.execute(window).await }).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("load task for {} aborted: {err}", window.label());
            LoadOutcome::Failed {
                reason: format!("load task aborted: {err}"),
            }
        }
    }
}

fn provider_capabilities(query: &ProviderQuery, available: &[String]) -> ProviderCapabilities {
    if query.has_credential() {
        debug!("provider requested with a credential");
    } else {
        warn!("provider requested without a credential");
    }
    let libraries = match &query.libraries {
        Some(requested) => requested
            .split(',')
            .map(str::trim)
            .filter(|name| available.iter().any(|lib| lib == name))
            .map(str::to_string)
            .collect(),
        None => available.to_vec(),
    };
    ProviderCapabilities { libraries }
}

/// Hosts the bridge endpoint on its own thread.
pub struct GuiBridge {
    state: BridgeState,
}

impl GuiBridge {
    pub fn spawn(runner: Arc<Runner>, config: &BridgeConfig) -> Self {
        let state = BridgeState::new(runner, config.libraries.clone());
        let filter = routes(state.clone());
        let address = config.bind_address();

        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    error!("failed to build bridge runtime: {err}");
                    return;
                }
            };
            runtime.block_on(async move {
                match warp::serve(filter).try_bind_ephemeral(address) {
                    Ok((bound, server)) => {
                        info!("bridge listening on http://{bound}");
                        server.await;
                    }
                    Err(err) => error!("failed to bind bridge on {address}: {err}"),
                }
            });
        });

        Self { state }
    }

    /// Records a load that ran outside a request, such as the offline pass.
    pub fn publish(&self, window: TimeWindow, outcome: LoadOutcome) {
        let token = self.state.begin(window);
        self.state.complete(token, outcome);
        self.publish_status(&self.state.status().message.unwrap_or_default());
    }

    pub fn publish_status(&self, message: &str) {
        info!("[bridge] {}", message);
    }
}
