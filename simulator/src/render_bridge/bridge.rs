use crate::generator::profile::{build_recording, GeneratorConfig};
use crate::render_bridge::model::VisualizationModel;
use crate::workflow::runner::Runner;
use anyhow::Context;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{mpsc, Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

type SharedModel = Arc<RwLock<VisualizationModel>>;

pub fn bridge_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

#[derive(Debug)]
struct ScenarioRejected;

impl warp::reject::Reject for ScenarioRejected {}

/// Holds the latest render model and serves it to an external chart renderer.
pub struct RenderBridge {
    state: SharedModel,
    runner: Arc<Runner>,
}

impl RenderBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
            runner,
        }
    }

    /// Starts the HTTP endpoint on its own thread and runtime.
    ///
    /// Returns once the listener is bound, with the bound address, or with the
    /// bind error when the address is unavailable.
    pub fn serve(&self, address: SocketAddr) -> anyhow::Result<SocketAddr> {
        let routes = routes(self.state.clone(), self.runner.clone());
        let (ready_tx, ready_rx) = mpsc::channel::<anyhow::Result<SocketAddr>>();
        thread::Builder::new()
            .name("render-bridge".into())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(runtime) => runtime,
                    Err(err) => {
                        error!("failed to build bridge runtime: {}", err);
                        let _ = ready_tx.send(Err(anyhow::Error::new(err)
                            .context("building render bridge runtime")));
                        return;
                    }
                };
                runtime.block_on(async move {
                    match warp::serve(routes).try_bind_ephemeral(address) {
                        Ok((bound, server)) => {
                            let _ = ready_tx.send(Ok(bound));
                            server.await;
                        }
                        Err(err) => {
                            let _ = ready_tx.send(Err(anyhow::Error::new(err)
                                .context(format!("binding render bridge on {}", address))));
                        }
                    }
                });
            })
            .context("spawning render bridge thread")?;
        ready_rx
            .recv()
            .context("render bridge thread exited before binding")?
    }

    pub fn publish(&self, model: &VisualizationModel) {
        store(&self.state, model.clone());
        println!(
            "[bridge] waveform points: {}, status: {}",
            model.waveform.len(),
            model.status
        );
    }

    pub fn publish_status(&self, message: &str) {
        println!("[bridge] {}", message);
    }

    pub fn snapshot(&self) -> VisualizationModel {
        snapshot_of(&self.state)
    }
}

fn routes(
    state: SharedModel,
    runner: Arc<Runner>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let state_filter = warp::any().map(move || state.clone());
    let runner_filter = warp::any().map(move || runner.clone());

    let get_route = warp::path("diagnostics")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: SharedModel| warp::reply::json(&snapshot_of(&state)));

    let scenario_route = warp::path("analyze-scenario")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter)
        .and(runner_filter)
        .and_then(
            |config: GeneratorConfig, state: SharedModel, runner: Arc<Runner>| async move {
                match build_recording(&config) {
                    Ok(recording) => {
                        let result = runner.analyze_buffer(&recording.buffer);
                        let summary = result.outcome.summary();
                        let success = result.outcome.is_success();
                        store(&state, result.model);
                        if let Some(name) = config.scenario.as_ref() {
                            info!("scenario {} -> {}", name, summary);
                        }
                        Ok::<_, warp::Rejection>(warp::reply::with_status(
                            warp::reply::json(&json!({
                                "status": "ok",
                                "success": success,
                                "summary": summary,
                                "description": config.description.clone().unwrap_or_default()
                            })),
                            StatusCode::OK,
                        ))
                    }
                    Err(err) => {
                        error!("analyze-scenario error: {:#}", err);
                        Err(warp::reject::custom(ScenarioRejected))
                    }
                }
            },
        );

    get_route.or(scenario_route)
}

fn snapshot_of(state: &SharedModel) -> VisualizationModel {
    match state.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

fn store(state: &SharedModel, model: VisualizationModel) {
    let mut guard = match state.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = model;
}
