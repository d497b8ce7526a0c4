use std::{future::Future, sync::Arc};

use anyhow::Context;
use tokio::task::JoinHandle;
use tracing::{info, Instrument};

use crate::{
    client::HttpSensorApi, config::DashboardConfig, poller::Poller, render::Renderer,
    state::DashboardState,
};

pub mod chart;
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod render;
pub mod scroll;
pub mod state;
pub mod view;

pub use models;

/// Polls the sensor server and redraws the dashboard until Ctrl-C.
pub async fn run_dashboard(config: DashboardConfig) -> anyhow::Result<()> {
    info!(base_url = %config.base_url, "starting dashboard");

    let state = Arc::new(DashboardState::new());
    let api = Arc::new(HttpSensorApi::new(config.base_url.clone()));
    let renderer = Renderer::new(state.clone(), &config);
    let changes = state.subscribe();

    let mut poller = Poller::new(api, state, &config).activate();

    let result = tokio::select! {
        _ = renderer.run(changes) => Ok(()),
        r = tokio::signal::ctrl_c() => r.context("failed to listen for ctrl-c"),
    };

    poller.deactivate();
    result
}

/// Spawns `future` inside a span carrying `name`, so task output in the
/// logs can be told apart.
#[track_caller]
fn spawn<T: Send + 'static>(
    name: &'static str,
    future: impl Future<Output = T> + Send + 'static,
) -> JoinHandle<T> {
    tokio::spawn(future.instrument(tracing::debug_span!("task", name)))
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };

    use super::*;

    #[tokio::test]
    async fn spawned_task_runs_to_completion() {
        let ran = Arc::new(AtomicBool::new(false));
        let handle = spawn("test_task", {
            let ran = ran.clone();
            async move {
                ran.store(true, Ordering::SeqCst);
                7
            }
        });

        assert_eq!(handle.await.unwrap(), 7);
        assert!(ran.load(Ordering::SeqCst));
    }
}
