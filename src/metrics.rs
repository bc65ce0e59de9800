// src/metrics.rs
//! Prometheus recorder. Installed once per process, before any run, so the
//! counters from every mode land in the same registry.

use axum::{extract::State, routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder and publish the configured cadence.
    /// Fails if another recorder is already installed.
    pub fn init(check_interval_minutes: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        gauge!("pipeline_check_interval_minutes").set(check_interval_minutes as f64);

        Ok(Self { handle })
    }

    /// Current exposition text.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(exposition))
            .with_state(self.handle.clone())
    }
}

async fn exposition(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
