//! bike-alert binary entrypoint.
//!
//! Modes (first argument):
//!   serve  (default) HTTP trigger on `server.bind`: GET|POST /check, /health, /metrics
//!   watch  in-process scheduler, one run every `check_interval_minutes`;
//!          `/health` and `/metrics` stay reachable on `server.bind`
//!   once   single run; exits non-zero when the listing source is unavailable
//!          and logs the final metrics snapshot at debug level

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::Context;
use bike_alert::{api, bootstrap, config::AppConfig, ingest::scheduler, metrics::Metrics};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bike_alert=info,warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

async fn bind(addr: &str) -> anyhow::Result<tokio::net::TcpListener> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(bind = %addr, "listening");
    Ok(listener)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load_default().context("loading configuration")?;
    let runner = Arc::new(bootstrap::build_runner(&cfg)?);

    let mode = std::env::args().nth(1).unwrap_or_else(|| "serve".to_string());
    // every mode records counters; the recorder must exist before the first run
    let metrics = Metrics::init(cfg.check_interval_minutes)?;

    match mode.as_str() {
        "once" => {
            let summary = runner.run_now().await?;
            tracing::info!(?summary, "run finished");
            tracing::debug!(metrics = %metrics.render(), "final metrics");
        }
        "watch" => {
            let handle = scheduler::spawn_scheduler(runner, cfg.check_interval());
            let app = api::health_router().merge(metrics.router());
            let listener = bind(&cfg.server.bind).await?;
            tokio::select! {
                res = handle => res.context("scheduler task")?,
                res = axum::serve(listener, app).into_future() => res.context("metrics server")?,
            }
        }
        "serve" => {
            let app = api::router(api::AppState::new(runner)).merge(metrics.router());
            let listener = bind(&cfg.server.bind).await?;
            axum::serve(listener, app).await.context("http server")?;
        }
        other => anyhow::bail!("unknown mode {other:?} (expected serve | watch | once)"),
    }
    Ok(())
}
