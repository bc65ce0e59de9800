// src/ingest/scheduler.rs
use crate::pipeline::PipelineRunner;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Run the pipeline every `interval`. The runner's lookback should equal
/// `interval`; a shorter interval double-reports, a longer one misses listings.
pub fn spawn_scheduler(runner: Arc<PipelineRunner>, interval: Duration) -> JoinHandle<()> {
    let lookback = runner.settings().lookback;
    if lookback.to_std().ok() != Some(interval) {
        tracing::warn!(
            target: "ingest",
            interval_secs = interval.as_secs(),
            lookback_secs = lookback.num_seconds(),
            "scheduler interval differs from lookback window"
        );
    }

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            counter!("ingest_scheduler_ticks_total").increment(1);
            match runner.run_now().await {
                Ok(summary) => tracing::info!(
                    target: "ingest",
                    total_new = summary.total_new,
                    good = summary.good_count,
                    high_confidence = summary.high_confidence_count,
                    "scheduled run finished"
                ),
                Err(e) => tracing::warn!(target: "ingest", error = %e, "scheduled run failed"),
            }
        }
    })
}
