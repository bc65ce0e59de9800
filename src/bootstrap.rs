// src/bootstrap.rs
use crate::analyze::classifier::AnthropicClassifier;
use crate::config::AppConfig;
use crate::ingest::providers::craigslist::CraigslistSource;
use crate::ingest::SnapshotDiffer;
use crate::listing::HttpDetailFetcher;
use crate::notify::NotifierMux;
use crate::pipeline::{PipelineRunner, PipelineSettings};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build a runner wired to the real feed, detail pages, classifier and channels.
pub fn build_runner(cfg: &AppConfig) -> anyhow::Result<PipelineRunner> {
    let source = CraigslistSource::from_config(&cfg.search).context("building snapshot source")?;
    let differ = SnapshotDiffer::new(Arc::new(source), cfg.search.listing_base_url.clone());

    let details = HttpDetailFetcher::new(Duration::from_secs(cfg.search.timeout_secs))
        .context("building detail fetcher")?;
    let classifier =
        AnthropicClassifier::from_config(&cfg.classifier).context("building classifier")?;
    let notifier = NotifierMux::from_config(&cfg.notify).context("building notifiers")?;

    // Safe diagnostics: no secrets, only shape.
    info!(
        "pipeline wired: interval={}m, item_delay={}s, model={}, key_len={}, channels={:?}",
        cfg.check_interval_minutes,
        cfg.item_delay_secs,
        cfg.classifier.model,
        cfg.classifier.api_key.len(),
        notifier.channel_names()
    );

    Ok(PipelineRunner::new(
        differ,
        Arc::new(details),
        Arc::new(classifier),
        notifier,
        PipelineSettings {
            lookback: cfg.lookback(),
            item_delay: cfg.item_delay(),
        },
    ))
}
