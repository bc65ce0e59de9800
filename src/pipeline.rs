// src/pipeline.rs
//! One end-to-end run: diff the feed, then for each new listing
//! fetch → classify → (maybe) notify, strictly one at a time.
//!
//! Failures are contained per item. Only the snapshot diff is all-or-nothing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::Instrument;

use crate::analyze::classifier::{Classifier, Verdict};
use crate::error::PipelineError;
use crate::ingest::types::ListingRef;
use crate::ingest::SnapshotDiffer;
use crate::listing::DetailFetcher;
use crate::notify::NotifierMux;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Pipeline runs started.");
        describe_counter!(
            "pipeline_run_failures_total",
            "Runs aborted because the listing source was unavailable."
        );
        describe_counter!(
            "pipeline_detail_failures_total",
            "Listings skipped because the detail page was unavailable."
        );
        describe_counter!(
            "pipeline_classification_failures_total",
            "Listings rejected because classification failed."
        );
        describe_counter!("pipeline_good_total", "Listings classified as good.");
        describe_counter!(
            "pipeline_high_confidence_total",
            "Good listings with high confidence (alerted)."
        );
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last finished.");
    });
}

/// Counters for one run. Not persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_new: usize,
    pub good_count: usize,
    pub high_confidence_count: usize,
    /// Listings that reached the classifier, including failed calls.
    pub classified: usize,
    /// Listings dropped because the detail page was unavailable.
    pub skipped: usize,
    /// Not-good verdicts plus classification failures.
    pub rejected: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ItemOutcome {
    Skipped,
    Rejected { reason: String },
    Good { verdict: Verdict },
}

#[derive(Debug, Clone, Copy)]
pub struct PipelineSettings {
    /// Must equal the trigger interval.
    pub lookback: chrono::Duration,
    /// Constant pause between consecutive listings.
    pub item_delay: Duration,
}

pub struct PipelineRunner {
    differ: SnapshotDiffer,
    details: Arc<dyn DetailFetcher>,
    classifier: Arc<dyn Classifier>,
    notifier: NotifierMux,
    settings: PipelineSettings,
}

impl PipelineRunner {
    pub fn new(
        differ: SnapshotDiffer,
        details: Arc<dyn DetailFetcher>,
        classifier: Arc<dyn Classifier>,
        notifier: NotifierMux,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            differ,
            details,
            classifier,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> PipelineSettings {
        self.settings
    }

    pub async fn run_now(&self) -> Result<RunSummary, PipelineError> {
        self.run(Utc::now()).await
    }

    /// Run once as of `now`. Errors only when the new-listing set cannot be obtained.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        ensure_metrics_described();
        counter!("pipeline_runs_total").increment(1);
        tracing::info!(target: "pipeline", classifier = self.classifier.provider_name(), "starting bike alert check");

        let refs = match self.differ.new_listing_refs(self.settings.lookback, now).await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(target: "pipeline", error = %e, "failed to fetch new listings");
                counter!("pipeline_run_failures_total").increment(1);
                return Err(PipelineError::SourceUnavailable(e));
            }
        };

        let mut summary = RunSummary {
            total_new: refs.len(),
            ..RunSummary::default()
        };

        if refs.is_empty() {
            tracing::info!(
                target: "pipeline",
                lookback_mins = self.settings.lookback.num_minutes(),
                "no new listings"
            );
            gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
            return Ok(summary);
        }

        tracing::info!(target: "pipeline", count = refs.len(), "new listings to check");

        for (i, listing) in refs.iter().enumerate() {
            if i > 0 && !self.settings.item_delay.is_zero() {
                tokio::time::sleep(self.settings.item_delay).await;
            }
            let span = tracing::info_span!("listing", n = i + 1, of = refs.len(), url = %listing.url);

            match self.process(listing).instrument(span).await {
                ItemOutcome::Skipped => summary.skipped += 1,
                ItemOutcome::Rejected { reason } => {
                    tracing::debug!(target: "pipeline", id = listing.id, %reason, "counted as rejected");
                    summary.classified += 1;
                    summary.rejected += 1;
                }
                ItemOutcome::Good { verdict } => {
                    summary.classified += 1;
                    summary.good_count += 1;
                    if verdict.is_high_confidence_match() {
                        summary.high_confidence_count += 1;
                    }
                }
            }
        }

        gauge!("pipeline_last_run_ts").set(Utc::now().timestamp() as f64);
        tracing::info!(
            target: "pipeline",
            total_new = summary.total_new,
            good = summary.good_count,
            high_confidence = summary.high_confidence_count,
            skipped = summary.skipped,
            "check complete"
        );
        Ok(summary)
    }

    async fn process(&self, listing: &ListingRef) -> ItemOutcome {
        let detail = match self.details.fetch_detail(&listing.url).await {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(target: "pipeline", error = %e, "failed to fetch listing; skipping");
                counter!("pipeline_detail_failures_total").increment(1);
                return ItemOutcome::Skipped;
            }
        };
        tracing::info!(
            target: "pipeline",
            title = %detail.title,
            price = detail.price.as_deref().unwrap_or("-"),
            kind = detail.bicycle_type.as_deref().unwrap_or("-"),
            "parsed listing"
        );

        let verdict = match self.classifier.classify(&detail).await {
            Ok(v) => v,
            Err(e) => {
                let reason = format!("Classification failed: {e}");
                tracing::error!(target: "pipeline", %reason, "listing rejected");
                counter!("pipeline_classification_failures_total").increment(1);
                return ItemOutcome::Rejected { reason };
            }
        };

        if !verdict.is_good {
            tracing::info!(
                target: "pipeline",
                confidence = ?verdict.confidence,
                reason = %verdict.reason,
                "rejected"
            );
            return ItemOutcome::Rejected {
                reason: verdict.reason,
            };
        }

        tracing::info!(
            target: "pipeline",
            confidence = ?verdict.confidence,
            reason = %verdict.reason,
            url = %detail.url,
            "good bike found"
        );
        counter!("pipeline_good_total").increment(1);

        if verdict.is_high_confidence_match() {
            counter!("pipeline_high_confidence_total").increment(1);
            // Delivery is best effort; the mux logs failures.
            let _ = self.notifier.notify(&detail, &verdict.reason).await;
        }

        ItemOutcome::Good { verdict }
    }
}
