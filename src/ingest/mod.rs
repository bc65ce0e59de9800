// src/ingest/mod.rs
pub mod providers;
pub mod scheduler;
pub mod types;

use crate::error::SourceError;
use crate::ingest::types::{ListingRef, Snapshot, SnapshotSource};
use chrono::{DateTime, Duration, Utc};
use metrics::{counter, describe_counter, describe_gauge};
use once_cell::sync::OnceCell;
use std::collections::HashSet;
use std::sync::Arc;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_snapshots_total",
            "Snapshots fetched from the listing source."
        );
        describe_counter!(
            "ingest_source_errors_total",
            "Snapshot fetch/parse errors."
        );
        describe_counter!(
            "ingest_new_listings_total",
            "Listings present now but absent from the baseline snapshot."
        );
        describe_gauge!(
            "ingest_current_listing_count",
            "Items in the most recent current snapshot."
        );
    });
}

/// Detail page for an absolute posting id.
pub fn canonical_url(base: &str, posting_id: i64) -> String {
    format!("{base}{posting_id}.html")
}

/// Ids present in `current` but not in `baseline`, in `current` order,
/// each emitted once, resolved against `current`'s own decode offset.
///
/// An id that does not fit next to the offset makes the snapshot malformed.
pub fn diff_snapshots(
    baseline: &Snapshot,
    current: &Snapshot,
    base: &str,
) -> Result<Vec<ListingRef>, SourceError> {
    let baseline_ids: HashSet<i64> = baseline.items.iter().map(|it| it.id).collect();
    let mut emitted: HashSet<i64> = HashSet::new();

    current
        .items
        .iter()
        .filter(|it| !baseline_ids.contains(&it.id))
        .filter(|it| emitted.insert(it.id))
        .map(|it| {
            let posting_id = current.decode_offset.checked_add(it.id).ok_or_else(|| {
                SourceError::Malformed(format!(
                    "id {} overflows decode offset {}",
                    it.id, current.decode_offset
                ))
            })?;
            Ok(ListingRef {
                id: posting_id,
                url: canonical_url(base, posting_id),
            })
        })
        .collect()
}

/// Turns two snapshots of the feed into the "new since last check" set.
#[derive(Clone)]
pub struct SnapshotDiffer {
    source: Arc<dyn SnapshotSource>,
    listing_base_url: String,
}

impl SnapshotDiffer {
    pub fn new(source: Arc<dyn SnapshotSource>, listing_base_url: impl Into<String>) -> Self {
        Self {
            source,
            listing_base_url: listing_base_url.into(),
        }
    }

    /// Listings that appeared within `lookback` of `now`.
    ///
    /// Two sequential fetches (baseline, then current). Either failing fails
    /// the whole call; no partial diff is produced. Listings that appeared and
    /// vanished inside the window are not reported.
    pub async fn new_listing_refs(
        &self,
        lookback: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ListingRef>, SourceError> {
        ensure_metrics_described();
        let baseline_time = now - lookback;

        let baseline = self.fetch(baseline_time).await?;
        let current = self.fetch(now).await?;

        let refs = diff_snapshots(&baseline, &current, &self.listing_base_url)?;

        metrics::gauge!("ingest_current_listing_count").set(current.items.len() as f64);
        counter!("ingest_new_listings_total").increment(refs.len() as u64);
        tracing::info!(
            target: "ingest",
            source = self.source.name(),
            baseline = baseline.items.len(),
            current = current.items.len(),
            new = refs.len(),
            lookback_mins = lookback.num_minutes(),
            "snapshot diff computed"
        );

        Ok(refs)
    }

    async fn fetch(&self, as_of: DateTime<Utc>) -> Result<Snapshot, SourceError> {
        match self.source.fetch_snapshot(as_of).await {
            Ok(s) => {
                counter!("ingest_snapshots_total").increment(1);
                Ok(s)
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    error = %e,
                    source = self.source.name(),
                    as_of = %as_of,
                    "snapshot fetch failed"
                );
                counter!("ingest_source_errors_total").increment(1);
                Err(e)
            }
        }
    }
}
