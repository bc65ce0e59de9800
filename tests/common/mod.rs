// tests/common/mod.rs
// Recording test doubles for the four pipeline boundaries.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;

use bike_alert::analyze::classifier::{Classifier, Confidence, Verdict};
use bike_alert::error::{ClassificationFailure, DetailUnavailable, NotificationFailure, SourceError};
use bike_alert::ingest::types::{Snapshot, SnapshotItem, SnapshotSource};
use bike_alert::ingest::SnapshotDiffer;
use bike_alert::listing::{DetailFetcher, ListingDetail};
use bike_alert::notify::{ListingAlert, Notifier, NotifierMux};
use bike_alert::pipeline::{PipelineRunner, PipelineSettings};

pub const BASE: &str = "https://sfbay.craigslist.org/bik/";
pub const OFFSET: i64 = 7_800_000_000;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap()
}

pub fn snapshot(ids: &[i64], offset: i64) -> Snapshot {
    Snapshot {
        items: ids
            .iter()
            .map(|&id| SnapshotItem {
                id,
                raw: serde_json::json!([id, "1:0~37.7~-122.4", 0]),
            })
            .collect(),
        decode_offset: offset,
        fetched_at: now(),
    }
}

pub fn url(id: i64) -> String {
    format!("{BASE}{}.html", OFFSET + id)
}

// ---- snapshot source ----

/// Serves `baseline` for any timestamp before `current_at`, `current` at or after it.
/// `None` simulates an unavailable feed.
pub struct FakeSource {
    pub baseline: Option<Snapshot>,
    pub current: Option<Snapshot>,
    pub current_at: DateTime<Utc>,
    pub delay: Duration,
    pub calls: Mutex<Vec<DateTime<Utc>>>,
}

impl FakeSource {
    pub fn new(baseline: Option<Snapshot>, current: Option<Snapshot>) -> Self {
        Self {
            baseline,
            current,
            current_at: now(),
            delay: Duration::ZERO,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn ids(baseline: &[i64], current: &[i64]) -> Self {
        Self::new(Some(snapshot(baseline, OFFSET)), Some(snapshot(current, OFFSET)))
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SnapshotSource for FakeSource {
    async fn fetch_snapshot(&self, as_of: DateTime<Utc>) -> Result<Snapshot, SourceError> {
        self.calls.lock().push(as_of);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let pick = if as_of >= self.current_at {
            &self.current
        } else {
            &self.baseline
        };
        pick.clone()
            .ok_or_else(|| SourceError::Malformed("missing data.items".into()))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

// ---- detail fetcher ----

pub fn detail_for(url: &str) -> ListingDetail {
    ListingDetail {
        title: format!("Bike at {url}"),
        price: Some("$1,200".into()),
        bicycle_type: Some("road".into()),
        wheel_size: None,
        frame_size: None,
        frame_material: Some("carbon fiber".into()),
        manufacturer: Some("Trek".into()),
        model: None,
        condition: None,
        body: "Shimano 105, 11 speed".into(),
        url: url.to_string(),
    }
}

#[derive(Default)]
pub struct FakeDetails {
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeDetails {
    pub fn failing_on(urls: &[String]) -> Self {
        Self {
            failing: urls.iter().cloned().collect(),
            calls: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl DetailFetcher for FakeDetails {
    async fn fetch_detail(&self, url: &str) -> Result<ListingDetail, DetailUnavailable> {
        self.calls.lock().push(url.to_string());
        if self.failing.contains(url) {
            return Err(DetailUnavailable::Status(404));
        }
        Ok(detail_for(url))
    }
}

// ---- classifier ----

pub fn verdict(is_good: bool, confidence: Confidence) -> Verdict {
    Verdict {
        is_good,
        reason: format!("good={is_good}"),
        confidence,
    }
}

/// Verdict per listing URL; URLs without an entry fail classification.
#[derive(Default)]
pub struct ScriptedClassifier {
    pub verdicts: HashMap<String, Verdict>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedClassifier {
    pub fn with(entries: Vec<(String, Verdict)>) -> Self {
        Self {
            verdicts: entries.into_iter().collect(),
            calls: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, detail: &ListingDetail) -> Result<Verdict, ClassificationFailure> {
        self.calls.lock().push(detail.url.clone());
        self.verdicts
            .get(&detail.url)
            .cloned()
            .ok_or_else(|| ClassificationFailure::Unparseable("no tool call".into()))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

// ---- notifier ----

pub struct RecordingNotifier {
    pub ok: bool,
    pub sent: Arc<Mutex<Vec<ListingAlert>>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, alert: &ListingAlert) -> Result<(), NotificationFailure> {
        self.sent.lock().push(alert.clone());
        if self.ok {
            Ok(())
        } else {
            Err(NotificationFailure::Status {
                status: 503,
                body: "unavailable".into(),
            })
        }
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ---- wiring ----

pub struct Harness {
    pub source: Arc<FakeSource>,
    pub details: Arc<FakeDetails>,
    pub classifier: Arc<ScriptedClassifier>,
    pub sent: Arc<Mutex<Vec<ListingAlert>>>,
    pub runner: PipelineRunner,
}

impl Harness {
    pub fn new(
        source: FakeSource,
        details: FakeDetails,
        classifier: ScriptedClassifier,
        notifier_ok: bool,
        item_delay: Duration,
    ) -> Self {
        let source = Arc::new(source);
        let details = Arc::new(details);
        let classifier = Arc::new(classifier);
        let sent = Arc::new(Mutex::new(vec![]));
        let mux = NotifierMux::new(
            vec![Box::new(RecordingNotifier {
                ok: notifier_ok,
                sent: sent.clone(),
            })],
            150,
        );
        let runner = PipelineRunner::new(
            SnapshotDiffer::new(source.clone(), BASE),
            details.clone(),
            classifier.clone(),
            mux,
            PipelineSettings {
                lookback: chrono::Duration::minutes(15),
                item_delay,
            },
        );
        Self {
            source,
            details,
            classifier,
            sent,
            runner,
        }
    }
}
