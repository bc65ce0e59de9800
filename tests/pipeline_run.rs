// tests/pipeline_run.rs
mod common;

use std::time::Duration;

use bike_alert::analyze::classifier::Confidence;
use bike_alert::{PipelineError, RunSummary};
use common::{now, url, verdict, FakeDetails, FakeSource, Harness, ScriptedClassifier};

#[tokio::test]
async fn empty_diff_returns_zero_summary_without_downstream_calls() {
    let h = Harness::new(
        FakeSource::ids(&[1, 2, 3], &[3, 1]),
        FakeDetails::default(),
        ScriptedClassifier::default(),
        true,
        Duration::ZERO,
    );

    let summary = h.runner.run(now()).await.expect("run");

    assert_eq!(summary, RunSummary::default());
    assert!(h.details.calls.lock().is_empty());
    assert!(h.classifier.calls.lock().is_empty());
    assert!(h.sent.lock().is_empty());
}

#[tokio::test]
async fn detail_failure_skips_only_that_item() {
    let (u1, u2, u3) = (url(4), url(5), url(6));
    let h = Harness::new(
        FakeSource::ids(&[1], &[4, 5, 6]),
        FakeDetails::failing_on(&[u2.clone()]),
        ScriptedClassifier::with(vec![
            (u1.clone(), verdict(false, Confidence::High)),
            (u3.clone(), verdict(false, Confidence::Low)),
        ]),
        true,
        Duration::ZERO,
    );

    let summary = h.runner.run(now()).await.unwrap();

    assert_eq!(summary.total_new, 3);
    assert_eq!(summary.classified, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(*h.details.calls.lock(), vec![u1.clone(), u2, u3.clone()]);
    assert_eq!(*h.classifier.calls.lock(), vec![u1, u3]);
}

#[tokio::test]
async fn classification_failure_does_not_abort_run() {
    let (u1, u2) = (url(4), url(5));
    // no verdict scripted for u1 -> classifier error
    let h = Harness::new(
        FakeSource::ids(&[], &[4, 5]),
        FakeDetails::default(),
        ScriptedClassifier::with(vec![(u2.clone(), verdict(true, Confidence::High))]),
        true,
        Duration::ZERO,
    );

    let summary = h.runner.run(now()).await.unwrap();

    assert_eq!(summary.total_new, 2);
    assert_eq!(summary.classified, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.good_count, 1);
    assert_eq!(summary.high_confidence_count, 1);
    assert_eq!(h.sent.lock().len(), 1);
    assert_eq!(h.sent.lock()[0].url, u2);
}

#[tokio::test]
async fn only_high_confidence_good_verdicts_notify() {
    let (u1, u2, u3) = (url(4), url(5), url(6));
    let h = Harness::new(
        FakeSource::ids(&[], &[4, 5, 6]),
        FakeDetails::default(),
        ScriptedClassifier::with(vec![
            (u1.clone(), verdict(true, Confidence::Medium)),
            (u2.clone(), verdict(true, Confidence::High)),
            (u3.clone(), verdict(false, Confidence::High)),
        ]),
        true,
        Duration::ZERO,
    );

    let summary = h.runner.run(now()).await.unwrap();

    assert_eq!(summary.good_count, 2);
    assert_eq!(summary.high_confidence_count, 1);
    assert_eq!(summary.rejected, 1);
    let sent = h.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].url, u2);
    assert_eq!(sent[0].reason, "good=true");
}

#[tokio::test]
async fn notifier_failure_leaves_counters_untouched() {
    let u1 = url(4);
    let h = Harness::new(
        FakeSource::ids(&[], &[4]),
        FakeDetails::default(),
        ScriptedClassifier::with(vec![(u1, verdict(true, Confidence::High))]),
        false,
        Duration::ZERO,
    );

    let summary = h.runner.run(now()).await.unwrap();

    assert_eq!(summary.good_count, 1);
    assert_eq!(summary.high_confidence_count, 1);
    assert_eq!(h.sent.lock().len(), 1, "delivery attempted exactly once");
}

#[tokio::test]
async fn current_snapshot_failure_is_fatal_with_no_side_effects() {
    let h = Harness::new(
        FakeSource::new(Some(common::snapshot(&[1], common::OFFSET)), None),
        FakeDetails::default(),
        ScriptedClassifier::default(),
        true,
        Duration::ZERO,
    );

    let err = h.runner.run(now()).await.unwrap_err();

    assert!(matches!(err, PipelineError::SourceUnavailable(_)));
    assert!(err.to_string().starts_with("listing source unavailable"));
    assert!(h.details.calls.lock().is_empty());
    assert!(h.classifier.calls.lock().is_empty());
    assert!(h.sent.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn fixed_delay_between_items_regardless_of_outcome() {
    let u2 = url(5);
    let h = Harness::new(
        FakeSource::ids(&[], &[4, 5, 6]),
        FakeDetails::failing_on(&[u2]),
        ScriptedClassifier::default(),
        true,
        Duration::from_secs(2),
    );

    let start = tokio::time::Instant::now();
    let summary = h.runner.run(now()).await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(summary.total_new, 3);
    // two gaps between three items, none after the last
    assert!(elapsed >= Duration::from_secs(4), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(6), "elapsed {elapsed:?}");
}
