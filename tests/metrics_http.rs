// tests/metrics_http.rs
//
// The Prometheus recorder is process-global, so this file holds a single test.

mod common;

use std::time::Duration;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use tower::ServiceExt as _;

use bike_alert::analyze::classifier::Confidence;
use bike_alert::metrics::Metrics;
use common::{now, url, verdict, FakeDetails, FakeSource, Harness, ScriptedClassifier};

#[tokio::test]
async fn counters_from_a_run_are_exposed() {
    let metrics = Metrics::init(15).expect("install recorder");

    let h = Harness::new(
        FakeSource::ids(&[1], &[1, 2]),
        FakeDetails::default(),
        ScriptedClassifier::with(vec![(url(2), verdict(true, Confidence::High))]),
        true,
        Duration::ZERO,
    );
    h.runner.run(now()).await.expect("run");

    let resp = metrics
        .router()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let text = String::from_utf8(
        body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap()
            .to_vec(),
    )
    .unwrap();

    assert!(text.contains("pipeline_check_interval_minutes 15"), "{text}");
    assert!(text.contains("pipeline_runs_total 1"), "{text}");
    assert!(text.contains("ingest_new_listings_total 1"), "{text}");
    assert!(metrics.render().contains("pipeline_good_total 1"));

    // a second recorder in the same process is refused
    assert!(Metrics::init(15).is_err());
}
