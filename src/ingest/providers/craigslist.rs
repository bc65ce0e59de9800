// src/ingest/providers/craigslist.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::histogram;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::SourceError;
use crate::ingest::types::{Snapshot, SnapshotItem, SnapshotSource};

const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:147.0) Gecko/20100101 Firefox/147.0";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    data: SearchData,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    items: Vec<Vec<serde_json::Value>>,
    decode: Decode,
}

#[derive(Debug, Deserialize)]
struct Decode {
    #[serde(rename = "minPostingId")]
    min_posting_id: i64,
}

/// Synthetic batch token that asks the search API for the feed as of `unix_ts`.
pub fn batch_token(unix_ts: i64) -> String {
    format!("1-{unix_ts}-0-1-0")
}

/// Query string for one snapshot request.
pub fn search_params(cfg: &SearchConfig, as_of: DateTime<Utc>) -> Vec<(&'static str, String)> {
    vec![
        ("batch", batch_token(as_of.timestamp())),
        ("lat", cfg.lat.to_string()),
        ("lon", cfg.lon.to_string()),
        ("searchPath", cfg.path.clone()),
        ("search_distance", cfg.distance_miles.to_string()),
        ("lang", cfg.lang.clone()),
        ("cc", cfg.country.clone()),
    ]
}

/// Parse a search response body. Every item must be an array whose first
/// element is the integer id; anything else is a malformed payload.
pub fn parse_snapshot(body: &str, fetched_at: DateTime<Utc>) -> Result<Snapshot, SourceError> {
    let t0 = std::time::Instant::now();
    let resp: SearchResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Malformed(e.to_string()))?;

    let offset = resp.data.decode.min_posting_id;
    let mut items = Vec::with_capacity(resp.data.items.len());
    for (idx, entry) in resp.data.items.into_iter().enumerate() {
        let id = entry
            .first()
            .and_then(serde_json::Value::as_i64)
            .ok_or_else(|| SourceError::Malformed(format!("item {idx} has no integer id")))?;
        if offset.checked_add(id).is_none() {
            return Err(SourceError::Malformed(format!(
                "item {idx} id {id} overflows minPostingId {offset}"
            )));
        }
        items.push(SnapshotItem {
            id,
            raw: serde_json::Value::Array(entry),
        });
    }

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(Snapshot {
        items,
        decode_offset: offset,
        fetched_at,
    })
}

/// Search API client for one geographic query.
pub struct CraigslistSource {
    cfg: SearchConfig,
    client: reqwest::Client,
}

impl CraigslistSource {
    pub fn from_config(cfg: &SearchConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            cfg: cfg.clone(),
            client,
        })
    }
}

#[async_trait]
impl SnapshotSource for CraigslistSource {
    async fn fetch_snapshot(&self, as_of: DateTime<Utc>) -> Result<Snapshot, SourceError> {
        let resp = self
            .client
            .get(&self.cfg.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&search_params(&self.cfg, as_of))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        let body = resp.text().await?;
        parse_snapshot(&body, Utc::now())
    }

    fn name(&self) -> &'static str {
        "craigslist"
    }
}
