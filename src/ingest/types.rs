// src/ingest/types.rs
use chrono::{DateTime, Utc};

use crate::error::SourceError;

/// One entry of the search feed. `id` is relative to the snapshot's decode offset.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotItem {
    pub id: i64,
    pub raw: serde_json::Value,
}

/// Point-in-time state of the listing feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub items: Vec<SnapshotItem>,
    pub decode_offset: i64,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A newly discovered listing. `id` is the absolute posting id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ListingRef {
    pub id: i64,
    pub url: String,
}

#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    /// State of the feed as of `as_of`: listings posted until then that still exist.
    async fn fetch_snapshot(&self, as_of: DateTime<Utc>) -> Result<Snapshot, SourceError>;
    fn name(&self) -> &'static str;
}
