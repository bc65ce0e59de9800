// src/listing/mod.rs
//! Structured view of a single listing page and the capability that produces it.

pub mod fetcher;
pub mod parser;

use serde::{Deserialize, Serialize};

use crate::error::DetailUnavailable;

pub use fetcher::HttpDetailFetcher;
pub use parser::parse_listing_html;

/// Attributes extracted from one listing page. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetail {
    pub title: String,
    /// Currency included, e.g. `$625`.
    pub price: Option<String>,
    /// road, cruiser, hybrid, ...
    pub bicycle_type: Option<String>,
    /// e.g. `700C`
    pub wheel_size: Option<String>,
    /// e.g. `56cm`
    pub frame_size: Option<String>,
    pub frame_material: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub condition: Option<String>,
    /// Full posting text, whitespace collapsed.
    pub body: String,
    pub url: String,
}

#[async_trait::async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_detail(&self, url: &str) -> Result<ListingDetail, DetailUnavailable>;
}
