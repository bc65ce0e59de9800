// src/listing/fetcher.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

use super::{parse_listing_html, DetailFetcher, ListingDetail};
use crate::error::DetailUnavailable;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

/// GETs a listing page and parses it. Only HTTP 200 counts as success.
pub struct HttpDetailFetcher {
    client: reqwest::Client,
}

impl HttpDetailFetcher {
    pub fn new(timeout: Duration) -> Result<Self, DetailUnavailable> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DetailFetcher for HttpDetailFetcher {
    async fn fetch_detail(&self, url: &str) -> Result<ListingDetail, DetailUnavailable> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if status != StatusCode::OK {
            return Err(DetailUnavailable::Status(status.as_u16()));
        }
        let html = resp.text().await?;
        Ok(parse_listing_html(&html, url))
    }
}
