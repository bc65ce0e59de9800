use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{ListingAlert, Notifier};
use crate::error::NotificationFailure;

pub struct SlackNotifier {
    webhook_url: String,
    client: Client,
    timeout: Duration,
}

impl SlackNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, alert: &ListingAlert) -> Result<(), NotificationFailure> {
        let body = serde_json::json!({ "text": alert.render() });

        let rsp = self
            .client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(NotificationFailure::Status {
                status: status.as_u16(),
                body: rsp.text().await.unwrap_or_default(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "slack"
    }
}
