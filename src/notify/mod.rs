// src/notify/mod.rs
pub mod slack;
pub mod twilio;

use async_trait::async_trait;
use metrics::counter;

use crate::config::NotifyConfig;
use crate::error::NotificationFailure;
use crate::listing::ListingDetail;

/// What gets delivered for one high-confidence match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingAlert {
    pub title: String,
    pub price: Option<String>,
    /// Already truncated to the configured budget.
    pub reason: String,
    pub url: String,
}

impl ListingAlert {
    pub fn new(detail: &ListingDetail, reason: &str, reason_chars: usize) -> Self {
        Self {
            title: detail.title.clone(),
            price: detail.price.clone(),
            reason: reason.chars().take(reason_chars).collect(),
            url: detail.url.clone(),
        }
    }

    /// WhatsApp/Slack flavoured text (`*bold*`).
    pub fn render(&self) -> String {
        format!(
            "🚴 *Good Bike Found!*\n\n*{}*\n{}\n\n{}\n\n{}",
            self.title,
            self.price.as_deref().unwrap_or("Price not listed"),
            self.reason,
            self.url
        )
    }
}

/// One outbound channel. Implementations make a single attempt; no retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, alert: &ListingAlert) -> Result<(), NotificationFailure>;
    fn name(&self) -> &'static str;
}

/// Fans one alert out to every configured channel.
pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
    reason_chars: usize,
}

impl NotifierMux {
    pub fn new(channels: Vec<Box<dyn Notifier>>, reason_chars: usize) -> Self {
        Self {
            channels,
            reason_chars,
        }
    }

    pub fn from_config(cfg: &NotifyConfig) -> anyhow::Result<Self> {
        let mut channels: Vec<Box<dyn Notifier>> = Vec::new();
        if let Some(tw) = &cfg.twilio {
            channels.push(Box::new(twilio::TwilioNotifier::from_config(tw)?));
        }
        if let Some(sl) = &cfg.slack {
            channels.push(Box::new(slack::SlackNotifier::new(sl.webhook_url.clone())));
        }
        if channels.is_empty() {
            tracing::warn!(target: "notify", "no notification channels configured");
        }
        Ok(Self::new(channels, cfg.reason_chars))
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Best-effort delivery. `true` when at least one channel accepted the
    /// message; failures are logged and never propagated.
    pub async fn notify(&self, detail: &ListingDetail, reason: &str) -> bool {
        if self.channels.is_empty() {
            tracing::warn!(
                target: "notify",
                error = %NotificationFailure::NotConfigured,
                url = %detail.url,
                "alert not sent"
            );
            return false;
        }

        let alert = ListingAlert::new(detail, reason, self.reason_chars);
        let mut delivered = false;
        for ch in &self.channels {
            match ch.send(&alert).await {
                Ok(()) => {
                    tracing::info!(target: "notify", channel = ch.name(), url = %alert.url, "alert sent");
                    counter!("notify_sent_total").increment(1);
                    delivered = true;
                }
                Err(e) => {
                    tracing::error!(target: "notify", channel = ch.name(), error = %e, "alert failed");
                    counter!("notify_failures_total").increment(1);
                }
            }
        }
        delivered
    }
}
