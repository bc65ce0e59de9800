// src/notify/twilio.rs
//! Twilio Programmable Messaging, WhatsApp sandbox or SMS via a messaging service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::{ListingAlert, Notifier};
use crate::config::{TwilioChannel, TwilioConfig};
use crate::error::NotificationFailure;

/// Shared sender number of the Twilio WhatsApp sandbox.
pub const WHATSAPP_SANDBOX_NUMBER: &str = "whatsapp:+14155238886";

const API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

pub struct TwilioNotifier {
    cfg: TwilioConfig,
    client: Client,
    api_base: String,
}

impl TwilioNotifier {
    pub fn from_config(cfg: &TwilioConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            cfg: cfg.clone(),
            client,
            api_base: API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Form fields for one message.
    pub fn form_fields(&self, body: &str) -> Vec<(&'static str, String)> {
        let mut form = vec![("Body", body.to_string())];
        match self.cfg.channel {
            TwilioChannel::Whatsapp => {
                form.push(("From", WHATSAPP_SANDBOX_NUMBER.to_string()));
                form.push(("To", format!("whatsapp:{}", self.cfg.to_number)));
            }
            TwilioChannel::Sms => {
                let service = self.cfg.messaging_service_sid.clone().unwrap_or_default();
                form.push(("MessagingServiceSid", service));
                form.push(("To", self.cfg.to_number.clone()));
            }
        }
        form
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, alert: &ListingAlert) -> Result<(), NotificationFailure> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.cfg.account_sid
        );

        let response = self
            .client
            .post(url)
            .basic_auth(&self.cfg.account_sid, Some(&self.cfg.auth_token))
            .form(&self.form_fields(&alert.render()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotificationFailure::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        match response.json::<MessageResponse>().await {
            Ok(msg) => tracing::debug!(target: "notify", sid = %msg.sid, "twilio accepted message"),
            Err(e) => tracing::debug!(target: "notify", error = %e, "twilio response without sid"),
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.cfg.channel {
            TwilioChannel::Whatsapp => "whatsapp",
            TwilioChannel::Sms => "sms",
        }
    }
}
