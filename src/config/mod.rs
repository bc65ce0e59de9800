// src/config/mod.rs
//! Application configuration.
//!
//! Loaded once at startup from TOML and passed by reference into every
//! component constructor. Nothing inside the pipeline reads the environment.

pub mod classifier;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use classifier::ClassifierConfig;

pub const ENV_CONFIG_PATH: &str = "BIKE_ALERT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/bike_alert.toml";

const DEFAULT_CHECK_INTERVAL_MINUTES: u64 = 15;
/// One week. Keeps the interval representable as both lookback and tick.
pub const MAX_CHECK_INTERVAL_MINUTES: u64 = 7 * 24 * 60;
const DEFAULT_ITEM_DELAY_SECS: u64 = 2;

fn default_check_interval_minutes() -> u64 {
    DEFAULT_CHECK_INTERVAL_MINUTES
}
fn default_item_delay_secs() -> u64 {
    DEFAULT_ITEM_DELAY_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Must match how often the pipeline is triggered; also used as the lookback.
    #[serde(default = "default_check_interval_minutes")]
    pub check_interval_minutes: u64,
    /// Fixed pause between listings. Not a backoff.
    #[serde(default = "default_item_delay_secs")]
    pub item_delay_secs: u64,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            check_interval_minutes: DEFAULT_CHECK_INTERVAL_MINUTES,
            item_delay_secs: DEFAULT_ITEM_DELAY_SECS,
            search: SearchConfig::default(),
            classifier: ClassifierConfig::default(),
            notify: NotifyConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Geographic query sent to the listing search API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    /// Detail pages live at `<listing_base_url><posting id>.html`.
    pub listing_base_url: String,
    pub lat: f64,
    pub lon: f64,
    pub distance_miles: u32,
    pub path: String,
    pub lang: String,
    pub country: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://sapi.craigslist.org/web/v8/postings/search/full".to_string(),
            listing_base_url: "https://sfbay.craigslist.org/bik/".to_string(),
            lat: 37.789,
            lon: -122.394,
            distance_miles: 15,
            path: "san-francisco-ca/bia".to_string(),
            lang: "en".to_string(),
            country: "us".to_string(),
            timeout_secs: 10,
        }
    }
}

fn default_reason_chars() -> usize {
    150
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_reason_chars")]
    pub reason_chars: usize,
    pub twilio: Option<TwilioConfig>,
    pub slack: Option<SlackConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            reason_chars: default_reason_chars(),
            twilio: None,
            slack: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TwilioChannel {
    #[default]
    Whatsapp,
    Sms,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    #[serde(default)]
    pub channel: TwilioChannel,
    /// `"ENV"` reads `TWILIO_ACCOUNT_SID`.
    pub account_sid: String,
    /// `"ENV"` reads `TWILIO_AUTH_TOKEN`.
    pub auth_token: String,
    /// Required for the SMS channel.
    #[serde(default)]
    pub messaging_service_sid: Option<String>,
    /// `"ENV"` reads `TWILIO_TO_NUMBER`.
    pub to_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// `"ENV"` reads `SLACK_WEBHOOK_URL`.
    pub webhook_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AppConfig {
    /// Parse a TOML file, then resolve `"ENV"` secrets and env overrides.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: AppConfig = toml::from_str(&data)
            .with_context(|| format!("parsing config {}", path.display()))?;
        cfg.finish()
    }

    /// Load using env var + fallbacks:
    /// 1) $BIKE_ALERT_CONFIG
    /// 2) config/bike_alert.toml
    /// 3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load_from_file(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from_file(&default_path);
        }
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        if let Some(v) = env_u64("CHECK_INTERVAL_MINUTES") {
            self.check_interval_minutes = v;
        }
        if let Some(v) = env_u64("ITEM_DELAY_SECS") {
            self.item_delay_secs = v;
        }
        if self.check_interval_minutes == 0 {
            tracing::warn!(
                "check_interval_minutes=0 is invalid, using {DEFAULT_CHECK_INTERVAL_MINUTES}"
            );
            self.check_interval_minutes = DEFAULT_CHECK_INTERVAL_MINUTES;
        }
        if self.check_interval_minutes > MAX_CHECK_INTERVAL_MINUTES {
            tracing::warn!(
                "check_interval_minutes={} is out of range, clamping to {MAX_CHECK_INTERVAL_MINUTES}",
                self.check_interval_minutes
            );
            self.check_interval_minutes = MAX_CHECK_INTERVAL_MINUTES;
        }
        if self.notify.reason_chars == 0 {
            self.notify.reason_chars = default_reason_chars();
        }

        self.classifier.resolve_secrets()?;

        if let Some(tw) = self.notify.twilio.as_mut() {
            tw.account_sid = resolve_env(&tw.account_sid, "TWILIO_ACCOUNT_SID")?;
            tw.auth_token = resolve_env(&tw.auth_token, "TWILIO_AUTH_TOKEN")?;
            tw.to_number = resolve_env(&tw.to_number, "TWILIO_TO_NUMBER")?;
            if tw.channel == TwilioChannel::Sms && tw.messaging_service_sid.is_none() {
                anyhow::bail!("twilio sms channel requires messaging_service_sid");
            }
        }
        if let Some(slack) = self.notify.slack.as_mut() {
            slack.webhook_url = resolve_env(&slack.webhook_url, "SLACK_WEBHOOK_URL")?;
        }
        Ok(self)
    }

    /// Lookback for the snapshot diff; equal to the trigger interval.
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.check_interval_minutes as i64)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_minutes * 60)
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_secs(self.item_delay_secs)
    }
}

/// `"ENV"` (any case) means: read the value from `var`.
pub(crate) fn resolve_env(value: &str, var: &str) -> Result<String> {
    if value.trim().eq_ignore_ascii_case("env") {
        std::env::var(var).map_err(|_| anyhow::anyhow!("Missing {var} env var"))
    } else {
        Ok(value.to_string())
    }
}

fn env_u64(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|v| v.trim().parse().ok())
}
