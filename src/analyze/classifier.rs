//! Classifier: verdict model, prompt construction, strict response parsing and
//! the Anthropic Messages API adapter.
//!
//! The model is forced to answer through a single tool whose input schema is
//! the [`Verdict`] shape. Anything that does not deserialize into that shape is
//! a [`ClassificationFailure`]; there is no free-text fallback.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;
use crate::error::ClassificationFailure;
use crate::listing::ListingDetail;

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Classifier output for one listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_good: bool,
    pub reason: String,
    pub confidence: Confidence,
}

impl Verdict {
    /// The only case that triggers an outbound alert.
    pub fn is_high_confidence_match(&self) -> bool {
        self.is_good && self.confidence == Confidence::High
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, detail: &ListingDetail) -> Result<Verdict, ClassificationFailure>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

// ------------------------------------------------------------
// Prompt
// ------------------------------------------------------------

const TOOL_NAME: &str = "record_classification";

const SYSTEM_PROMPT: &str = "You are a bike expert who identifies quality modern road bikes on Craigslist.

Classify each listing as a good or bad deal by calling the record_classification tool with is_good, a one-sentence reason, and confidence (\"high\", \"medium\" or \"low\").

A good bike has all of:
- Type: road bike (not hybrid, mountain, cruiser, e-bike, BMX, kids)
- Components: modern Shimano 105 or better (Ultegra, Dura-Ace) or SRAM Rival/Force/Red
- Brand: quality maker (Cannondale, Trek, Specialized, Giant, Cervelo, Bianchi, ...)
- Frame: carbon or high-quality aluminum
- Era: modern, not 1970s-1990s vintage
- Price: reasonable for a used bike of that level, roughly $800-$3000

Reject department store brands, low-end groupsets (Sora, Claris, Tourney, Tiagra), parts or project bikes, and listings without component details.
Use \"high\" confidence only when the listing states the components explicitly.";

/// Cut `body` to `max_chars` characters, appending `...` when anything was dropped.
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// User message for one listing. Absent attributes get explicit placeholders
/// so the model never sees an empty field.
pub fn build_user_message(detail: &ListingDetail, excerpt_chars: usize) -> String {
    fn or<'a>(v: &'a Option<String>, fallback: &'a str) -> &'a str {
        v.as_deref().unwrap_or(fallback)
    }

    format!(
        "Title: {}\nPrice: {}\nBicycle Type: {}\nFrame Size: {}\nFrame Material: {}\nWheel Size: {}\nManufacturer: {}\nModel: {}\nCondition: {}\n\nDescription: {}\n\nClassify this bike:",
        detail.title,
        or(&detail.price, "Not listed"),
        or(&detail.bicycle_type, "Unknown"),
        or(&detail.frame_size, "Not specified"),
        or(&detail.frame_material, "Unknown"),
        or(&detail.wheel_size, "Unknown"),
        or(&detail.manufacturer, "Unknown"),
        or(&detail.model, "Unknown"),
        or(&detail.condition, "Not specified"),
        body_excerpt(&detail.body, excerpt_chars),
    )
}

fn verdict_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "is_good": { "type": "boolean", "description": "Whether this is a good bike deal" },
            "reason": { "type": "string", "description": "One-sentence explanation for the classification" },
            "confidence": { "type": "string", "enum": ["high", "medium", "low"] }
        },
        "required": ["is_good", "reason", "confidence"]
    })
}

// ------------------------------------------------------------
// Response parsing
// ------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

/// Pull the verdict out of the forced tool call. A bare JSON text block with
/// the same shape is accepted too; anything else fails.
pub fn parse_verdict(resp: MessagesResponse) -> Result<Verdict, ClassificationFailure> {
    let mut text_blocks = Vec::new();
    for block in resp.content {
        match block {
            ContentBlock::ToolUse { name, input } if name == TOOL_NAME => {
                let mut v: Verdict = serde_json::from_value(input)
                    .map_err(|e| ClassificationFailure::Unparseable(e.to_string()))?;
                v.reason = sanitize_reason(&v.reason);
                return Ok(v);
            }
            ContentBlock::Text { text } => text_blocks.push(text),
            _ => {}
        }
    }

    let text = text_blocks.join("");
    let mut v: Verdict = serde_json::from_str(text.trim()).map_err(|_| {
        ClassificationFailure::Unparseable(format!(
            "no {TOOL_NAME} tool call in response (text: {:.80})",
            text.trim()
        ))
    })?;
    v.reason = sanitize_reason(&v.reason);
    Ok(v)
}

/// Single line, collapsed whitespace.
pub fn sanitize_reason(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ------------------------------------------------------------
// Anthropic provider
// ------------------------------------------------------------

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClassifier {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    excerpt_chars: usize,
    endpoint: String,
}

impl AnthropicClassifier {
    pub fn from_config(cfg: &ClassifierConfig) -> anyhow::Result<Self> {
        if !cfg.has_api_key() {
            anyhow::bail!("classifier api key is empty (set ANTHROPIC_API_KEY)");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("bike-alert/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            max_tokens: cfg.max_tokens,
            excerpt_chars: cfg.body_excerpt_chars,
            endpoint: MESSAGES_URL.to_string(),
        })
    }

    /// Point at a different Messages endpoint (proxies, local stubs).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Tool<'a> {
    name: &'a str,
    description: &'a str,
    input_schema: serde_json::Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Msg<'a>>,
    tools: Vec<Tool<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[async_trait]
impl Classifier for AnthropicClassifier {
    async fn classify(&self, detail: &ListingDetail) -> Result<Verdict, ClassificationFailure> {
        let user = build_user_message(detail, self.excerpt_chars);
        let req = Req {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: 0.0,
            system: SYSTEM_PROMPT,
            messages: vec![Msg {
                role: "user",
                content: &user,
            }],
            tools: vec![Tool {
                name: TOOL_NAME,
                description: "Record the classification of a bike listing.",
                input_schema: verdict_schema(),
            }],
            tool_choice: ToolChoice {
                kind: "tool",
                name: TOOL_NAME,
            },
        };

        tracing::debug!(target: "classifier", title = %detail.title, "classifying");
        let resp = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassificationFailure::Status {
                status: status.as_u16(),
                body,
            });
        }
        let body: MessagesResponse = resp
            .json()
            .await
            .map_err(|e| ClassificationFailure::Unparseable(e.to_string()))?;
        parse_verdict(body)
    }

    fn provider_name(&self) -> &'static str {
        "anthropic"
    }
}

/// Returns the same verdict for every listing. Used for dry runs and tests.
#[derive(Clone)]
pub struct StaticClassifier {
    pub fixed: Verdict,
}

#[async_trait]
impl Classifier for StaticClassifier {
    async fn classify(&self, _detail: &ListingDetail) -> Result<Verdict, ClassificationFailure> {
        Ok(self.fixed.clone())
    }
    fn provider_name(&self) -> &'static str {
        "static"
    }
}
