//! Language-model client for the query and document-parse surfaces.
//!
//! Talks to any OpenAI-compatible chat-completions endpoint. The
//! client is optional: without an API key every capability degrades to
//! a fixed explanatory response instead of failing.
//!
//! RULES:
//!   - Callers serialize whatever live context they need BEFORE calling
//!     in; this module never touches shared state.
//!   - Streaming responses are relayed chunk by chunk; the extraction
//!     path is a single low-temperature completion.

use anyhow::{anyhow, Context, Result};
use futures::channel::mpsc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role:    String,
    pub content: String,
}

/// Outcome of a structured-extraction completion. `Raw` carries model
/// output that contained no parseable JSON object.
#[derive(Debug, Clone)]
pub enum Extraction {
    Structured(Value),
    Raw(String),
}

pub struct IntelligenceClient {
    http:     reqwest::Client,
    endpoint: String,
    api_key:  Option<String>,
    model:    String,
}

impl IntelligenceClient {
    /// Build from the environment: OPENAI_API_KEY enables the client;
    /// LATTICE_LLM_ENDPOINT and LATTICE_LLM_MODEL override defaults.
    pub fn from_env() -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            log::warn!("OPENAI_API_KEY not set; intelligence surfaces will degrade");
        }
        Self {
            http,
            endpoint: std::env::var("LATTICE_LLM_ENDPOINT")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            api_key,
            model: std::env::var("LATTICE_LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Stream a chat completion. Returns a channel of text deltas; the
    /// relay task drains the SSE wire format in the background.
    pub async fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<mpsc::UnboundedReceiver<String>> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("no API key configured"))?;

        let body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": 1024,
            "temperature": 0.3,
            "stream": true,
        });
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .context("chat completion request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat completion returned {status}: {detail}"));
        }

        let (tx, rx) = mpsc::unbounded();
        tokio::spawn(async move {
            let mut wire = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = wire.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        log::warn!("chat stream interrupted: {err}");
                        break;
                    }
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    let Some(payload) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let payload = payload.trim();
                    if payload == "[DONE]" {
                        return;
                    }
                    if let Some(delta) = delta_content(payload) {
                        if tx.unbounded_send(delta).is_err() {
                            return;
                        }
                    }
                }
            }
        });
        Ok(rx)
    }

    /// Run a low-temperature completion and carve the first JSON object
    /// out of the reply.
    pub async fn extract(&self, system: &str, user: &str) -> Result<Extraction> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("no API key configured"))?;

        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "max_tokens": 2048,
            "temperature": 0.1,
        });
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body)
            .send()
            .await
            .context("extraction request failed")?;
        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("extraction returned {status}: {detail}"));
        }

        let reply: Value = response.json().await.context("malformed completion body")?;
        let content = reply["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        match carve_json_object(&content) {
            Some(value) => Ok(Extraction::Structured(value)),
            None => Ok(Extraction::Raw(content)),
        }
    }
}

/// Pull the text delta out of one streamed completion chunk.
fn delta_content(payload: &str) -> Option<String> {
    let value: Value = serde_json::from_str(payload).ok()?;
    value["choices"][0]["delta"]["content"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// First balanced-looking `{...}` span that parses as JSON. Models wrap
/// objects in prose or code fences; the span between the outermost
/// braces is usually the payload.
fn carve_json_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Normalize a parsed supplier document in place: models sometimes
/// return anomalies as bare strings instead of severity objects.
pub fn normalize_anomalies(extracted: &mut Value) {
    let Some(anomalies) = extracted.get_mut("anomalies").and_then(Value::as_array_mut) else {
        return;
    };
    for anomaly in anomalies {
        if let Value::String(text) = anomaly {
            *anomaly = json!({
                "severity": "warning",
                "title": text.clone(),
                "detail": text.clone(),
            });
        }
    }
}
