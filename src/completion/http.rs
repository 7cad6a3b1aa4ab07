//! HTTP completion client for OpenAI-compatible endpoints.
//!
//! Works against both `/v1/completions` and `/v1/chat/completions` response
//! shapes, plus the bare `{"text": ...}` form some local servers return.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::CompletionProvider;
use crate::config::ClassifierConfig;

pub struct HttpCompletionProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpCompletionProvider {
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl CompletionProvider for HttpCompletionProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": 120,
            "temperature": 0.0,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("completion request to {} failed", self.endpoint))?;

        let status = response.status();
        anyhow::ensure!(
            status.is_success(),
            "completion endpoint returned HTTP {status}"
        );

        let payload: Value = response
            .json()
            .await
            .context("completion response was not JSON")?;

        extract_text(&payload)
            .ok_or_else(|| anyhow::anyhow!("completion response carried no text field"))
    }
}

/// Pull the generated text out of the handful of response shapes seen in
/// the wild.
fn extract_text(payload: &Value) -> Option<String> {
    payload["choices"][0]["text"]
        .as_str()
        .or_else(|| payload["choices"][0]["message"]["content"].as_str())
        .or_else(|| payload["text"].as_str())
        .map(str::to_string)
}
