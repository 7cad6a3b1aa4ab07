//! Text completion boundary for the emotion classifier.
//!
//! Provides the [`CompletionProvider`] trait and an HTTP implementation
//! speaking the common completions JSON shape. The provider is created via
//! [`create_provider`] from configuration; `None` means classification runs
//! entirely on the offline lexicon.

pub mod http;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::ClassifierConfig;

/// Single-prompt completion. Implementations own their transport details;
/// callers only see the returned text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create a completion provider from config.
///
/// `"lexicon"` yields `None` (fully offline), `"http"` yields a client for
/// the configured endpoint.
pub fn create_provider(config: &ClassifierConfig) -> Result<Option<Arc<dyn CompletionProvider>>> {
    match config.provider.as_str() {
        "lexicon" => Ok(None),
        "http" => {
            anyhow::ensure!(
                !config.endpoint.trim().is_empty(),
                "classifier.provider is \"http\" but classifier.endpoint is empty"
            );
            let provider = http::HttpCompletionProvider::new(config)?;
            Ok(Some(Arc::new(provider)))
        }
        other => anyhow::bail!("unknown classifier provider: {other}. Supported: lexicon, http"),
    }
}
