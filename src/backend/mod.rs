//! LLM backend connectors.
//! Each remote text-generation service implements the [`LlmBackend`]
//! capability independently; callers hold a [`registry::BackendRegistry`]
//! constructed at startup.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub mod custom;
pub mod openai;
pub mod ollama;
pub mod registry;

pub use custom::CustomHttpBackend;
pub use ollama::OllamaBackend;
pub use openai::OpenAiBackend;
pub use registry::{BackendProbe, BackendRegistry};

/// Errors reported by backend connectors.
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Network or HTTP-level failure, including auth rejections
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a payload we cannot interpret
    #[error("malformed backend response: {0}")]
    Response(String),

    /// The connector cannot be constructed or used as configured
    #[error("backend misconfigured: {0}")]
    Config(String),

    /// No backend is registered under the requested name
    #[error("unknown backend '{0}'")]
    UnknownBackend(String),

    /// The caller cancelled the completion mid-stream
    #[error("completion stopped before finishing")]
    Stopped,
}

/// Cooperative cancellation handle for in-flight completions.
///
/// Cloning shares the flag; any clone can cancel. The chunk stream checks the
/// token between chunks and terminates with [`ConnectorError::Stopped`].
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A completion request as the capability interface sees it.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// Optional system prompt steering the model
    pub system: Option<String>,
    /// Rendered prompt text
    pub prompt: String,
    /// Model identifier as the backend knows it
    pub model: String,
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    /// Whether chunks should arrive incrementally
    pub stream: bool,
}

impl CompletionRequest {
    /// Creates a non-streaming request with no sampling overrides.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            system: None,
            prompt: prompt.into(),
            model: model.into(),
            temperature: None,
            max_tokens: None,
            stream: false,
        }
    }
}

/// Lazy sequence of response text chunks.
pub type CompletionStream = Box<dyn Iterator<Item = Result<String, ConnectorError>> + Send>;

/// Capability interface implemented by every remote text-generation service.
pub trait LlmBackend: Send + Sync {
    /// Registry name of this backend.
    fn name(&self) -> &str;

    /// Lists the models the service offers.
    fn list_models(&self) -> Result<Vec<String>, ConnectorError>;

    /// Sends a completion request and returns the response chunk stream.
    ///
    /// The stream yields chunks lazily; `cancel` is honored between chunks.
    fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancelToken,
    ) -> Result<CompletionStream, ConnectorError>;
}

/// Builds the blocking HTTP client shared by the connectors.
pub(crate) fn build_client(
    timeout: Duration,
    proxy: Option<&str>,
) -> Result<reqwest::blocking::Client, ConnectorError> {
    let mut builder = reqwest::blocking::Client::builder().timeout(timeout);
    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|err| ConnectorError::Config(format!("invalid proxy url: {}", err)))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|err| ConnectorError::Config(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
