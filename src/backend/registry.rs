//! Explicit backend registry, constructed at startup and passed to callers.

use std::time::{Duration, Instant};

use indexmap::IndexMap;
use log::debug;

use crate::config::Settings;

use super::{
    CancelToken, CompletionRequest, ConnectorError, LlmBackend, OllamaBackend, OpenAiBackend,
};

/// Outcome of a backend round-trip test.
#[derive(Debug)]
pub struct BackendProbe {
    pub success: bool,
    pub response: String,
    pub error: Option<String>,
    pub duration_ms: u128,
    pub models: Vec<String>,
}

/// Holds the configured backends, keyed by name in registration order.
pub struct BackendRegistry {
    backends: IndexMap<String, Box<dyn LlmBackend>>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { backends: IndexMap::new() }
    }

    /// Builds the default registry (openai, ollama, lmstudio) from settings.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConnectorError> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let proxy = settings.proxy_url.as_deref();

        let mut registry = Self::new();
        registry.register(Box::new(OpenAiBackend::new(
            &settings.openai_base_url,
            settings.api_key(),
            timeout,
            proxy,
        )?));
        registry.register(Box::new(OllamaBackend::new(
            &settings.ollama_base_url,
            timeout,
            proxy,
        )?));
        registry.register(Box::new(OpenAiBackend::lm_studio(
            &settings.lmstudio_base_url,
            timeout,
            proxy,
        )?));
        Ok(registry)
    }

    /// Registers a backend under its own name; a later registration with the
    /// same name replaces the earlier one.
    pub fn register(&mut self, backend: Box<dyn LlmBackend>) {
        debug!("Registering backend '{}'", backend.name());
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn get(&self, name: &str) -> Option<&dyn LlmBackend> {
        self.backends.get(name).map(|backend| backend.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.backends.keys().map(String::as_str).collect()
    }

    /// Round-trip tests a backend: lists its models and completes a short
    /// prompt against the first one.
    pub fn probe(&self, name: &str, test_prompt: &str) -> BackendProbe {
        let started = Instant::now();
        match self.try_probe(name, test_prompt) {
            Ok((models, response)) => BackendProbe {
                success: true,
                response,
                error: None,
                duration_ms: started.elapsed().as_millis(),
                models,
            },
            Err(err) => BackendProbe {
                success: false,
                response: String::new(),
                error: Some(err.to_string()),
                duration_ms: started.elapsed().as_millis(),
                models: Vec::new(),
            },
        }
    }

    fn try_probe(
        &self,
        name: &str,
        test_prompt: &str,
    ) -> Result<(Vec<String>, String), ConnectorError> {
        let backend = self
            .get(name)
            .ok_or_else(|| ConnectorError::UnknownBackend(name.to_string()))?;

        let models = backend.list_models()?;
        let model = models
            .first()
            .cloned()
            .ok_or_else(|| ConnectorError::Response("no models available".to_string()))?;

        let request = CompletionRequest::new(test_prompt, model);
        let chunks = backend.complete(&request, &CancelToken::new())?;

        let mut response = String::new();
        for chunk in chunks {
            response.push_str(&chunk?);
        }
        Ok((models, response))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        BackendRegistry::new()
    }
}
