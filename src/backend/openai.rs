//! OpenAI-compatible chat-completions connector.
//! Also serves LM Studio and other services that speak the same protocol.

use std::io::{BufRead, BufReader, Lines};
use std::time::Duration;

use log::debug;
use serde_json::json;

use super::{
    build_client, CancelToken, CompletionRequest, CompletionStream, ConnectorError, LlmBackend,
};

/// Connector for chat-completions APIs (OpenAI, Azure OpenAI, LM Studio).
pub struct OpenAiBackend {
    name: &'static str,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
}

impl OpenAiBackend {
    /// Creates a connector for an OpenAI-style endpoint.
    ///
    /// # Arguments
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `api_key` - Bearer token; `None` for services that need none
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
        proxy: Option<&str>,
    ) -> Result<Self, ConnectorError> {
        Ok(Self {
            name: "openai",
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client: build_client(timeout, proxy)?,
        })
    }

    /// Creates a connector for a local LM Studio server.
    ///
    /// LM Studio speaks the OpenAI protocol but expects a fixed dummy key.
    pub fn lm_studio(
        base_url: &str,
        timeout: Duration,
        proxy: Option<&str>,
    ) -> Result<Self, ConnectorError> {
        let mut backend =
            Self::new(base_url, Some("lm-studio".to_string()), timeout, proxy)?;
        backend.name = "lmstudio";
        Ok(backend)
    }

    fn authorized(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn list_models(&self) -> Result<Vec<String>, ConnectorError> {
        let response = self
            .authorized(self.client.get(format!("{}/models", self.base_url)))
            .send()?
            .error_for_status()?;
        let data: serde_json::Value = response.json()?;

        let mut models: Vec<String> = data["data"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry["id"].as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        models.sort();
        Ok(models)
    }

    fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancelToken,
    ) -> Result<CompletionStream, ConnectorError> {
        let mut messages = Vec::new();
        if let Some(system) = &request.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": request.prompt}));

        let mut payload = json!({
            "model": request.model,
            "messages": messages,
            "stream": request.stream,
        });
        if let Some(temperature) = request.temperature {
            payload["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        debug!("POST {}/chat/completions (model {})", self.base_url, request.model);
        let response = self
            .authorized(self.client.post(format!("{}/chat/completions", self.base_url)))
            .json(&payload)
            .send()?
            .error_for_status()?;

        if request.stream {
            return Ok(Box::new(SseChunks::new(response, cancel.clone())));
        }

        let data: serde_json::Value = response.json()?;
        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ConnectorError::Response("completion carries no message content".to_string())
            })?
            .to_string();
        Ok(Box::new(std::iter::once(Ok(content))))
    }
}

/// Iterator over the `data:` frames of a chat-completions SSE stream.
struct SseChunks {
    lines: Lines<BufReader<reqwest::blocking::Response>>,
    cancel: CancelToken,
    finished: bool,
}

impl SseChunks {
    fn new(response: reqwest::blocking::Response, cancel: CancelToken) -> Self {
        Self { lines: BufReader::new(response).lines(), cancel, finished: false }
    }
}

impl Iterator for SseChunks {
    type Item = Result<String, ConnectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            if self.cancel.is_cancelled() {
                self.finished = true;
                return Some(Err(ConnectorError::Stopped));
            }
            let line = match self.lines.next() {
                Some(Ok(line)) => line,
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(ConnectorError::Response(err.to_string())));
                }
                None => {
                    self.finished = true;
                    return None;
                }
            };

            let Some(data) = line.strip_prefix("data: ") else { continue };
            if data.trim() == "[DONE]" {
                self.finished = true;
                return None;
            }
            // Keep-alive frames and partial JSON are skipped silently.
            let Ok(chunk) = serde_json::from_str::<serde_json::Value>(data) else {
                continue;
            };
            if let Some(content) = chunk["choices"][0]["delta"]["content"].as_str() {
                if !content.is_empty() {
                    return Some(Ok(content.to_string()));
                }
            }
        }
    }
}
