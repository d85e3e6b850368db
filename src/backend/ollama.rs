//! Ollama connector for locally hosted models.

use std::io::{BufRead, BufReader, Lines};
use std::time::Duration;

use log::debug;
use serde_json::json;

use super::{
    build_client, CancelToken, CompletionRequest, CompletionStream, ConnectorError, LlmBackend,
};

/// Connector for a local Ollama server (`/api/tags`, `/api/generate`).
pub struct OllamaBackend {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl OllamaBackend {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        proxy: Option<&str>,
    ) -> Result<Self, ConnectorError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_client(timeout, proxy)?,
        })
    }
}

impl LlmBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn list_models(&self) -> Result<Vec<String>, ConnectorError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()?
            .error_for_status()?;
        let data: serde_json::Value = response.json()?;

        let mut models: Vec<String> = data["models"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry["name"].as_str().map(String::from))
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
        let mut payload = json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": request.stream,
        });
        if let Some(system) = &request.system {
            payload["system"] = json!(system);
        }
        if let Some(temperature) = request.temperature {
            payload["options"]["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = request.max_tokens {
            payload["options"]["num_predict"] = json!(max_tokens);
        }

        debug!("POST {}/api/generate (model {})", self.base_url, request.model);
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&payload)
            .send()?
            .error_for_status()?;

        if request.stream {
            return Ok(Box::new(GenerateChunks::new(response, cancel.clone())));
        }

        let data: serde_json::Value = response.json()?;
        let content = data["response"]
            .as_str()
            .ok_or_else(|| {
                ConnectorError::Response("generate response carries no text".to_string())
            })?
            .to_string();
        Ok(Box::new(std::iter::once(Ok(content))))
    }
}

/// Iterator over the JSON-line frames of an Ollama generate stream.
struct GenerateChunks {
    lines: Lines<BufReader<reqwest::blocking::Response>>,
    cancel: CancelToken,
    finished: bool,
}

impl GenerateChunks {
    fn new(response: reqwest::blocking::Response, cancel: CancelToken) -> Self {
        Self { lines: BufReader::new(response).lines(), cancel, finished: false }
    }
}

impl Iterator for GenerateChunks {
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

            let Ok(chunk) = serde_json::from_str::<serde_json::Value>(&line) else {
                continue;
            };
            if chunk["done"].as_bool().unwrap_or(false) {
                self.finished = true;
            }
            if let Some(content) = chunk["response"].as_str() {
                if !content.is_empty() {
                    return Some(Ok(content.to_string()));
                }
            }
            if self.finished {
                return None;
            }
        }
    }
}
