//! User-defined HTTP connector driven by a payload template.

use std::time::Duration;

use indexmap::IndexMap;
use log::debug;

use super::{
    build_client, CancelToken, CompletionRequest, CompletionStream, ConnectorError, LlmBackend,
};

/// Response keys probed, in order, for the generated text.
const RESPONSE_TEXT_KEYS: [&str; 4] = ["text", "response", "content", "output"];

/// Connector for arbitrary HTTP endpoints.
///
/// The outgoing JSON body comes from a user-supplied payload template with
/// single-brace placeholders (`{prompt}`, `{system}`, `{temperature}`,
/// `{max_tokens}`). Substitution only; templates get no control-flow
/// grammar here.
pub struct CustomHttpBackend {
    name: String,
    url: String,
    payload_template: String,
    headers: IndexMap<String, String>,
    client: reqwest::blocking::Client,
}

impl CustomHttpBackend {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        payload_template: impl Into<String>,
        headers: IndexMap<String, String>,
        timeout: Duration,
        proxy: Option<&str>,
    ) -> Result<Self, ConnectorError> {
        Ok(Self {
            name: name.into(),
            url: url.into(),
            payload_template: payload_template.into(),
            headers,
            client: build_client(timeout, proxy)?,
        })
    }

    fn build_payload(&self, request: &CompletionRequest) -> Result<serde_json::Value, ConnectorError> {
        let raw = substitute_placeholders(&self.payload_template, request);
        serde_json::from_str(&raw).map_err(|err| {
            ConnectorError::Config(format!("payload template produced invalid JSON: {}", err))
        })
    }
}

/// Fills the payload template's single-brace placeholders from the request.
fn substitute_placeholders(template: &str, request: &CompletionRequest) -> String {
    let mut payload = template.replace("{prompt}", &request.prompt);
    if let Some(system) = &request.system {
        payload = payload.replace("{system}", system);
    }
    if let Some(temperature) = request.temperature {
        payload = payload.replace("{temperature}", &temperature.to_string());
    }
    if let Some(max_tokens) = request.max_tokens {
        payload = payload.replace("{max_tokens}", &max_tokens.to_string());
    }
    payload
}

impl LlmBackend for CustomHttpBackend {
    fn name(&self) -> &str {
        &self.name
    }

    /// Custom endpoints have no model listing.
    fn list_models(&self) -> Result<Vec<String>, ConnectorError> {
        Ok(vec!["default".to_string()])
    }

    fn complete(
        &self,
        request: &CompletionRequest,
        _cancel: &CancelToken,
    ) -> Result<CompletionStream, ConnectorError> {
        let payload = self.build_payload(request)?;

        let mut http = self.client.post(&self.url).json(&payload);
        for (key, value) in &self.headers {
            http = http.header(key.as_str(), value.as_str());
        }

        debug!("POST {} (custom backend '{}')", self.url, self.name);
        let response = http.send()?.error_for_status()?;
        let data: serde_json::Value = response.json()?;

        let content = RESPONSE_TEXT_KEYS
            .iter()
            .find_map(|key| data[key].as_str().map(String::from))
            .unwrap_or_else(|| data.to_string());
        Ok(Box::new(std::iter::once(Ok(content))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_placeholders_fills_known_names() {
        let mut request = CompletionRequest::new("hello", "m1");
        request.system = Some("be terse".to_string());
        request.temperature = Some(0.5);
        let template = r#"{"input": "{prompt}", "sys": "{system}", "temp": {temperature}}"#;
        assert_eq!(
            substitute_placeholders(template, &request),
            r#"{"input": "hello", "sys": "be terse", "temp": 0.5}"#
        );
    }

    #[test]
    fn test_unset_placeholders_are_left_alone() {
        let request = CompletionRequest::new("hello", "m1");
        let template = r#"{"max": {max_tokens}}"#;
        assert_eq!(substitute_placeholders(template, &request), template);
    }
}
