//! Blocking chat-completions client.
//!
//! One synchronous request per generation call, no retry and no backoff;
//! failures map into the core's generation error and propagate unchanged.

use serde::Deserialize;
use slidegen_core::{Error, GenerationRequest, Generator, Result};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model for chat completions.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Generation-service client speaking the OpenAI chat-completions protocol.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Create a client with the default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for proxies and compatible services).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The configured model.
    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Response subset we read: the first choice's message content.
#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: String,
}

impl ChatCompletion {
    fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}

impl Generator for OpenAiClient {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": request.system_instruction},
                {"role": "user", "content": request.user_prompt},
            ],
        });

        log::debug!("POST {} model={}", url, self.model);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .map_err(|e| Error::Generation(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(Error::Generation(format!(
                "HTTP {}: {}",
                status.as_u16(),
                detail
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .map_err(|e| Error::Generation(format!("unreadable response: {}", e)))?;

        completion
            .into_content()
            .ok_or_else(|| Error::Generation("response carried no choices".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "<div>ok</div>"},
                    "finish_reason": "stop"
                }
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;

        let completion: ChatCompletion = serde_json::from_str(json).unwrap();
        assert_eq!(completion.into_content().as_deref(), Some("<div>ok</div>"));
    }

    #[test]
    fn test_empty_choices_yield_none() {
        let completion: ChatCompletion = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(completion.into_content(), None);
    }

    #[test]
    fn test_builder_overrides() {
        let client = OpenAiClient::new("key")
            .with_model("gpt-4o-mini")
            .with_base_url("http://localhost:8080/v1");

        assert_eq!(client.model(), "gpt-4o-mini");
        assert_eq!(client.base_url, "http://localhost:8080/v1");
    }
}
