//! Text-completion service boundary.
//!
//! The model is an untrusted oracle: callers get its raw text back and are
//! responsible for validating it.

use async_trait::async_trait;
use biograph_core::config::CompletionSettings;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::error::SynthesisError;

/// One chat-style completion request: a system instruction and a user turn.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Trait for completion providers.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Return the raw text of the first completion choice.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint (OpenAI, Groq, ...).
pub struct OpenAiCompatClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiCompatClient {
    pub fn new(settings: &CompletionSettings) -> Self {
        Self {
            client: Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompatClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, SynthesisError> {
        let api_key = self.api_key.as_deref().ok_or(SynthesisError::MissingApiKey)?;

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": request.system},
                    {"role": "user", "content": request.user}
                ],
                "temperature": request.temperature
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_chat_response(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_chat_response(body: &str) -> Result<String, SynthesisError> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| SynthesisError::Decode(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(SynthesisError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"MATCH (d:Drug) RETURN d.drug_name"}}]}"#;
        assert_eq!(
            parse_chat_response(body).unwrap(),
            "MATCH (d:Drug) RETURN d.drug_name"
        );
    }

    #[test]
    fn test_parse_chat_response_without_choices() {
        assert!(matches!(
            parse_chat_response(r#"{"choices":[]}"#),
            Err(SynthesisError::EmptyResponse)
        ));
        assert!(matches!(
            parse_chat_response("not json"),
            Err(SynthesisError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_sending() {
        let client = OpenAiCompatClient::new(&CompletionSettings::default());
        let request = CompletionRequest {
            system: "s".into(),
            user: "u".into(),
            temperature: 0.0,
        };
        assert!(matches!(
            client.complete(&request).await,
            Err(SynthesisError::MissingApiKey)
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let settings = CompletionSettings {
            base_url: "https://api.openai.com/v1/".into(),
            ..Default::default()
        };
        let client = OpenAiCompatClient::new(&settings);
        assert_eq!(client.endpoint(), "https://api.openai.com/v1/chat/completions");
        assert_eq!(client.model(), "llama3-70b-8192");
    }
}
