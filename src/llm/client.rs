use crate::error::{Result, StatementPipelineError};
use crate::llm::types::*;
use reqwest::Client;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Thin wrapper over an OpenAI-compatible chat-completions endpoint.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different endpoint (a proxy or a local server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sends a system + user message pair and returns the raw message text.
    /// The request forces `json_object` output, so the text should be a JSON
    /// document; parse failures are the caller's to handle.
    pub async fn chat_json(&self, model: &str, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let payload = ChatRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::system(system_prompt),
                ChatMessage::user(user_prompt),
            ],
            response_format: ResponseFormat::json_object(),
        };

        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(StatementPipelineError::ExtractionFailed(format!(
                "Chat API error (status {}): {}",
                status, err_text
            )));
        }

        let body: ChatResponse = res.json().await?;
        let choice = body.choices.into_iter().next().ok_or_else(|| {
            StatementPipelineError::ExtractionFailed("Empty choices list".to_string())
        })?;

        Ok(choice.message.content)
    }
}
