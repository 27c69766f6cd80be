use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::stateless_llm_interface::{GenerationRequest, StatelessLLMInterface};
use crate::error::ServiceError;

/// Longest slice of an error body kept in `ServiceError::Status`.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// OpenAI compatible LLM implementation
/// Talks to any `/chat/completions` endpoint (SiliconFlow, DeepSeek, OpenAI, ...)
pub struct OpenAICompatibleLLM {
    model: String,
    chat_url: String,
    auth_header: String,
    client: Client,
}

impl OpenAICompatibleLLM {
    pub fn new(model: String, base_url: String, api_key: String, timeout_secs: u64) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let chat_url = if base_url.ends_with("chat/completions") {
            base_url.clone()
        } else {
            format!("{}/chat/completions", base_url)
        };

        info!(
            "Initialized OpenAICompatibleLLM: model={}, base_url={}",
            model, base_url
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            model,
            chat_url,
            auth_header: format!("Bearer {}", api_key),
            client,
        }
    }
}

#[async_trait]
impl StatelessLLMInterface for OpenAICompatibleLLM {
    async fn chat_completion(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system_instruction,
                },
                Message {
                    role: "user",
                    content: &request.task_instruction,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .header("Authorization", &self.auth_header)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ServiceError::RateLimited);
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ServiceError::Malformed("response has no message content".to_string()))?;

        debug!("LLM returned {} characters", content.chars().count());
        Ok(content)
    }
}
