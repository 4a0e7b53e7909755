//! OpenAI-compatible answer refiner.
//!
//! Sends the question and the locally computed guess to a chat-completions
//! endpoint and returns the trimmed reply.

use crate::config::RefinerConfig;
use async_trait::async_trait;
use quizchain::{AnswerRefiner, CapabilityError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MAX_TOKENS: u32 = 50;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct OpenAiRefiner {
    client: Client,
    config: RefinerConfig,
}

impl OpenAiRefiner {
    pub fn new(config: RefinerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

fn build_prompt(question: &str, raw_answer: &str) -> String {
    format!(
        "You are a strict verification assistant.\n\
         Question: {question}\n\
         Computed answer: {raw_answer}\n\
         Return only the final verified answer without explanation."
    )
}

#[async_trait]
impl AnswerRefiner for OpenAiRefiner {
    async fn refine(
        &self,
        question: &str,
        raw_answer: &str,
        timeout: Duration,
    ) -> Result<String, CapabilityError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: build_prompt(question, raw_answer),
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| CapabilityError::Transport(format!("refiner request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CapabilityError::Status {
                status: response.status().as_u16(),
                url: self.endpoint(),
            });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| CapabilityError::Decode(format!("refiner response invalid: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| CapabilityError::Decode("refiner response missing content".into()))?;
        debug!(model = %self.config.model, reply = %content, "refiner replied");
        Ok(content)
    }
}
