//! LLM client for chatbot fallback replies.
//!
//! Wraps the `OpenAI` chat-completion API; the client is rebuilt per call
//! because the underlying SDK client is consumed mutably.

use openai_api_rs::v1::api::OpenAIClient;
use openai_api_rs::v1::chat_completion::{
    ChatCompletionMessage, ChatCompletionRequest, Content, MessageRole,
};
use openai_api_rs::v1::common::GPT4_O;
use tracing::debug;

use crate::core::config::OpenAiConfig;
use crate::errors::{AppError, AppResult};

const MAX_REPLY_TOKENS: i64 = 400;
const TEMPERATURE: f64 = 0.4;

/// One prior turn of the conversation, oldest first.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// True for customer messages; false for agent/bot replies.
    pub from_customer: bool,
    pub text: String,
}

pub struct LlmClient {
    api_key: String,
    model: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            model: config.model.clone().unwrap_or_else(|| GPT4_O.to_string()),
        }
    }

    /// Generates a reply to the latest customer message.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Llm`] when the API call fails or returns an
    /// empty completion.
    pub async fn complete(&self, system_prompt: &str, turns: &[ChatTurn]) -> AppResult<String> {
        let mut messages = vec![ChatCompletionMessage {
            role: MessageRole::system,
            content: Content::Text(system_prompt.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }];

        for turn in turns {
            messages.push(ChatCompletionMessage {
                role: if turn.from_customer {
                    MessageRole::user
                } else {
                    MessageRole::assistant
                },
                content: Content::Text(turn.text.clone()),
                name: None,
                tool_calls: None,
                tool_call_id: None,
            });
        }

        let request = ChatCompletionRequest::new(self.model.clone(), messages)
            .temperature(TEMPERATURE)
            .max_tokens(MAX_REPLY_TOKENS);

        let mut client = match OpenAIClient::builder()
            .with_api_key(self.api_key.clone())
            .build()
        {
            Ok(client) => client,
            Err(e) => return Err(AppError::Llm(format!("failed to create client: {e}"))),
        };

        let result = match client.chat_completion(request).await {
            Ok(result) => result,
            Err(e) => return Err(AppError::Llm(e.to_string())),
        };

        debug!(model = %self.model, "chat completion returned");

        result
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::Llm("empty completion".to_string()))
    }
}
