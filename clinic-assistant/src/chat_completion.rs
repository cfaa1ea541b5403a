use crate::error::AssistantResult;
use async_trait::async_trait;
use config_engine::ResponderSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use workflow_engine::{DialogError, DialogResult, FreeTextResponder, Sender, Turn};

pub const NO_ANSWER: &str = "No answer available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Free-text responder backed by an OpenAI-compatible chat completion API.
pub struct ChatCompletionResponder {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
}

impl ChatCompletionResponder {
    pub fn new(settings: &ResponderSettings) -> AssistantResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: format!("{}/v1/chat/completions", settings.endpoint.trim_end_matches('/')),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            system_prompt: settings.system_prompt.clone(),
        })
    }

    /// System prompt, then the history as user/assistant turns, then the question.
    pub fn build_messages(&self, text: &str, prior_turns: &[Turn]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(prior_turns.len() + 2);
        messages.push(ChatMessage::new("system", self.system_prompt.as_str()));
        messages.extend(prior_turns.iter().map(|turn| {
            let role = match turn.sender {
                Sender::Caller => "user",
                Sender::System => "assistant",
            };
            ChatMessage::new(role, turn.text.as_str())
        }));
        messages.push(ChatMessage::new("user", text));
        messages
    }
}

#[async_trait]
impl FreeTextResponder for ChatCompletionResponder {
    async fn respond(&self, text: &str, prior_turns: &[Turn]) -> DialogResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: self.build_messages(text, prior_turns),
        };

        let mut req = self.client.post(&self.url).json(&request);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| DialogError::Responder(e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Chat completion request rejected");
            return Err(DialogError::Responder(format!(
                "chat completion failed with status: {}",
                response.status()
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| DialogError::Responder(e.to_string()))?;

        let answer = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty());
        debug!(answered = answer.is_some(), history = prior_turns.len(), "Chat completion done");
        Ok(answer.unwrap_or_else(|| NO_ANSWER.to_string()))
    }
}
