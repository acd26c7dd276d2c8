use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::llm::{
    models::{ChatOptions, ChatResponse, Message, Usage},
    status_error, LlmError, LlmProvider,
};

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: Client,
    api_key: String,
    base_url: String,
    default_model: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(api_key: String, base_url: String, default_model: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        let model = options.model.as_deref().unwrap_or(&self.default_model);

        // System text is a top-level field here, never a message
        let mut system = String::new();
        let mut turns: Vec<Message> = messages
            .iter()
            .filter_map(|m| {
                if m.role == "system" {
                    system.push_str(&m.content);
                    system.push('\n');
                    None
                } else {
                    Some(m.clone())
                }
            })
            .collect();
        if let Some(opts_system) = &options.system_prompt {
            system.push_str(opts_system);
        }
        // The conversation must open on a user turn; the widget opens on the bot's greeting
        if turns.first().map_or(true, |m| m.role != "user") {
            turns.insert(0, Message::user("Hello"));
        }

        let body = MessagesRequest {
            model,
            messages: turns,
            system: system.trim().to_string(),
            temperature: options.temperature.unwrap_or(0.7),
            max_tokens: options.max_tokens.unwrap_or(1024),
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(status_error("Anthropic", response).await);
        }

        let reply: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let content: String = reply.content.into_iter().filter_map(|b| b.text).collect();
        if content.is_empty() {
            return Err(LlmError::InvalidResponse("empty message content".to_string()));
        }

        Ok(ChatResponse {
            content,
            model: model.to_string(),
            usage: reply.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        })
    }
}
