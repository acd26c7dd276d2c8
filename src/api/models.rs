use serde::{Deserialize, Serialize};

use crate::config::QuestionTag;
use crate::llm::models::Message as LlmMessage;
use crate::relay::RelayReply;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::User => "user",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl From<ChatTurn> for LlmMessage {
    fn from(turn: ChatTurn) -> Self {
        LlmMessage {
            role: turn.role.as_str().to_string(),
            content: turn.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub show_button: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionTag>,
}

impl From<RelayReply> for ChatReply {
    fn from(reply: RelayReply) -> Self {
        ChatReply {
            show_button: reply.show_button(),
            message: reply.message,
            button_url: reply.button_url,
            question: reply.question,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}
