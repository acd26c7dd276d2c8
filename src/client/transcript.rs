use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::models::{ChatTurn, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    Bot,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    ShowButton { url: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub id: u64,
    pub text: String,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    pub directive: Option<Directive>,
}

/// Append-only conversation log.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
    next_id: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, author: Author, text: String, directive: Option<Directive>) -> Message {
        self.next_id += 1;
        let message = Message {
            id: self.next_id,
            text,
            author,
            timestamp: Utc::now(),
            directive,
        };
        self.messages.push(message.clone());
        message
    }

    pub fn push_bot(&mut self, text: impl Into<String>, directive: Option<Directive>) -> Message {
        self.push(Author::Bot, text.into(), directive)
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> Message {
        self.push(Author::User, text.into(), None)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The history as the relay expects it.
    pub fn to_turns(&self) -> Vec<ChatTurn> {
        self.messages
            .iter()
            .map(|m| ChatTurn {
                role: match m.author {
                    Author::Bot => Role::Assistant,
                    Author::User => Role::User,
                },
                content: m.text.clone(),
            })
            .collect()
    }
}
