//! The completion relay: prompt in front, model in the middle, reply
//! post-processing and optional persistence behind.

pub mod directive;
pub mod extract;
pub mod prompt;

use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::{FlowConfig, QuestionTag};
use crate::db::{models::ApplicationFields, ApplicationStore};
use crate::llm::{
    models::{ChatOptions, Message},
    LlmError, LlmProvider,
};

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("model provider failed: {0}")]
    Provider(#[from] LlmError),
}

/// A model reply after post-processing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelayReply {
    pub message: String,
    pub button_url: Option<String>,
    pub question: Option<QuestionTag>,
    pub data: Option<ApplicationFields>,
}

impl RelayReply {
    pub fn show_button(&self) -> bool {
        self.button_url.is_some()
    }
}

pub struct Relay {
    provider: Arc<dyn LlmProvider>,
    flow: Arc<FlowConfig>,
    store: Option<Arc<dyn ApplicationStore>>,
    system_prompt: String,
    options: ChatOptions,
}

impl Relay {
    pub fn new(provider: Arc<dyn LlmProvider>, flow: Arc<FlowConfig>) -> Self {
        let system_prompt = prompt::build_system_prompt(&flow);
        let options = ChatOptions {
            temperature: Some(flow.temperature),
            ..Default::default()
        };
        Self {
            provider,
            flow,
            store: None,
            system_prompt,
            options,
        }
    }

    /// Application data parsed from replies is inserted into `store`, one row
    /// per reply carrying a data block. The relay keeps no record id, so a
    /// repeated block becomes a second row.
    pub fn with_store(mut self, store: Arc<dyn ApplicationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_model(mut self, model: Option<String>, max_tokens: Option<u32>) -> Self {
        self.options.model = model;
        self.options.max_tokens = max_tokens;
        self
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.flow
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub async fn complete(&self, history: &[Message]) -> Result<RelayReply, RelayError> {
        let options = ChatOptions {
            system_prompt: Some(self.system_prompt.clone()),
            ..self.options.clone()
        };

        let response = self.provider.chat(history, options).await?;
        debug!(
            "{} replied with {} chars (usage: {:?})",
            self.provider.name(),
            response.content.len(),
            response.usage
        );

        let reply = self.process_reply(&response.content);

        if let (Some(store), Some(data)) = (&self.store, &reply.data) {
            debug!(
                "Inserting {} fields via {} (policy {:?} is not tracked per conversation)",
                data.len(),
                store.name(),
                self.flow.persistence.policy
            );
            match store.insert(data).await {
                Ok(record) => info!("Stored application {} via {}", record.id, store.name()),
                Err(e) => error!("Failed to store application data: {}", e),
            }
        }

        Ok(reply)
    }

    /// Strips the button token, the question marker and the data block from a
    /// raw model reply.
    pub fn process_reply(&self, raw: &str) -> RelayReply {
        let (text, button_url) = directive::extract_button(raw);
        let (text, question) = directive::extract_question(&text);

        let (message, data) = if self.flow.structured_data {
            let extraction = extract::extract_application_data(&text, &self.flow.data_fields());
            (extraction.text, extraction.data)
        } else {
            (text, None)
        };

        RelayReply {
            message,
            button_url,
            question,
            data,
        }
    }
}
