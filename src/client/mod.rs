//! Headless chat widget.
//!
//! `ChatClient` owns the transcript and the local conversation state, talks to
//! the relay through a [`RelayTransport`] and, when the deployment lets the
//! client own persistence, writes captured answers to an [`ApplicationStore`].
//! Rendering is left to the caller: every exchange returns a [`Turn`] listing
//! the new bot messages, their reveal delays and where focus should go.

pub mod capture;
pub mod detect;
pub mod options;
pub mod split;
pub mod transcript;
pub mod transport;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::api::models::ChatReply;
use crate::config::{FlowConfig, PersistencePolicy, QuestionTag};
use crate::db::{models::ApplicationFields, ApplicationStore};
use detect::{detect_question, Widget};
use options::OptionSelector;
use split::AnchorTable;
use transcript::{Directive, Message, Transcript};
use transport::RelayTransport;

pub const APOLOGY: &str = "I'm sorry, there was an error. Could you please repeat that?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error("waiting for the assistant to reply")]
    Busy,
    #[error("the conversation has finished")]
    Finished,
    #[error("answer is empty")]
    EmptyAnswer,
    #[error("no option selected")]
    NoSelection,
    #[error("no option selector is open")]
    NoSelector,
    #[error("unknown option '{0}'")]
    UnknownOption(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Selector,
    None,
}

/// A bot message and how long to wait before showing it.
#[derive(Debug, Clone)]
pub struct Reveal {
    pub delay: Duration,
    pub message: Message,
}

#[derive(Debug, Clone)]
pub struct Turn {
    pub reveals: Vec<Reveal>,
    pub focus: Focus,
}

impl Turn {
    pub fn texts(&self) -> Vec<&str> {
        self.reveals.iter().map(|r| r.message.text.as_str()).collect()
    }
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    pub question: QuestionTag,
    pub selector: Option<OptionSelector>,
    /// Free-text input buffer; the caret sits at its end.
    pub input: String,
    pub busy: bool,
    /// Set once a share button has been shown; no more input is taken.
    pub finished: bool,
    pub button_url: Option<String>,
}

impl Default for ConversationState {
    fn default() -> Self {
        Self {
            question: QuestionTag::FreeForm,
            selector: None,
            input: String::new(),
            busy: false,
            finished: false,
            button_url: None,
        }
    }
}

pub struct ChatClient<T: RelayTransport> {
    flow: Arc<FlowConfig>,
    transport: T,
    store: Option<Arc<dyn ApplicationStore>>,
    anchors: AnchorTable,
    transcript: Transcript,
    state: ConversationState,
    captured: ApplicationFields,
    answered: HashSet<QuestionTag>,
    record_id: Option<String>,
}

impl<T: RelayTransport> ChatClient<T> {
    pub fn new(flow: Arc<FlowConfig>, transport: T) -> Self {
        let anchors = AnchorTable::new(flow.split_anchors.clone());
        Self {
            flow,
            transport,
            store: None,
            anchors,
            transcript: Transcript::new(),
            state: ConversationState::default(),
            captured: ApplicationFields::new(),
            answered: HashSet::new(),
            record_id: None,
        }
    }

    /// Answers are written to `store` according to the flow's policy.
    pub fn with_store(mut self, store: Arc<dyn ApplicationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn captured(&self) -> &ApplicationFields {
        &self.captured
    }

    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    pub fn flow(&self) -> &FlowConfig {
        &self.flow
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    /// Opens the conversation with an empty history.
    pub async fn start(&mut self) -> Turn {
        self.state.busy = true;
        let result = self.transport.send(&[]).await;
        self.state.busy = false;

        match result {
            Ok(reply) => self.render(reply),
            Err(e) => {
                error!("Failed to fetch opening message: {}", e);
                let fallback = ChatReply {
                    message: self.flow.fallback_opening.clone(),
                    show_button: false,
                    button_url: None,
                    question: None,
                };
                self.render(fallback)
            }
        }
    }

    fn ensure_accepting(&self) -> Result<(), ClientError> {
        if self.state.finished {
            return Err(ClientError::Finished);
        }
        if self.state.busy {
            return Err(ClientError::Busy);
        }
        Ok(())
    }

    /// Sends a free-text answer.
    pub async fn submit_text(&mut self, text: &str) -> Result<Turn, ClientError> {
        self.ensure_accepting()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyAnswer);
        }

        self.transcript.push_user(text);
        self.state.input.clear();
        self.state.selector = None;
        self.record_answer(text).await;

        Ok(self.exchange().await)
    }

    /// Sends whatever sits in the input buffer.
    pub async fn submit_input(&mut self) -> Result<Turn, ClientError> {
        let text = self.state.input.clone();
        self.submit_text(&text).await
    }

    /// Checks or unchecks one option of the open selector.
    pub fn set_option(&mut self, option: &str, checked: bool) -> Result<(), ClientError> {
        self.ensure_accepting()?;
        let selector = self.state.selector.as_mut().ok_or(ClientError::NoSelector)?;
        if selector.set(option, checked) {
            Ok(())
        } else {
            Err(ClientError::UnknownOption(option.to_string()))
        }
    }

    /// Flips one option of the open selector and returns its new state.
    pub fn toggle_option(&mut self, option: &str) -> Result<bool, ClientError> {
        self.ensure_accepting()?;
        let selector = self.state.selector.as_mut().ok_or(ClientError::NoSelector)?;
        selector
            .toggle(option)
            .ok_or_else(|| ClientError::UnknownOption(option.to_string()))
    }

    /// Submits the open selector's choices as one comma-joined answer.
    pub async fn continue_selection(&mut self) -> Result<Turn, ClientError> {
        self.ensure_accepting()?;
        let selector = self.state.selector.as_ref().ok_or(ClientError::NoSelector)?;
        let answer = selector.answer().ok_or(ClientError::NoSelection)?;

        self.transcript.push_user(answer.clone());
        self.state.selector = None;
        self.record_answer(&answer).await;

        Ok(self.exchange().await)
    }

    async fn record_answer(&mut self, answer: &str) {
        let tag = self.state.question;
        let fields = capture::capture_answer(tag, answer);
        if fields.is_empty() {
            return;
        }

        debug!("Captured {} for question {}", fields.len(), tag);
        self.answered.insert(tag);
        self.captured.extend(fields.clone());
        self.persist(fields).await;
    }

    fn is_complete(&self) -> bool {
        self.flow
            .questions
            .iter()
            .all(|q| self.answered.contains(&q.tag))
    }

    async fn persist(&mut self, fields: ApplicationFields) {
        let Some(store) = self.store.clone() else {
            return;
        };

        if let Some(id) = &self.record_id {
            if let Err(e) = store.update(id, &fields).await {
                error!("Failed to update application {}: {}", id, e);
            }
            return;
        }

        let ready = match self.flow.persistence.policy {
            PersistencePolicy::Incremental => true,
            PersistencePolicy::CollectThenInsert => self.is_complete(),
        };
        if !ready {
            return;
        }

        // Everything captured so far, so an earlier failed insert loses nothing
        match store.insert(&self.captured).await {
            Ok(record) => {
                info!("Created application {}", record.id);
                self.record_id = Some(record.id);
            }
            Err(e) => error!("Failed to create application: {}", e),
        }
    }

    async fn exchange(&mut self) -> Turn {
        self.state.busy = true;
        let turns = self.transcript.to_turns();
        let result = self.transport.send(&turns).await;
        self.state.busy = false;

        match result {
            Ok(reply) => self.render(reply),
            Err(e) => {
                error!("Chat request failed: {}", e);
                let message = self.transcript.push_bot(APOLOGY, None);
                let focus = if self.state.selector.is_some() {
                    Focus::Selector
                } else {
                    Focus::Input
                };
                Turn {
                    reveals: vec![Reveal {
                        delay: Duration::ZERO,
                        message,
                    }],
                    focus,
                }
            }
        }
    }

    fn render(&mut self, reply: ChatReply) -> Turn {
        let delay = Duration::from_millis(self.flow.reveal_delay_ms);
        let directive = match (reply.show_button, &reply.button_url) {
            (true, Some(url)) => Some(Directive::ShowButton { url: url.clone() }),
            _ => None,
        };

        let parts = self.anchors.split(&reply.message);
        let last = parts.len() - 1;
        let mut reveals = Vec::with_capacity(parts.len());
        for (i, part) in parts.into_iter().enumerate() {
            let part_directive = if i == last { directive.clone() } else { None };
            let message = self.transcript.push_bot(part, part_directive);
            reveals.push(Reveal {
                delay: if i == 0 { Duration::ZERO } else { delay },
                message,
            });
        }

        if let Some(Directive::ShowButton { url }) = directive {
            self.state.finished = true;
            self.state.selector = None;
            self.state.input.clear();
            self.state.button_url = Some(url);
            return Turn {
                reveals,
                focus: Focus::None,
            };
        }

        // Detection always looks at the whole reply, not the split parts
        let detection = detect_question(&self.flow, &reply.message, reply.question);
        self.state.question = detection.tag;
        let focus = match detection.widget {
            Widget::Text { prefill } => {
                self.state.selector = None;
                self.state.input = prefill.unwrap_or_default();
                Focus::Input
            }
            Widget::DaySelector => {
                self.state.selector = Some(OptionSelector::days());
                Focus::Selector
            }
            Widget::TimeSelector => {
                self.state.selector = Some(OptionSelector::times());
                Focus::Selector
            }
        };

        Turn { reveals, focus }
    }
}
