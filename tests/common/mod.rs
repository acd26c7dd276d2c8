#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use intake::api::models::{ChatReply, ChatTurn};
use intake::client::transport::{RelayTransport, TransportError};
use intake::db::models::{ApplicationFields, ApplicationRecord};
use intake::db::service::DuckDbStore;
use intake::db::{ApplicationStore, StoreError};
use intake::llm::models::{ChatOptions, ChatResponse, Message};
use intake::llm::{LlmError, LlmProvider};

/// Replays canned model replies and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    pub calls: Mutex<Vec<(Vec<Message>, ChatOptions)>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, messages: &[Message], options: ChatOptions) -> Result<ChatResponse, LlmError> {
        self.calls.lock().unwrap().push((messages.to_vec(), options));
        let next = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Api("script exhausted".to_string())));
        next.map(|content| ChatResponse {
            content,
            model: "scripted-1".to_string(),
            usage: None,
        })
    }
}

/// Relay stand-in returning prepared wire replies.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ChatReply, TransportError>>>,
    pub sent: Mutex<Vec<Vec<ChatTurn>>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<ChatReply, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(reply(t))).collect())
    }
}

pub fn reply(text: &str) -> ChatReply {
    ChatReply {
        message: text.to_string(),
        show_button: false,
        button_url: None,
        question: None,
    }
}

#[async_trait]
impl RelayTransport for ScriptedTransport {
    async fn send(&self, turns: &[ChatTurn]) -> Result<ChatReply, TransportError> {
        self.sent.lock().unwrap().push(turns.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network("connection refused".to_string())))
    }
}

/// In-memory DuckDB store that counts writes.
pub struct CountingStore {
    pub inner: DuckDbStore,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: DuckDbStore::open(":memory:").unwrap(),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
        })
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicationStore for CountingStore {
    fn name(&self) -> &str {
        "counting"
    }

    async fn insert(&self, fields: &ApplicationFields) -> Result<ApplicationRecord, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(fields).await
    }

    async fn update(&self, id: &str, fields: &ApplicationFields) -> Result<(), StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, fields).await
    }

    async fn get(&self, id: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        self.inner.get(id).await
    }

    async fn list(&self, limit: usize) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.inner.list(limit).await
    }
}

/// Store whose writes always fail; counts the attempts.
#[derive(Default)]
pub struct FailingStore {
    pub attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ApplicationStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn insert(&self, _fields: &ApplicationFields) -> Result<ApplicationRecord, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Http("HTTP 503: store unavailable".to_string()))
    }

    async fn update(&self, id: &str, _fields: &ApplicationFields) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::NotFound(id.to_string()))
    }

    async fn get(&self, _id: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        Ok(None)
    }

    async fn list(&self, _limit: usize) -> Result<Vec<ApplicationRecord>, StoreError> {
        Ok(Vec::new())
    }
}
