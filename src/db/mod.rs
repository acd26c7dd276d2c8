pub mod connection;
pub mod models;
pub mod rest;
pub mod service;

pub use connection::{get_connection, DbPool};
pub use models::*;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{StoreBackend, StoreConfig};
use rest::RestStore;
use service::DuckDbStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database Error: {0}")]
    Database(String),
    #[error("HTTP Error: {0}")]
    Http(String),
    #[error("Application {0} not found")]
    NotFound(String),
    #[error("Invalid store response: {0}")]
    InvalidResponse(String),
    #[error("Store misconfigured: {0}")]
    Config(String),
}

impl From<duckdb::Error> for StoreError {
    fn from(e: duckdb::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

/// Insert-one / update-by-id table of application records.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    fn name(&self) -> &str;

    async fn insert(&self, fields: &ApplicationFields) -> Result<ApplicationRecord, StoreError>;

    async fn update(&self, id: &str, fields: &ApplicationFields) -> Result<(), StoreError>;

    async fn get(&self, id: &str) -> Result<Option<ApplicationRecord>, StoreError>;

    async fn list(&self, limit: usize) -> Result<Vec<ApplicationRecord>, StoreError>;
}

pub fn open_store(config: &StoreConfig) -> Result<Arc<dyn ApplicationStore>, StoreError> {
    match config.backend {
        StoreBackend::Duckdb => {
            let path = config.path.as_deref().unwrap_or("intake.duckdb");
            Ok(Arc::new(DuckDbStore::open_table(path, &config.table)?))
        }
        StoreBackend::Rest => {
            let url = config
                .url
                .clone()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| StoreError::Config("store.url is required for the rest backend".to_string()))?;
            let api_key = config.api_key.clone().unwrap_or_default();
            Ok(Arc::new(RestStore::new(url, api_key, config.table.clone())))
        }
    }
}
