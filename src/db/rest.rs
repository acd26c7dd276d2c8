use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::debug;

use crate::db::models::{ApplicationFields, ApplicationRecord, Field};
use crate::db::{ApplicationStore, StoreError};

/// Hosted store speaking the PostgREST dialect (`/rest/v1/<table>`), as exposed
/// by Supabase-style backends.
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl RestStore {
    pub fn new(base_url: String, api_key: String, table: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            table,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn rows(&self, builder: RequestBuilder) -> Result<Vec<ApplicationRecord>, StoreError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| StoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StoreError::Http(format!("{} {}", status, text)));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        match json {
            Value::Array(items) => items.iter().map(row_from_json).collect(),
            other => Ok(vec![row_from_json(&other)?]),
        }
    }
}

/// Decodes one row; the id may be a uuid string or a bigint depending on the table.
pub fn row_from_json(row: &Value) -> Result<ApplicationRecord, StoreError> {
    let id = match row.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(StoreError::InvalidResponse("row without id".to_string())),
    };

    let mut fields = ApplicationFields::new();
    for field in Field::ALL {
        if let Some(value) = row.get(field.column()) {
            match value {
                Value::Null => {}
                Value::String(s) => {
                    fields.insert(field, s.clone());
                }
                other => {
                    fields.insert(field, other.to_string());
                }
            }
        }
    }

    let timestamp = |key: &str| {
        row.get(key)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
    };

    Ok(ApplicationRecord {
        id,
        fields,
        created_at: timestamp("created_at"),
        updated_at: timestamp("updated_at"),
    })
}

#[async_trait]
impl ApplicationStore for RestStore {
    fn name(&self) -> &str {
        "rest"
    }

    async fn insert(&self, fields: &ApplicationFields) -> Result<ApplicationRecord, StoreError> {
        debug!("Inserting application into {}", self.table);
        let builder = self
            .client
            .post(self.endpoint())
            .header("Prefer", "return=representation")
            .json(fields);

        self.rows(builder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse("insert returned no rows".to_string()))
    }

    async fn update(&self, id: &str, fields: &ApplicationFields) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        debug!("Updating application {} in {}", id, self.table);
        let builder = self
            .client
            .patch(self.endpoint())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(fields);

        if self.rows(builder).await?.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        let builder = self
            .client
            .get(self.endpoint())
            .query(&[("id", format!("eq.{}", id)), ("select", "*".to_string())]);

        Ok(self.rows(builder).await?.into_iter().next())
    }

    async fn list(&self, limit: usize) -> Result<Vec<ApplicationRecord>, StoreError> {
        let builder = self.client.get(self.endpoint()).query(&[
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ]);

        self.rows(builder).await
    }
}
