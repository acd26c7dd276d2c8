use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, params_from_iter, Connection, Result as DbResult, Row};
use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::db::models::{ApplicationFields, ApplicationRecord, Field};
use crate::db::connection::{get_connection, is_valid_table, DEFAULT_TABLE};
use crate::db::{ApplicationStore, DbPool, StoreError};

static SELECT_COLUMNS: Lazy<String> = Lazy::new(|| {
    let fields: Vec<&str> = Field::ALL.iter().map(|f| f.column()).collect();
    format!(
        "id, {}, CAST(created_at AS VARCHAR), CAST(updated_at AS VARCHAR)",
        fields.join(", ")
    )
});

pub struct DbService;

impl DbService {
    fn parse_timestamp(raw: Option<String>) -> Option<DateTime<Utc>> {
        // DuckDB renders TIMESTAMP as "YYYY-MM-DD HH:MM:SS[.ffffff]" without an offset
        raw.and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f").ok())
            .map(|naive| naive.and_utc())
    }

    fn row_to_application(row: &Row) -> DbResult<ApplicationRecord> {
        let mut fields = ApplicationFields::new();
        for (i, field) in Field::ALL.iter().enumerate() {
            if let Some(value) = row.get::<_, Option<String>>(i + 1)? {
                fields.insert(*field, value);
            }
        }

        let offset = Field::ALL.len() + 1;
        Ok(ApplicationRecord {
            id: row.get(0)?,
            fields,
            created_at: Self::parse_timestamp(row.get(offset)?),
            updated_at: Self::parse_timestamp(row.get(offset + 1)?),
        })
    }

    pub fn insert_application(conn: &Connection, table: &str, fields: &ApplicationFields) -> DbResult<ApplicationRecord> {
        let id = Uuid::new_v4().to_string();

        let mut columns = vec!["id"];
        let mut values = vec![id.clone()];
        for (field, value) in fields {
            columns.push(field.column());
            values.push(value.clone());
        }
        let placeholders = vec!["?"; columns.len()].join(", ");

        conn.execute(
            &format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders
            ),
            params_from_iter(values.iter()),
        )?;

        Self::get_application(conn, table, &id)?.ok_or(duckdb::Error::QueryReturnedNoRows)
    }

    /// Applies a partial update. Returns the number of rows touched (0 or 1).
    pub fn update_application(conn: &Connection, table: &str, id: &str, fields: &ApplicationFields) -> DbResult<usize> {
        if fields.is_empty() {
            return Ok(0);
        }

        let assignments: Vec<String> = fields
            .keys()
            .map(|f| format!("{} = ?", f.column()))
            .collect();
        let mut values: Vec<String> = fields.values().cloned().collect();
        values.push(id.to_string());

        conn.execute(
            &format!(
                "UPDATE {} SET {}, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
                table,
                assignments.join(", ")
            ),
            params_from_iter(values.iter()),
        )
    }

    pub fn get_application(conn: &Connection, table: &str, id: &str) -> DbResult<Option<ApplicationRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} WHERE id = ?",
            SELECT_COLUMNS.as_str(),
            table
        ))?;
        let mut rows = stmt.query_map(params![id], Self::row_to_application)?;

        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    pub fn list_applications(conn: &Connection, table: &str, limit: usize, offset: usize) -> DbResult<Vec<ApplicationRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM {} ORDER BY created_at DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS.as_str(),
            table
        ))?;
        let rows = stmt.query_map(params![limit as i64, offset as i64], Self::row_to_application)?;

        let mut applications = Vec::new();
        for row in rows {
            applications.push(row?);
        }
        Ok(applications)
    }

    pub fn count_applications(conn: &Connection, table: &str) -> DbResult<usize> {
        let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Embedded store backed by a single DuckDB connection.
#[derive(Clone)]
pub struct DuckDbStore {
    pool: DbPool,
    table: String,
}

impl DuckDbStore {
    /// Wraps a pool whose schema already holds `table`.
    pub fn new(pool: DbPool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    pub fn open(path: &str) -> Result<Self, StoreError> {
        Self::open_table(path, DEFAULT_TABLE)
    }

    pub fn open_table(path: &str, table: &str) -> Result<Self, StoreError> {
        if !is_valid_table(table) {
            return Err(StoreError::Config(format!("invalid table name '{}'", table)));
        }
        Ok(Self::new(get_connection(path, table)?, table))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> DbResult<T>) -> Result<T, StoreError> {
        let conn = self
            .pool
            .lock()
            .map_err(|_| StoreError::Database("connection lock poisoned".to_string()))?;
        Ok(f(&conn)?)
    }
}

#[async_trait]
impl ApplicationStore for DuckDbStore {
    fn name(&self) -> &str {
        "duckdb"
    }

    async fn insert(&self, fields: &ApplicationFields) -> Result<ApplicationRecord, StoreError> {
        self.with_conn(|conn| DbService::insert_application(conn, &self.table, fields))
    }

    async fn update(&self, id: &str, fields: &ApplicationFields) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        let touched = self.with_conn(|conn| DbService::update_application(conn, &self.table, id, fields))?;
        if touched == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<ApplicationRecord>, StoreError> {
        self.with_conn(|conn| DbService::get_application(conn, &self.table, id))
    }

    async fn list(&self, limit: usize) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.with_conn(|conn| DbService::list_applications(conn, &self.table, limit, 0))
    }
}
