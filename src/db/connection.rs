use duckdb::{Connection, Result as DbResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::{Arc, Mutex};
use tracing::info;

use crate::db::models::Field;

pub type DbPool = Arc<Mutex<Connection>>;

pub const DEFAULT_TABLE: &str = "applications";

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

static FIELD_COLUMNS: Lazy<String> = Lazy::new(|| {
    Field::ALL
        .iter()
        .map(|f| format!("    {} VARCHAR,\n", f.column()))
        .collect()
});

/// Table names are spliced into SQL, so only plain identifiers are accepted.
pub fn is_valid_table(table: &str) -> bool {
    IDENTIFIER.is_match(table)
}

fn schema(table: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {table} (
    id VARCHAR PRIMARY KEY,
{columns}    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);
"#,
        table = table,
        columns = FIELD_COLUMNS.as_str()
    )
}

pub fn get_connection(path: &str, table: &str) -> DbResult<DbPool> {
    info!("Connecting to DuckDB at {}", path);
    let conn = if path == ":memory:" {
        Connection::open_in_memory()?
    } else {
        Connection::open(path)?
    };

    init_schema(&conn, table)?;

    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_schema(conn: &Connection, table: &str) -> DbResult<()> {
    info!("Initializing application table '{}'", table);
    conn.execute_batch(&schema(table))?;
    Ok(())
}
