//! DuckDB backend store
//!
//! Local implementation of [`BackendStore`] used when no hosted backend is
//! configured, and for demo mode. Rows travel as JSON maps; every column is
//! checked against a static schema before it reaches SQL. Amounts are bound
//! and read as decimal text so no precision is lost on the way.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use duckdb::{Connection, ToSql};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::migrations::MIGRATIONS;
use crate::ports::key_value::keys;
use crate::ports::{BackendStore, Filter, Identity, KeyValueStore, Order, Row, Table};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when the database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Text,
    Decimal,
    Boolean,
    Integer,
}

use ColumnType::{Boolean, Decimal, Integer, Text};

const CAMPAIGN_COLUMNS: &[(&str, ColumnType)] = &[
    ("id", Text),
    ("title", Text),
    ("description", Text),
    ("image_url", Text),
    ("goal_amount", Decimal),
    ("raised_amount", Decimal),
    ("category", Text),
    ("location", Text),
    ("status", Text),
    ("start_date", Text),
    ("end_date", Text),
    ("created_by", Text),
    ("created_at", Text),
];

const DONATION_COLUMNS: &[(&str, ColumnType)] = &[
    ("id", Text),
    ("campaign_id", Text),
    ("donor_id", Text),
    ("amount", Decimal),
    ("payment_method", Text),
    ("is_anonymous", Boolean),
    ("is_recurring", Boolean),
    ("recurring_frequency", Text),
    ("donor_name", Text),
    ("donor_email", Text),
    ("message", Text),
    ("payment_status", Text),
    ("transaction_id", Text),
    ("receipt_url", Text),
    ("created_at", Text),
];

const VOLUNTEER_COLUMNS: &[(&str, ColumnType)] = &[
    ("id", Text),
    ("full_name", Text),
    ("email", Text),
    ("phone", Text),
    ("skills", Text),
    ("availability", Text),
    ("message", Text),
    ("status", Text),
    ("created_at", Text),
];

const SUBSCRIBER_COLUMNS: &[(&str, ColumnType)] = &[
    ("id", Text),
    ("email", Text),
    ("is_active", Boolean),
    ("created_at", Text),
];

const PROFILE_COLUMNS: &[(&str, ColumnType)] = &[
    ("id", Text),
    ("user_id", Text),
    ("full_name", Text),
    ("is_admin", Boolean),
    ("donation_count", Integer),
    ("total_donated", Decimal),
    ("created_at", Text),
];

fn columns(table: Table) -> &'static [(&'static str, ColumnType)] {
    match table {
        Table::Campaigns => CAMPAIGN_COLUMNS,
        Table::Donations => DONATION_COLUMNS,
        Table::Volunteers => VOLUNTEER_COLUMNS,
        Table::NewsletterSubscribers => SUBSCRIBER_COLUMNS,
        Table::Profiles => PROFILE_COLUMNS,
    }
}

fn column_type(table: Table, column: &str) -> Result<ColumnType> {
    columns(table)
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, ty)| *ty)
        .ok_or_else(|| Error::persistence(format!("unknown column {}.{}", table, column)))
}

fn placeholder(ty: ColumnType) -> &'static str {
    match ty {
        Decimal => "CAST(? AS DECIMAL(14, 2))",
        _ => "?",
    }
}

/// Convert a JSON value into a parameter for a column of type `ty`
fn bind_value(table: Table, column: &str, ty: ColumnType, value: &JsonValue) -> Result<Box<dyn ToSql>> {
    let invalid = || Error::persistence(format!("invalid value for {}.{}: {}", table, column, value));
    let param: Box<dyn ToSql> = match (ty, value) {
        (_, JsonValue::Null) => Box::new(None::<String>),
        (Boolean, JsonValue::Bool(b)) => Box::new(*b),
        (Integer, JsonValue::Number(n)) => Box::new(n.as_i64().ok_or_else(invalid)?),
        (Text | Decimal, JsonValue::String(s)) => Box::new(s.clone()),
        (Text | Decimal, JsonValue::Number(n)) => Box::new(n.to_string()),
        (Text, JsonValue::Bool(b)) => Box::new(b.to_string()),
        _ => return Err(invalid()),
    };
    Ok(param)
}

fn read_value(row: &duckdb::Row, idx: usize, ty: ColumnType) -> duckdb::Result<JsonValue> {
    let value = match ty {
        Text | Decimal => row.get::<_, Option<String>>(idx)?.map(JsonValue::String),
        Boolean => row.get::<_, Option<bool>>(idx)?.map(JsonValue::Bool),
        Integer => row.get::<_, Option<i64>>(idx)?.map(JsonValue::from),
    };
    Ok(value.unwrap_or(JsonValue::Null))
}

fn now_text() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// DuckDB-backed [`BackendStore`]
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
    identity: Option<Arc<dyn KeyValueStore>>,
}

impl DuckDbBackend {
    /// Open (or create) a database file and apply pending migrations
    ///
    /// Retries with exponential backoff while another process holds the file.
    pub fn open(db_path: &Path) -> Result<Self> {
        let mut attempt = 0;
        let conn = loop {
            match Self::try_open_connection(db_path) {
                Ok(conn) => break conn,
                Err(e) => {
                    let err_msg = e.to_string();
                    attempt += 1;
                    if !is_retryable_error(&err_msg) || attempt >= MAX_RETRIES {
                        return Err(e);
                    }
                    let delay = Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt - 1));
                    tracing::warn!(
                        path = %db_path.display(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err_msg,
                        "database busy, retrying"
                    );
                    thread::sleep(delay);
                }
            }
        };

        let backend = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path.to_path_buf()),
            identity: None,
        };
        backend.run_migrations()?;
        Ok(backend)
    }

    /// In-memory database with the schema applied
    pub fn open_in_memory() -> Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let backend = Self {
            conn: Mutex::new(Connection::open_in_memory_with_flags(config)?),
            db_path: None,
            identity: None,
        };
        backend.run_migrations()?;
        Ok(backend)
    }

    /// Resolve [`BackendStore::current_user`] from the local session keys
    pub fn with_identity(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.identity = Some(store);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    fn try_open_connection(db_path: &Path) -> Result<Connection> {
        // Extension autoloading stays off; JSON support is linked statically
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    pub fn run_migrations(&self) -> Result<MigrationResult> {
        let conn = self.lock()?;
        MigrationService::new(&conn, MIGRATIONS)
            .run_pending()
            .map_err(|e| Error::persistence(format!("migration failed: {}", e)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| Error::persistence(format!("Lock poisoned: {}", e)))
    }

    fn where_clause(table: Table, filter: &Filter) -> Result<(String, Vec<Box<dyn ToSql>>)> {
        if filter.is_empty() {
            return Ok((String::new(), Vec::new()));
        }
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        for (column, value) in filter.predicates() {
            let ty = column_type(table, column)?;
            if value.is_null() {
                clauses.push(format!("{} IS NULL", column));
                continue;
            }
            clauses.push(format!("{} = {}", column, placeholder(ty)));
            params.push(bind_value(table, column, ty, value)?);
        }
        Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
    }

    fn select_rows(&self, table: Table, filter: &Filter, order: Option<&Order>) -> Result<Vec<Row>> {
        let cols = columns(table);
        let select_list = cols
            .iter()
            .map(|(name, ty)| match ty {
                Decimal => format!("CAST({0} AS VARCHAR) AS {0}", name),
                _ => name.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        let (where_sql, params) = Self::where_clause(table, filter)?;
        let mut sql = format!("SELECT {} FROM {}{}", select_list, table.name(), where_sql);
        if let Some(order) = order {
            column_type(table, &order.column)?;
            let direction = if order.ascending { "ASC" } else { "DESC" };
            sql.push_str(&format!(" ORDER BY {} {}", order.column, direction));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
        let rows = stmt
            .query_map(param_refs.as_slice(), |row| {
                let mut map = Row::new();
                for (idx, (name, ty)) in cols.iter().enumerate() {
                    map.insert(name.to_string(), read_value(row, idx, *ty)?);
                }
                Ok(map)
            })?
            .collect::<duckdb::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn insert_row(&self, table: Table, mut row: Row) -> Result<Row> {
        let id = match row.get("id") {
            Some(JsonValue::String(id)) if !id.is_empty() => id.clone(),
            _ => {
                let id = Uuid::new_v4().to_string();
                row.insert("id".to_string(), JsonValue::String(id.clone()));
                id
            }
        };
        if row.get("created_at").map_or(true, JsonValue::is_null) {
            row.insert("created_at".to_string(), JsonValue::String(now_text()));
        }

        let mut names = Vec::new();
        let mut placeholders = Vec::new();
        let mut params = Vec::new();
        // Null values are left out so column defaults apply
        for (column, value) in row.iter().filter(|(_, v)| !v.is_null()) {
            let ty = column_type(table, column)?;
            names.push(column.as_str());
            placeholders.push(placeholder(ty));
            params.push(bind_value(table, column, ty, value)?);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            names.join(", "),
            placeholders.join(", ")
        );
        {
            let conn = self.lock()?;
            let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
            conn.execute(&sql, param_refs.as_slice())?;
        }

        self.select_rows(table, &Filter::all().eq("id", id.clone()), None)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::persistence(format!("inserted row {} in {} not found", id, table)))
    }

    fn update_rows(&self, table: Table, patch: Row, filter: &Filter) -> Result<usize> {
        if patch.is_empty() {
            return Ok(0);
        }
        let mut assignments = Vec::new();
        let mut params = Vec::new();
        for (column, value) in &patch {
            let ty = column_type(table, column)?;
            assignments.push(format!("{} = {}", column, placeholder(ty)));
            params.push(bind_value(table, column, ty, value)?);
        }
        let (where_sql, where_params) = Self::where_clause(table, filter)?;
        params.extend(where_params);

        let sql = format!("UPDATE {} SET {}{}", table.name(), assignments.join(", "), where_sql);
        let conn = self.lock()?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|b| b.as_ref()).collect();
        Ok(conn.execute(&sql, param_refs.as_slice())?)
    }

    /// Number of rows in a table
    pub fn count(&self, table: Table) -> Result<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}

#[async_trait]
impl BackendStore for DuckDbBackend {
    async fn insert(&self, table: Table, row: Row) -> Result<Row> {
        self.insert_row(table, row)
    }

    async fn select(&self, table: Table, filter: &Filter, order: Option<&Order>) -> Result<Vec<Row>> {
        self.select_rows(table, filter, order)
    }

    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<()> {
        let affected = self.update_rows(table, patch, filter)?;
        tracing::debug!(%table, affected, "updated rows");
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Identity>> {
        let Some(store) = &self.identity else {
            return Ok(None);
        };
        if store.get(keys::SESSION_TOKEN)?.is_none() {
            return Ok(None);
        }
        Ok(store.get(keys::CURRENT_USER_ID)?.map(|id| Identity { id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use serde_json::json;
    use tempfile::tempdir;

    fn row(value: JsonValue) -> Row {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn test_insert_fills_defaults() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        let stored = backend
            .insert(
                Table::Donations,
                row(json!({"campaign_id": "c1", "amount": "500", "payment_method": "card"})),
            )
            .await
            .unwrap();

        assert!(!stored["id"].as_str().unwrap().is_empty());
        assert_eq!(stored["payment_status"], json!("pending"));
        assert_eq!(stored["is_anonymous"], json!(false));
        assert_eq!(stored["amount"], json!("500.00"));
        assert!(stored["created_at"].is_string());
        assert_eq!(stored["donor_id"], JsonValue::Null);
    }

    #[tokio::test]
    async fn test_select_filter_and_order() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        for (title, created) in [("Older", "2024-01-01T00:00:00.000Z"), ("Newer", "2024-02-01T00:00:00.000Z")] {
            backend
                .insert(
                    Table::Campaigns,
                    row(json!({
                        "title": title,
                        "description": "Clean water for the village",
                        "goal_amount": 1000,
                        "category": "Water",
                        "status": "active",
                        "created_at": created,
                    })),
                )
                .await
                .unwrap();
        }
        backend
            .insert(
                Table::Campaigns,
                row(json!({
                    "title": "Closed",
                    "description": "Already finished campaign",
                    "goal_amount": "250.5",
                    "category": "Food",
                    "status": "completed",
                })),
            )
            .await
            .unwrap();

        let active = backend
            .select(
                Table::Campaigns,
                &Filter::all().eq("status", "active"),
                Some(&Order::desc("created_at")),
            )
            .await
            .unwrap();
        let titles: Vec<_> = active.iter().map(|r| r["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);

        let closed = backend
            .select(Table::Campaigns, &Filter::all().eq("goal_amount", "250.50"), None)
            .await
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0]["raised_amount"], json!("0.00"));
    }

    #[tokio::test]
    async fn test_unique_violation_is_already_exists() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        backend
            .insert(Table::NewsletterSubscribers, row(json!({"email": "a@b.com"})))
            .await
            .unwrap();
        let err = backend
            .insert(Table::NewsletterSubscribers, row(json!({"email": "a@b.com"})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_integer_column_rejects_fractions() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        let err = backend
            .insert(Table::Profiles, row(json!({"user_id": "u1", "donation_count": 1.5})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(msg) if msg.contains("profiles.donation_count")));

        let stored = backend
            .insert(Table::Profiles, row(json!({"user_id": "u1", "donation_count": 3})))
            .await
            .unwrap();
        assert_eq!(stored["donation_count"], json!(3));
    }

    #[tokio::test]
    async fn test_unknown_column_rejected() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        let err = backend
            .insert(Table::Volunteers, row(json!({"full_name": "A", "email": "a@b.com", "x; DROP": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));

        let err = backend
            .select(Table::Volunteers, &Filter::all(), Some(&Order::asc("nope")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Persistence(_)));
    }

    #[tokio::test]
    async fn test_update_matching_rows() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        let stored = backend
            .insert(Table::Volunteers, row(json!({"full_name": "Ana", "email": "ana@example.com"})))
            .await
            .unwrap();
        assert_eq!(stored["status"], json!("pending"));

        let id = stored["id"].as_str().unwrap().to_string();
        backend
            .update(
                Table::Volunteers,
                row(json!({"status": "approved"})),
                &Filter::all().eq("id", id.clone()),
            )
            .await
            .unwrap();

        let rows = backend
            .select(Table::Volunteers, &Filter::all().eq("id", id), None)
            .await
            .unwrap();
        assert_eq!(rows[0]["status"], json!("approved"));
    }

    #[tokio::test]
    async fn test_current_user_follows_session_keys() {
        let store = Arc::new(MemoryStore::new());
        let backend = DuckDbBackend::open_in_memory()
            .unwrap()
            .with_identity(store.clone());
        assert_eq!(backend.current_user().await.unwrap(), None);

        store.set(keys::SESSION_TOKEN, "tok").unwrap();
        store.set(keys::CURRENT_USER_ID, "u1").unwrap();
        assert_eq!(
            backend.current_user().await.unwrap(),
            Some(Identity { id: "u1".to_string() })
        );
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("donify.duckdb");
        {
            let backend = DuckDbBackend::open(&path).unwrap();
            backend
                .insert(Table::Profiles, row(json!({"user_id": "u1", "total_donated": 12.5})))
                .await
                .unwrap();
        }
        let backend = DuckDbBackend::open(&path).unwrap();
        assert_eq!(backend.count(Table::Profiles).unwrap(), 1);
        let rows = backend.select(Table::Profiles, &Filter::all(), None).await.unwrap();
        assert_eq!(rows[0]["total_donated"], json!("12.50"));
        assert_eq!(rows[0]["donation_count"], json!(0));
    }

    #[test]
    fn test_migrations_create_every_table() {
        let backend = DuckDbBackend::open_in_memory().unwrap();
        for table in Table::ALL {
            assert_eq!(backend.count(table).unwrap(), 0, "{}", table);
        }
        let rerun = backend.run_migrations().unwrap();
        assert!(rerun.applied.is_empty());
    }
}
