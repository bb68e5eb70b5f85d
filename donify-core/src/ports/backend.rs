//! Backend store port - row-oriented table access
//!
//! Campaigns, donations and the outreach tables live in a backend store
//! (a hosted REST service in production, DuckDB locally). The core only
//! needs four primitives: insert, select, update and the current identity.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::domain::result::{Error, Result};

/// A single row: column name to JSON value
pub type Row = Map<String, JsonValue>;

/// Tables exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Campaigns,
    Donations,
    Volunteers,
    NewsletterSubscribers,
    Profiles,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Campaigns,
        Table::Donations,
        Table::Volunteers,
        Table::NewsletterSubscribers,
        Table::Profiles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Campaigns => "campaigns",
            Table::Donations => "donations",
            Table::Volunteers => "volunteers",
            Table::NewsletterSubscribers => "newsletter_subscribers",
            Table::Profiles => "profiles",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Conjunction of equality predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<(String, JsonValue)>,
}

impl Filter {
    /// Match every row
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a `column = value` predicate
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.predicates.push((column.into(), value.into()));
        self
    }

    pub fn predicates(&self) -> &[(String, JsonValue)] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Ordering of a select
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// The authenticated principal as seen by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
}

/// Backend store abstraction
///
/// Implementations map a uniqueness violation on insert to
/// [`Error::AlreadyExists`] and an authentication failure to
/// [`Error::SessionExpired`]; everything else is [`Error::Persistence`].
#[async_trait]
pub trait BackendStore: Send + Sync {
    /// Insert a row and return it as stored (with defaults filled in)
    async fn insert(&self, table: Table, row: Row) -> Result<Row>;

    /// Select rows matching every predicate of `filter`
    async fn select(&self, table: Table, filter: &Filter, order: Option<&Order>) -> Result<Vec<Row>>;

    /// Apply `patch` to every row matching `filter`
    async fn update(&self, table: Table, patch: Row, filter: &Filter) -> Result<()>;

    /// The identity the backend associates with the caller, if any
    async fn current_user(&self) -> Result<Option<Identity>>;
}

/// Convert a typed record into a row
pub fn to_row<T: Serialize>(value: &T) -> Result<Row> {
    match serde_json::to_value(value)? {
        JsonValue::Object(map) => Ok(map),
        other => Err(Error::Other(format!("expected an object row, got {}", other))),
    }
}

/// Convert a row into a typed record
pub fn from_row<T: DeserializeOwned>(row: Row) -> Result<T> {
    Ok(serde_json::from_value(JsonValue::Object(row))?)
}

/// Convert a list of rows into typed records
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>> {
    rows.into_iter().map(from_row).collect()
}
