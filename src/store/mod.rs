//! Generic table access against the hosted data store.
//!
//! Every durable entity lives in remote tables reached through a small set
//! of CRUD calls plus named remote procedures. Query shaping is expressed
//! with [`Query`], which renders to the REST filter syntax for the hosted
//! backend and is evaluated directly by the in-memory store.

pub mod memory;
pub mod rest;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

pub use memory::MemoryStore;
pub use rest::RestStore;

/// A single table row as returned by the store
pub type Row = serde_json::Map<String, Value>;

/// Table names used by the application
pub mod tables {
    pub const PROFILES: &str = "profiles";
    pub const AGENT_PROFILES: &str = "agent_profiles";
    pub const BOOKINGS: &str = "bookings";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const ACTIVITY_LOG: &str = "activity_log";
    pub const COMPLAINTS: &str = "complaints";
    pub const FEEDBACK: &str = "feedback";
    pub const AGENT_REQUESTS: &str = "agent_requests";
    pub const TOURIST_PLACES: &str = "tourist_places";
    pub const PLACES: &str = "places";
    pub const LISTINGS: &str = "listings";
}

/// Remote procedure that approves or rejects an agent application.
/// Authorization is enforced server-side.
pub const ADMIN_SET_AGENT_STATUS: &str = "admin_set_agent_status";

/// Errors raised by a table store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Remote error ({status}): {message}")]
    Remote {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Invalid row: {0}")]
    Decode(String),

    #[error("Unknown remote function: {0}")]
    UnknownFunction(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// A single column predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, value: String },
    IsNull { column: String },
}

impl Filter {
    pub fn eq(column: &str, value: impl ToString) -> Self {
        Filter::Eq {
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Filter::IsNull {
            column: column.to_string(),
        }
    }

    /// Evaluate the predicate against a row
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq { column, value } => match row.get(column) {
                None | Some(Value::Null) => false,
                Some(found) => value_text(found) == *value,
            },
            Filter::IsNull { column } => matches!(row.get(column), None | Some(Value::Null)),
        }
    }

    fn column(&self) -> &str {
        match self {
            Filter::Eq { column, .. } | Filter::IsNull { column } => column,
        }
    }

    fn operator(&self) -> String {
        match self {
            Filter::Eq { value, .. } => format!("eq.{}", value),
            Filter::IsNull { .. } => "is.null".to_string(),
        }
    }
}

/// Sort instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Fluent description of which rows a call applies to.
///
/// All plain filters must match; each `or` group must have at least one
/// matching alternative.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    filters: Vec<Filter>,
    any_of: Vec<Vec<Filter>>,
    order: Option<Order>,
    limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::is_null(column));
        self
    }

    pub fn or(mut self, alternatives: Vec<Filter>) -> Self {
        if !alternatives.is_empty() {
            self.any_of.push(alternatives);
        }
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Newest rows first, the ordering every list view uses
    pub fn newest_first(self) -> Self {
        self.order("created_at", false)
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
            && self
                .any_of
                .iter()
                .all(|group| group.iter().any(|f| f.matches(row)))
    }

    /// Filter, sort and truncate rows in process
    pub fn apply(&self, rows: impl IntoIterator<Item = Row>) -> Vec<Row> {
        let mut selected: Vec<Row> = rows.into_iter().filter(|r| self.matches(r)).collect();

        if let Some(order) = &self.order {
            selected.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }

        selected
    }

    /// Render as REST query parameters
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|f| (f.column().to_string(), f.operator()))
            .collect();

        for group in &self.any_of {
            let terms: Vec<String> = group
                .iter()
                .map(|f| format!("{}.{}", f.column(), f.operator()))
                .collect();
            params.push(("or".to_string(), format!("({})", terms.join(","))));
        }

        if let Some(order) = &self.order {
            let direction = if order.ascending { "asc" } else { "desc" };
            params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
        }

        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        params
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Nulls sort last in ascending order
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(x), Some(y)) => value_text(x).cmp(&value_text(y)),
    }
}

/// CRUD access to named tables plus remote procedure calls
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Insert rows and return them as stored
    async fn insert(&self, table: &str, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Apply `patch` to every matching row and return the updated rows
    async fn update(&self, table: &str, patch: Row, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Delete matching rows, returning how many were removed
    async fn delete(&self, table: &str, query: &Query) -> Result<usize, StoreError>;

    async fn rpc(&self, function: &str, args: Value) -> Result<Value, StoreError>;
}

/// Serialize a value that must be a JSON object into a row
pub fn to_row<T: Serialize>(value: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!("expected an object, got {}", other))),
    }
}

/// Decode rows into typed records
pub fn from_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(Value::Object(row)).map_err(StoreError::from))
        .collect()
}
