//! The remote store port.
//!
//! Repositories never talk HTTP directly. They build a [`Query`] and hand
//! it to a [`RemoteStore`], which is either the hosted Supabase project
//! ([`super::SupabaseClient`]) or the in-process [`super::MemoryStore`].
//! Rows cross this boundary as JSON objects, the same shape PostgREST
//! returns.

use async_trait::async_trait;
use serde_json::Value;

use super::ApiError;

/// Tables the data layer reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Players,
    Teams,
    Matches,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Players => "players",
            Table::Teams => "teams",
            Table::Matches => "matches",
        }
    }

    /// Column holding the owning user's id.
    pub fn owner_column(&self) -> &'static str {
        match self {
            Table::Teams => "owner_id",
            Table::Players | Table::Matches => "user_id",
        }
    }

    /// Text columns that must be present and non-empty on insert.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Table::Players => &["name", "position"],
            Table::Teams => &["name"],
            Table::Matches => &["opponent_name", "match_date"],
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// An equality filter on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: &'static str,
    pub value: String,
}

/// A table-scoped query: equality filters, optional ordering and limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<(&'static str, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            column,
            value: value.into(),
        });
        self
    }

    /// Restrict to rows owned by `user_id`.
    pub fn owned_by(self, user_id: &str) -> Self {
        let column = self.table.owner_column();
        self.eq(column, user_id)
    }

    pub fn order_by(mut self, column: &'static str, direction: Direction) -> Self {
        self.order = Some((column, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render as PostgREST query-string pairs.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        for filter in &self.filters {
            params.push((filter.column.to_string(), format!("eq.{}", filter.value)));
        }
        if let Some((column, direction)) = self.order {
            let dir = match direction {
                Direction::Ascending => "asc",
                Direction::Descending => "desc",
            };
            params.push(("order".to_string(), format!("{}.{}", column, dir)));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Authenticated, table-scoped CRUD against the system of record.
///
/// `update` and `delete` return the affected rows so callers can tell a
/// matched write from one that touched nothing.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Id of the signed-in user, if any.
    async fn current_user(&self) -> Option<String>;

    async fn select(&self, query: &Query) -> Result<Vec<Value>, ApiError>;

    /// Insert one row and return it as stored.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError>;

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError>;

    async fn delete(&self, query: &Query) -> Result<Vec<Value>, ApiError>;
}
