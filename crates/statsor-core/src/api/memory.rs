//! In-process [`RemoteStore`] with Supabase-like semantics.
//!
//! Rows are only visible to the user that owns them (the row-level security
//! rule the hosted project enforces), ids are generated server-side, and
//! inserts with missing required text columns are rejected the way a
//! NOT NULL constraint would reject them. Used by the test suite and by the
//! CLI's offline mode.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::store::{Direction, Query, RemoteStore, Table};
use super::ApiError;

type Row = Map<String, Value>;

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    user: Mutex<Option<String>>,
    select_calls: AtomicUsize,
    write_calls: AtomicUsize,
    fail_next: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor for a store with a signed-in user.
    pub fn signed_in(user_id: &str) -> Self {
        let store = Self::new();
        store.sign_in_as(Some(user_id));
        store
    }

    pub fn sign_in_as(&self, user_id: Option<&str>) {
        *lock(&self.user) = user_id.map(str::to_string);
    }

    /// Number of `select` calls served so far.
    pub fn select_calls(&self) -> usize {
        self.select_calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of insert/update/delete calls served so far.
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(AtomicOrdering::SeqCst)
    }

    /// Make the next call of any kind fail with a server error.
    pub fn fail_next_call(&self) {
        self.fail_next.store(true, AtomicOrdering::SeqCst);
    }

    /// Rows in `table` across all users.
    pub fn row_count(&self, table: Table) -> usize {
        lock(&self.tables).get(&table).map(Vec::len).unwrap_or(0)
    }

    fn take_failure(&self) -> Result<(), ApiError> {
        if self.fail_next.swap(false, AtomicOrdering::SeqCst) {
            return Err(ApiError::ServerError("injected failure".to_string()));
        }
        Ok(())
    }

    fn require_user(&self) -> Result<String, ApiError> {
        lock(&self.user).clone().ok_or(ApiError::Unauthorized)
    }

    fn visible(row: &Row, table: Table, user: &str) -> bool {
        row.get(table.owner_column()).and_then(Value::as_str) == Some(user)
    }

    fn matches(row: &Row, query: &Query) -> bool {
        query.filters.iter().all(|f| {
            row.get(f.column)
                .map(|v| value_text(v) == f.value)
                .unwrap_or(false)
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::String(a)), Some(Value::String(b))) => {
            let parse = |s: &str| DateTime::<FixedOffset>::parse_from_rfc3339(s).ok();
            match (parse(a), parse(b)) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => a.cmp(b),
            }
        }
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        _ => Ordering::Equal,
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn current_user(&self) -> Option<String> {
        lock(&self.user).clone()
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>, ApiError> {
        self.select_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        let Some(user) = lock(&self.user).clone() else {
            return Ok(Vec::new());
        };

        let tables = lock(&self.tables);
        let mut rows: Vec<Row> = tables
            .get(&query.table)
            .map(|rows| {
                rows.iter()
                    .filter(|r| Self::visible(r, query.table, &user) && Self::matches(r, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some((column, direction)) = query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        debug!(table = %query.table, rows = rows.len(), "Memory select");
        Ok(rows.into_iter().map(Value::Object).collect())
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError> {
        self.write_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        let user = self.require_user()?;

        let Value::Object(mut row) = row else {
            return Err(ApiError::Rejected(format!("{} row must be an object", table)));
        };

        for column in table.required_columns() {
            if is_blank(row.get(*column)) {
                return Err(ApiError::Rejected(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    column, table
                )));
            }
        }
        if !Self::visible(&row, table, &user) {
            return Err(ApiError::AccessDenied(format!(
                "new row violates row-level security policy for table \"{}\"",
                table
            )));
        }

        if is_blank(row.get("id")) {
            row.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
        }
        let now = Value::String(Utc::now().to_rfc3339());
        for stamp in ["created_at", "updated_at"] {
            if is_blank(row.get(stamp)) {
                row.insert(stamp.to_string(), now.clone());
            }
        }

        lock(&self.tables)
            .entry(table)
            .or_default()
            .push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError> {
        self.write_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        let user = self.require_user()?;

        let Value::Object(patch) = patch else {
            return Err(ApiError::Rejected("patch must be an object".to_string()));
        };

        let mut tables = lock(&self.tables);
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(&query.table) {
            for row in rows
                .iter_mut()
                .filter(|r| Self::visible(r, query.table, &user) && Self::matches(r, query))
            {
                for (key, value) in &patch {
                    row.insert(key.clone(), value.clone());
                }
                updated.push(Value::Object(row.clone()));
            }
        }
        Ok(updated)
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>, ApiError> {
        self.write_calls.fetch_add(1, AtomicOrdering::SeqCst);
        self.take_failure()?;
        let user = self.require_user()?;

        let mut tables = lock(&self.tables);
        let mut removed = Vec::new();
        if let Some(rows) = tables.get_mut(&query.table) {
            let (gone, kept): (Vec<Row>, Vec<Row>) = rows
                .drain(..)
                .partition(|r| Self::visible(r, query.table, &user) && Self::matches(r, query));
            *rows = kept;
            removed.extend(gone.into_iter().map(Value::Object));
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_id_and_rejects_missing_required() {
        let store = MemoryStore::signed_in("u1");

        let row = store
            .insert(Table::Teams, json!({"name": "Rovers", "owner_id": "u1"}))
            .await
            .expect("insert");
        assert!(row["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(row["created_at"].is_string());

        let err = store
            .insert(Table::Teams, json!({"name": "", "owner_id": "u1"}))
            .await
            .expect_err("blank name rejected");
        assert!(matches!(err, ApiError::Rejected(_)));
        assert_eq!(store.row_count(Table::Teams), 1);
    }

    #[tokio::test]
    async fn test_rows_are_private_to_their_owner() {
        let store = MemoryStore::signed_in("u1");
        let row = store
            .insert(Table::Teams, json!({"name": "Rovers", "owner_id": "u1"}))
            .await
            .expect("insert");
        let id = row["id"].as_str().expect("id").to_string();

        store.sign_in_as(Some("u2"));
        let rows = store.select(&Query::new(Table::Teams)).await.expect("select");
        assert!(rows.is_empty());

        let query = Query::new(Table::Teams).eq("id", id.clone());
        let updated = store
            .update(&query, json!({"name": "Stolen"}))
            .await
            .expect("update");
        assert!(updated.is_empty());
        let deleted = store.delete(&query).await.expect("delete");
        assert!(deleted.is_empty());

        let spoofed = store
            .insert(Table::Teams, json!({"name": "Fake", "owner_id": "u1"}))
            .await;
        assert!(matches!(spoofed, Err(ApiError::AccessDenied(_))));
    }

    #[tokio::test]
    async fn test_select_orders_by_timestamp() {
        let store = MemoryStore::signed_in("u1");
        for (name, created) in [
            ("b", "2026-01-02T00:00:00.5Z"),
            ("a", "2026-01-02T00:00:00Z"),
            ("c", "2026-01-03T00:00:00Z"),
        ] {
            store
                .insert(
                    Table::Teams,
                    json!({"name": name, "owner_id": "u1", "created_at": created}),
                )
                .await
                .expect("insert");
        }

        let rows = store
            .select(&Query::new(Table::Teams).order_by("created_at", Direction::Ascending))
            .await
            .expect("select");
        let names: Vec<&str> = rows.iter().filter_map(|r| r["name"].as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let first = store
            .select(
                &Query::new(Table::Teams)
                    .order_by("created_at", Direction::Descending)
                    .limit(1),
            )
            .await
            .expect("select");
        assert_eq!(first[0]["name"], "c");
    }

    #[tokio::test]
    async fn test_fail_next_call_is_one_shot() {
        let store = MemoryStore::signed_in("u1");
        store.fail_next_call();
        assert!(store.select(&Query::new(Table::Players)).await.is_err());
        assert!(store.select(&Query::new(Table::Players)).await.is_ok());
        assert_eq!(store.select_calls(), 2);
    }
}
