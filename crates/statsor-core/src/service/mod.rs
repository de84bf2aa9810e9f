//! Repositories over the remote store.
//!
//! `DataService` is the one object the rest of the application talks to.
//! It is built once at start-up around a [`RemoteStore`] and owns the query
//! cache, the change subscribers and the notice sink. Every operation is
//! scoped to the signed-in user.
//!
//! Reads go through the cache. Every successful write clears the whole
//! cache, emits a notice and re-publishes the affected list to its
//! subscribers.

pub mod club;
pub mod error;
pub mod matches;
pub mod notices;
pub mod players;
pub mod subscribers;
pub mod teams;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, Direction, Query, RemoteStore, Table};
use crate::cache::QueryCache;
use crate::models::{Match, Player, Team};

pub use error::DataError;
pub use notices::{Notice, NoticeLevel, NoticeLog, NoticeSink, TracingNotices};
pub use subscribers::{Subscribers, SubscriptionId};

/// Singular label used in notices and errors.
pub(crate) fn label(table: Table) -> &'static str {
    match table {
        Table::Players => "player",
        Table::Teams => "team",
        Table::Matches => "match",
    }
}

fn capitalized(table: Table) -> &'static str {
    match table {
        Table::Players => "Player",
        Table::Teams => "Team",
        Table::Matches => "Match",
    }
}

/// Remove the columns a caller may never write through an update and stamp
/// `updated_at`.
pub(crate) fn prepare_patch(table: Table, patch: Value) -> Result<Value, DataError> {
    let Value::Object(mut fields) = patch else {
        return Err(DataError::Validation(format!(
            "{} update must be an object",
            label(table)
        )));
    };
    fields.remove("id");
    fields.remove("created_at");
    fields.remove(table.owner_column());
    fields.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
    Ok(Value::Object(fields))
}

/// Stamp ownership and both timestamps onto an insert payload.
fn stamp_new_row(table: Table, row: Value, user_id: &str) -> Result<Value, DataError> {
    let Value::Object(mut fields) = row else {
        return Err(DataError::Validation(format!(
            "{} must be an object",
            label(table)
        )));
    };
    let now = Value::String(Utc::now().to_rfc3339());
    fields.remove("id");
    fields.insert(
        table.owner_column().to_string(),
        Value::String(user_id.to_string()),
    );
    fields.insert("created_at".to_string(), now.clone());
    fields.insert("updated_at".to_string(), now);
    Ok(Value::Object(fields))
}

fn decode<T: DeserializeOwned>(table: Table, row: Value) -> Result<T, DataError> {
    serde_json::from_value(row).map_err(|e| {
        error!(table = %table, error = %e, "Failed to decode row");
        DataError::Serialization(e)
    })
}

fn decode_rows<T: DeserializeOwned>(table: Table, rows: Vec<Value>) -> Result<Vec<T>, DataError> {
    rows.into_iter().map(|row| decode(table, row)).collect()
}

pub struct DataService {
    store: Arc<dyn RemoteStore>,
    cache: QueryCache,
    notices: Arc<dyn NoticeSink>,
    /// User whose rows are currently cached.
    cache_owner: Mutex<Option<String>>,
    player_subscribers: Subscribers<Player>,
    team_subscribers: Subscribers<Team>,
    match_subscribers: Subscribers<Match>,
}

impl DataService {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            cache: QueryCache::default(),
            notices: Arc::new(TracingNotices),
            cache_owner: Mutex::new(None),
            player_subscribers: Subscribers::default(),
            team_subscribers: Subscribers::default(),
            match_subscribers: Subscribers::default(),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.cache = QueryCache::new(ttl);
        self
    }

    pub fn with_notices(mut self, notices: Arc<dyn NoticeSink>) -> Self {
        self.notices = notices;
        self
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Drop every cached query result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub(crate) fn notify(&self, notice: Notice) {
        self.notices.notify(notice);
    }

    /// The signed-in user, clearing the cache if it belongs to someone else.
    pub(crate) async fn current_user(&self) -> Option<String> {
        let user = self.store.current_user().await;
        let mut owner = self.cache_owner.lock().unwrap_or_else(PoisonError::into_inner);
        if *owner != user {
            if owner.is_some() {
                info!("Signed-in user changed, clearing cache");
            }
            self.cache.clear();
            *owner = user.clone();
        }
        user
    }

    fn remote_failure(&self, table: Table, action: &str, err: ApiError) -> DataError {
        error!(table = %table, action, error = %err, "Remote store call failed");
        self.notify(Notice::error(format!(
            "Failed to {} {}: {}",
            action,
            label(table),
            err
        )));
        DataError::Remote(err)
    }

    // ===== Shared repository operations =====

    /// List rows owned by the current user, optionally narrowed to one
    /// `(column, value)` scope. Signed-out callers get an empty list.
    pub(crate) async fn list_rows<T>(
        &self,
        table: Table,
        cache_kind: &str,
        scope: Option<(&'static str, &str)>,
        order: Direction,
    ) -> Result<Vec<T>, DataError>
    where
        T: DeserializeOwned + Serialize,
    {
        let Some(user) = self.current_user().await else {
            debug!(table = %table, "Not signed in, returning empty list");
            return Ok(Vec::new());
        };

        let key = QueryCache::key(cache_kind, scope.map(|(_, id)| id));
        if let Some(hit) = self.cache.get::<Vec<T>>(&key) {
            return Ok(hit);
        }

        // A write that lands while this select is in flight clears the cache;
        // rows read before it must not be stored afterwards.
        let generation = self.cache.generation();
        let mut query = Query::new(table)
            .owned_by(&user)
            .order_by("created_at", order);
        if let Some((column, value)) = scope {
            query = query.eq(column, value);
        }

        let rows = self
            .store
            .select(&query)
            .await
            .map_err(|e| self.remote_failure(table, "load", e))?;
        let items: Vec<T> = decode_rows(table, rows)?;

        debug!(table = %table, key = %key, count = items.len(), "Loaded from store");
        self.cache.set_if_current(&key, &items, generation);
        Ok(items)
    }

    /// Fetch one row by id. Absent rows and signed-out callers give `None`.
    pub(crate) async fn fetch_row<T: DeserializeOwned>(
        &self,
        table: Table,
        id: &str,
    ) -> Result<Option<T>, DataError> {
        if id.trim().is_empty() {
            return Ok(None);
        }
        let Some(user) = self.current_user().await else {
            return Ok(None);
        };

        let query = Query::new(table).eq("id", id).owned_by(&user).limit(1);
        let rows = self
            .store
            .select(&query)
            .await
            .map_err(|e| self.remote_failure(table, "load", e))?;
        rows.into_iter().next().map(|row| decode(table, row)).transpose()
    }

    /// Insert a new row for the current user. `quiet` suppresses the
    /// success notice (bulk import reports once at the end).
    ///
    /// Once the store has committed the row the write counts as done: the
    /// cache is cleared, and a row that cannot be read back comes out as
    /// [`DataError::Unreadable`] carrying the stored id.
    pub(crate) async fn insert_row<N, T>(
        &self,
        table: Table,
        new: &N,
        quiet: bool,
    ) -> Result<T, DataError>
    where
        N: Serialize,
        T: DeserializeOwned,
    {
        let Some(user) = self.current_user().await else {
            warn!(table = %table, "Insert attempted while signed out");
            self.notify(Notice::error(format!(
                "Please sign in to add a {}",
                label(table)
            )));
            return Err(DataError::Unauthenticated);
        };

        let row = stamp_new_row(table, serde_json::to_value(new)?, &user)?;
        let stored = self
            .store
            .insert(table, row)
            .await
            .map_err(|e| self.remote_failure(table, "add", e))?;

        self.cache.clear();
        let id = stored
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        info!(table = %table, id = %id, "Row added");

        match serde_json::from_value(stored) {
            Ok(item) => {
                if !quiet {
                    self.notify(Notice::success(format!("{} added", capitalized(table))));
                }
                Ok(item)
            }
            Err(source) => {
                error!(table = %table, id = %id, error = %source, "Stored row could not be read back");
                if !quiet {
                    self.notify(Notice::info(format!(
                        "{} added but could not be displayed",
                        capitalized(table)
                    )));
                }
                Err(DataError::Unreadable {
                    entity: label(table),
                    id,
                    source,
                })
            }
        }
    }

    /// Apply a partial update to a row the current user owns. Zero rows
    /// affected is a failure.
    pub(crate) async fn update_row<P, T>(
        &self,
        table: Table,
        id: &str,
        patch: &P,
    ) -> Result<T, DataError>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        if id.trim().is_empty() {
            self.notify(Notice::error(format!(
                "Cannot update {}: missing id",
                label(table)
            )));
            return Err(DataError::Validation(format!(
                "{} id is required for update",
                label(table)
            )));
        }
        let Some(user) = self.current_user().await else {
            self.notify(Notice::error(format!(
                "Please sign in to update a {}",
                label(table)
            )));
            return Err(DataError::Unauthenticated);
        };

        let patch = prepare_patch(table, serde_json::to_value(patch)?)?;
        let query = Query::new(table).eq("id", id).owned_by(&user);
        let rows = self
            .store
            .update(&query, patch)
            .await
            .map_err(|e| self.remote_failure(table, "update", e))?;

        let Some(row) = rows.into_iter().next() else {
            warn!(table = %table, id, "Update matched no rows");
            self.notify(Notice::error(format!(
                "{} not found or not yours to update",
                capitalized(table)
            )));
            return Err(DataError::NotFound {
                entity: label(table),
                id: id.to_string(),
            });
        };

        self.cache.clear();
        info!(table = %table, id, "Row updated");
        self.notify(Notice::success(format!("{} updated", capitalized(table))));
        decode(table, row)
    }

    /// Delete a row the current user owns. Returns whether a row was removed.
    pub(crate) async fn delete_row(&self, table: Table, id: &str) -> Result<bool, DataError> {
        if id.trim().is_empty() {
            return Err(DataError::Validation(format!(
                "{} id is required for delete",
                label(table)
            )));
        }
        let Some(user) = self.current_user().await else {
            self.notify(Notice::error(format!(
                "Please sign in to delete a {}",
                label(table)
            )));
            return Err(DataError::Unauthenticated);
        };

        let query = Query::new(table).eq("id", id).owned_by(&user);
        let removed = self
            .store
            .delete(&query)
            .await
            .map_err(|e| self.remote_failure(table, "delete", e))?;

        if removed.is_empty() {
            debug!(table = %table, id, "Delete matched no rows");
            return Ok(false);
        }

        self.cache.clear();
        info!(table = %table, id, "Row deleted");
        self.notify(Notice::success(format!("{} deleted", capitalized(table))));
        Ok(true)
    }

    /// Re-publish every list that has subscribers.
    pub(crate) async fn publish_all(&self) {
        self.publish_players().await;
        self.publish_teams().await;
        self.publish_matches().await;
    }
}
