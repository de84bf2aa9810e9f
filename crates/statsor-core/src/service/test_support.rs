//! Shared fixtures for service tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::api::{ApiError, MemoryStore, Query, RemoteStore, Table};

use super::{DataService, NoticeLog};

pub(crate) struct Harness {
    pub service: DataService,
    pub store: Arc<MemoryStore>,
    pub notices: Arc<NoticeLog>,
}

pub(crate) fn harness(user: Option<&str>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    store.sign_in_as(user);
    let notices = Arc::new(NoticeLog::new());
    let service = DataService::new(store.clone()).with_notices(notices.clone());
    Harness {
        service,
        store,
        notices,
    }
}

/// A `MemoryStore` whose next select can be held after reading its rows,
/// and whose inserts can echo back a row that no model decodes.
pub(crate) struct GatedStore {
    pub inner: MemoryStore,
    hold_next_select: AtomicBool,
    select_entered: Notify,
    select_released: Notify,
    garble_inserts: AtomicBool,
}

impl GatedStore {
    pub fn signed_in(user_id: &str) -> Self {
        Self {
            inner: MemoryStore::signed_in(user_id),
            hold_next_select: AtomicBool::new(false),
            select_entered: Notify::new(),
            select_released: Notify::new(),
            garble_inserts: AtomicBool::new(false),
        }
    }

    pub fn hold_next_select(&self) {
        self.hold_next_select.store(true, Ordering::SeqCst);
    }

    /// Resolves once the held select has read its rows.
    pub async fn select_entered(&self) {
        self.select_entered.notified().await;
    }

    pub fn release_select(&self) {
        self.select_released.notify_one();
    }

    pub fn garble_inserts(&self) {
        self.garble_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn current_user(&self) -> Option<String> {
        self.inner.current_user().await
    }

    async fn select(&self, query: &Query) -> Result<Vec<Value>, ApiError> {
        let rows = self.inner.select(query).await?;
        if self.hold_next_select.swap(false, Ordering::SeqCst) {
            self.select_entered.notify_one();
            self.select_released.notified().await;
        }
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, ApiError> {
        let mut stored = self.inner.insert(table, row).await?;
        if self.garble_inserts.load(Ordering::SeqCst) {
            stored["created_at"] = Value::String("not a timestamp".to_string());
        }
        Ok(stored)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>, ApiError> {
        self.inner.update(query, patch).await
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>, ApiError> {
        self.inner.delete(query).await
    }
}
