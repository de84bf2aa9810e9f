//! Remote store access.
//!
//! This module provides the `RemoteStore` port that every repository talks
//! to, and two implementations:
//!
//! - `SupabaseClient`: the hosted project over HTTP (PostgREST + GoTrue)
//! - `MemoryStore`: an in-process store with the same scoping rules
//!
//! All table access is implicitly scoped to the signed-in user by the
//! store's row-level security.

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::SupabaseClient;
pub use error::ApiError;
pub use memory::MemoryStore;
pub use store::{Direction, Filter, Query, RemoteStore, Table};
