//! Statsor core - data access for a football club management app.
//!
//! Players, teams and matches live in a hosted Supabase project, one set of
//! rows per signed-in user. This crate wraps that store behind a
//! [`DataService`] that caches reads, keeps subscribers in sync after writes
//! and reports outcomes through a [`NoticeSink`].

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod models;
pub mod service;
pub mod transfer;
pub mod utils;

pub use api::{ApiError, MemoryStore, RemoteStore, SupabaseClient};
pub use config::Config;
pub use service::{DataError, DataService, Notice, NoticeLevel, NoticeSink};
pub use transfer::{ExportDocument, ImportReport};
