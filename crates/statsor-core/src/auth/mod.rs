//! Authentication state for the Supabase project.
//!
//! This module provides:
//! - `Session`: access/refresh token pair persisted between runs
//! - `CredentialStore`: remembered passwords via the OS keyring
//!
//! Sign-in itself happens in [`crate::api::SupabaseClient`].

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{Session, SessionData};
