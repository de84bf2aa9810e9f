//! Query caching module.
//!
//! This module provides the `QueryCache` that repositories consult before
//! every read. Entries are held in memory only and expire after a fixed
//! time-to-live (five minutes unless configured otherwise). Any successful
//! write clears the whole cache.

pub mod manager;

pub use manager::{CachedData, QueryCache, DEFAULT_TTL_MINUTES};
