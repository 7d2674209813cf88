//! Cache module for storing API responses to disk
//!
//! This module provides a cache manager that persists API responses to the filesystem
//! with per-entry TTL values. Expired entries remain readable on request, allowing the
//! fetcher to fall back to stale data when the API is unavailable.

mod manager;

pub use manager::{sanitize_key, CacheManager, CachedData};
