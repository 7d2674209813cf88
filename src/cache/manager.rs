//! Cache manager for persisting API responses to disk
//!
//! Provides a `CacheManager` that stores JSON payloads in one file per key with
//! expiry timestamps. Reads never fail: unreadable or malformed entries are
//! treated as misses and removed. Writes never fail either; caching is best-effort.

use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Fallback cache directory when no XDG cache location is available
const FALLBACK_CACHE_DIR: &str = ".f1_cache";

/// Extension used for cache entry files
const ENTRY_EXTENSION: &str = "json";

/// Extension of in-flight writes, left behind if the process dies mid-write
const TEMP_EXTENSION: &str = "tmp";

/// Distinguishes temporary files written concurrently by the same process
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Wrapper struct for cached data stored on disk
///
/// Only `data` and `expires_at` are required when reading an entry back.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    /// The cached payload
    data: Value,
    /// When the data was cached
    #[serde(default)]
    cached_at: DateTime<Utc>,
    /// When the cache entry expires
    expires_at: DateTime<Utc>,
    /// Time-to-live in seconds, as requested by the writer
    #[serde(default)]
    ttl: i64,
}

/// Result of reading from cache, including metadata about cache freshness
#[derive(Debug, Clone, PartialEq)]
pub struct CachedData {
    /// The cached payload
    pub data: Value,
    /// When the data was originally cached
    pub cached_at: DateTime<Utc>,
    /// When the entry stops being served as fresh
    pub expires_at: DateTime<Utc>,
    /// Whether the cache entry has expired
    pub is_expired: bool,
}

/// Manages reading and writing cached data to disk
///
/// Entries live as `<sanitized key>.json` files in the cache directory. Expired
/// entries stay on disk until overwritten or cleared so they can serve as a
/// fallback when the API is unavailable.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// Directory where cache files are stored
    cache_dir: PathBuf,
    /// False when the directory could not be created
    enabled: bool,
}

impl CacheManager {
    /// Creates a cache manager rooted at `cache_dir`, creating the directory.
    ///
    /// If the directory cannot be created the manager is returned disabled:
    /// every read misses and every write is a no-op.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        let cache_dir = cache_dir.into();
        let enabled = match fs::create_dir_all(&cache_dir) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    dir = %cache_dir.display(),
                    error = %e,
                    "failed to create cache directory, caching disabled"
                );
                false
            }
        };
        Self { cache_dir, enabled }
    }

    /// Returns the XDG-compliant cache directory (`~/.cache/f1cast/` on Linux)
    ///
    /// Falls back to `.f1_cache` in the working directory when no home
    /// directory can be determined.
    pub fn default_dir() -> PathBuf {
        ProjectDirs::from("", "", "f1cast")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_DIR))
    }

    /// Whether the backing directory is usable
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Directory holding the cache files
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the path to a cache file for the given key
    fn cache_path(&self, key: &str) -> PathBuf {
        self.cache_dir
            .join(format!("{}.{}", sanitize_key(key), ENTRY_EXTENSION))
    }

    /// Reads the entry for `key`
    ///
    /// Returns `None` when the entry is missing, corrupt, or expired. Expired
    /// entries are returned (with `is_expired = true`) only when
    /// `allow_expired` is set. Corrupt entries are deleted as a side effect.
    pub fn get(&self, key: &str, allow_expired: bool) -> Option<CachedData> {
        if !self.enabled {
            return None;
        }

        let path = self.cache_path(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                self.purge(key, &path, &e.to_string());
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                self.purge(key, &path, &e.to_string());
                return None;
            }
        };

        if entry.data.is_null() {
            self.purge(key, &path, "entry has no data");
            return None;
        }

        let is_expired = Utc::now() > entry.expires_at;
        if is_expired && !allow_expired {
            debug!(key, expires_at = %entry.expires_at, "cache entry expired");
            return None;
        }

        Some(CachedData {
            data: entry.data,
            cached_at: entry.cached_at,
            expires_at: entry.expires_at,
            is_expired,
        })
    }

    /// Writes `data` under `key`, replacing any previous entry
    ///
    /// The entry is written to a temporary file and renamed into place, so
    /// readers never observe a partially written file. Failures are logged
    /// and otherwise ignored.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, data: &T, ttl: Duration) {
        if !self.enabled {
            return;
        }

        if let Err(e) = self.try_set(key, data, ttl) {
            warn!(key, error = %e, "failed to write cache entry");
        }
    }

    fn try_set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        data: &T,
        ttl: Duration,
    ) -> std::io::Result<()> {
        let data = serde_json::to_value(data)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        let now = Utc::now();
        let entry = CacheEntry {
            data,
            cached_at: now,
            expires_at: now + ttl,
            ttl: ttl.num_seconds(),
        };

        let json = serde_json::to_string_pretty(&entry)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, e))?;

        let destination = self.cache_path(key);
        let temp = self.cache_dir.join(format!(
            ".{}.{}.{}.{}",
            sanitize_key(key),
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
            TEMP_EXTENSION
        ));

        fs::write(&temp, json)?;
        if let Err(e) = fs::rename(&temp, &destination) {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        debug!(key, ttl_secs = entry.ttl, "cache entry written");
        Ok(())
    }

    /// True iff an entry exists, is well-formed, and has not expired
    pub fn is_valid(&self, key: &str) -> bool {
        self.get(key, false).is_some()
    }

    /// Removes every cache entry, including orphaned temporary files
    ///
    /// Individual deletion failures are logged and skipped.
    pub fn clear(&self) {
        if !self.enabled {
            return;
        }

        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.cache_dir.display(), error = %e, "failed to list cache directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let extension = path.extension().and_then(|ext| ext.to_str());
            if extension != Some(ENTRY_EXTENSION) && extension != Some(TEMP_EXTENSION) {
                continue;
            }
            if let Err(e) = fs::remove_file(&path) {
                warn!(path = %path.display(), error = %e, "failed to remove cache entry");
            }
        }
    }

    /// Deletes a corrupt entry; deletion errors are ignored
    fn purge(&self, key: &str, path: &Path, reason: &str) {
        warn!(key, reason, "corrupted cache entry, removing");
        if let Err(e) = fs::remove_file(path) {
            if e.kind() != ErrorKind::NotFound {
                debug!(key, error = %e, "failed to remove corrupted cache entry");
            }
        }
    }
}

/// Converts a cache key into a filesystem-safe file stem
///
/// Path separators, colons and the escape character itself are
/// percent-encoded, which keeps the mapping injective.
pub fn sanitize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '%' => out.push_str("%25"),
            '/' => out.push_str("%2F"),
            ':' => out.push_str("%3A"),
            '\\' => out.push_str("%5C"),
            _ => out.push(c),
        }
    }
    out
}
