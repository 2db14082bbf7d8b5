use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppResult;

use super::user::User;

const USER_ENTRY: &str = "user.json";
const GUEST_ENTRY: &str = "guest_user.json";

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    user: User,
    cached_at: DateTime<Utc>,
}

/// Local persistence for the resolved user: two string-keyed entries under the
/// data directory, one for the provider-derived user and one for the guest
/// marker. Read at startup, overwritten atomically on each resolved-state
/// change, cleared on logout.
#[derive(Debug, Clone)]
pub struct LocalCache {
    dir: PathBuf,
}

impl LocalCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalCache { dir: dir.into() }
    }

    pub fn load_user(&self) -> Option<User> {
        self.load(USER_ENTRY)
    }

    pub fn store_user(&self, user: &User) -> AppResult<()> {
        self.store(USER_ENTRY, user)
    }

    pub fn clear_user(&self) {
        self.clear(USER_ENTRY)
    }

    pub fn load_guest(&self) -> Option<User> {
        self.load(GUEST_ENTRY)
    }

    pub fn store_guest(&self, user: &User) -> AppResult<()> {
        self.store(GUEST_ENTRY, user)
    }

    pub fn clear_guest(&self) {
        self.clear(GUEST_ENTRY)
    }

    fn path(&self, entry: &str) -> PathBuf {
        self.dir.join(entry)
    }

    fn load(&self, entry: &str) -> Option<User> {
        let p = self.path(entry);
        if !p.exists() {
            return None;
        }
        let text = fs::read_to_string(&p).ok()?;
        match serde_json::from_str::<CacheEntry>(&text) {
            Ok(e) => Some(e.user),
            Err(err) => {
                // A corrupt entry is dropped, never fatal.
                tracing::warn!("unreadable cache entry {}: {}", p.display(), err);
                self.clear(entry);
                None
            }
        }
    }

    fn store(&self, entry: &str, user: &User) -> AppResult<()> {
        let p = self.path(entry);
        let payload = CacheEntry { user: user.clone(), cached_at: Utc::now() };
        write_atomic(&p, &serde_json::to_vec_pretty(&payload).map_err(|e| {
            crate::error::AppError::unexpected("cache_encode_failed", e.to_string())
        })?)
        .map_err(|e| crate::error::AppError::unexpected("cache_write_failed", e.to_string()))
    }

    fn clear(&self, entry: &str) {
        let p = self.path(entry);
        if p.exists() {
            if let Err(e) = fs::remove_file(&p) {
                tracing::warn!("failed to clear cache entry {}: {}", p.display(), e);
            }
        }
    }
}

/// Write via a sibling temp file and rename so readers never observe a
/// half-written entry.
fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
