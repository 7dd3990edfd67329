//! Durable on-disk page cache.
//!
//! Each source site gets its own cache root; within a root, a key is a
//! file name and the stored value is the raw document text. Presence
//! alone means "fresh enough": entries never expire and are only
//! bypassed by an explicit force-refresh.
//!
//! The crawl is single-threaded, so reads and writes need no
//! coordination. A run never writes the same key twice: once written,
//! the next lookup hits the cache.

use std::io;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// On-disk store mapping cache keys to previously fetched documents.
#[derive(Debug, Clone)]
pub struct PageCache {
    root: PathBuf,
}

impl PageCache {
    /// Create a cache rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The file path backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    /// Read the cached body for `key`, if present.
    pub async fn read(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path).await {
            Ok(body) => Some(body),
            Err(e) => {
                if e.kind() != io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "Cache read failed");
                }
                None
            }
        }
    }

    /// Store `body` under `key`, creating any missing parent directories.
    pub async fn write(&self, key: &str, body: &str) -> io::Result<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, body).await?;
        debug!(path = %path.display(), bytes = body.len(), "Cache entry written");
        Ok(())
    }
}
