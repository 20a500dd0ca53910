pub mod store;
pub mod watcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::watch;

use crate::config::resolve_tag_path;
use crate::error::{Result, TagError};
use crate::tags::{TagFileParser, TagRecord};

pub use store::{IndexStore, LatestCell};
pub use watcher::{TagFileWatcher, WatchRegistry};

/// Immutable view of a parsed tag file.
///
/// Searches always run against one snapshot, so a reload never exposes a
/// half-updated record set.
#[derive(Debug, Clone)]
pub struct TagSnapshot {
    pub records: Arc<[TagRecord]>,
    /// Tag file the records were read from
    pub source: PathBuf,
    /// Malformed lines skipped during the parse
    pub skipped: usize,
    pub loaded_at: SystemTime,
}

impl TagSnapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads tag files into the shared [`IndexStore`].
#[derive(Debug, Clone)]
pub struct TagIndex {
    store: Arc<IndexStore>,
}

impl Default for TagIndex {
    fn default() -> Self {
        Self::new(Arc::new(IndexStore::new()))
    }
}

impl TagIndex {
    pub fn new(store: Arc<IndexStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Returns the cached snapshot for `root`, or reads `tag_path` when no
    /// entry exists or `force` is set. A successful read replaces the entry.
    pub async fn load(&self, root: &Path, tag_path: &Path, force: bool) -> Result<TagSnapshot> {
        if !force {
            if let Some(snapshot) = self.store.get(root) {
                tracing::debug!("Tag cache hit for {}", root.display());
                return Ok(snapshot);
            }
        }

        let path = resolve_tag_path(root, tag_path);
        let parser = TagFileParser::new(root);
        let source = path.clone();
        let outcome = tokio::task::spawn_blocking(move || parser.parse_file(&source))
            .await
            .map_err(|e| TagError::Io(std::io::Error::other(e)))?
            .map_err(|e| match e {
                TagError::Io(source) => TagError::IndexUnavailable {
                    path: path.clone(),
                    source,
                },
                other => other,
            })?;

        let snapshot = TagSnapshot {
            records: Arc::from(outcome.records),
            source: path,
            skipped: outcome.skipped,
            loaded_at: SystemTime::now(),
        };
        tracing::info!(
            "Loaded {} tags from {}",
            snapshot.len(),
            snapshot.source.display()
        );
        self.store.set(root, snapshot.clone());
        Ok(snapshot)
    }

    /// Whether the tag file for `root` is present on disk
    pub fn exists(root: &Path, tag_path: &Path) -> bool {
        resolve_tag_path(root, tag_path).is_file()
    }

    pub fn cached(&self, root: &Path) -> Option<TagSnapshot> {
        self.store.get(root)
    }

    pub fn subscribe(&self, root: &Path) -> watch::Receiver<Option<TagSnapshot>> {
        self.store.subscribe(root)
    }

    /// Waits for the first snapshot published for `root`. Returns
    /// immediately when one is already cached.
    pub async fn wait_ready(&self, root: &Path) -> Option<TagSnapshot> {
        let mut rx = self.subscribe(root);
        let ready = rx.wait_for(|snapshot| snapshot.is_some()).await.ok()?;
        let snapshot = (*ready).clone();
        snapshot
    }

    pub fn invalidate(&self, root: &Path) {
        self.store.invalidate(root);
    }
}
