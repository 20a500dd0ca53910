use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};

use crate::error::{Result, TagError};

/// Quiet period applied to raw file-system events before a reload fires
pub const WATCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches a single tag file.
///
/// The parent directory is watched non-recursively and events are filtered
/// by file name, so the watch survives ctags replacing the file via rename.
/// Dropping the watcher releases the OS handle.
pub struct TagFileWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
    path: PathBuf,
}

impl TagFileWatcher {
    pub fn new<F>(tag_file: &Path, debounce: Duration, mut on_change: F) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let parent = tag_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| {
                TagError::Watcher(format!("{} has no parent directory", tag_file.display()))
            })?;
        let file_name = tag_file
            .file_name()
            .map(|n| n.to_os_string())
            .ok_or_else(|| TagError::Watcher(format!("{} is not a file", tag_file.display())))?;

        let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    let touched = events
                        .iter()
                        .any(|e| e.path.file_name() == Some(file_name.as_os_str()));
                    if touched {
                        on_change();
                    }
                }
                Err(e) => tracing::warn!("Tag file watch error: {}", e),
            }
        })
        .map_err(|e| TagError::Watcher(e.to_string()))?;

        debouncer
            .watcher()
            .watch(parent, RecursiveMode::NonRecursive)
            .map_err(|e| TagError::Watcher(e.to_string()))?;

        tracing::info!("Watching {}", tag_file.display());
        Ok(Self {
            _debouncer: debouncer,
            path: tag_file.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// At most one watcher per tag file
#[derive(Default)]
pub struct WatchRegistry {
    watchers: Mutex<HashMap<PathBuf, TagFileWatcher>>,
}

impl WatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts watching `tag_file`. Returns `false` without touching the
    /// existing watcher when one is already active.
    pub fn watch<F>(&self, tag_file: &Path, debounce: Duration, on_change: F) -> Result<bool>
    where
        F: FnMut() + Send + 'static,
    {
        let mut watchers = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if watchers.contains_key(tag_file) {
            return Ok(false);
        }
        let watcher = TagFileWatcher::new(tag_file, debounce, on_change)?;
        watchers.insert(tag_file.to_path_buf(), watcher);
        Ok(true)
    }

    pub fn is_watching(&self, tag_file: &Path) -> bool {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(tag_file)
    }

    pub fn unwatch(&self, tag_file: &Path) -> bool {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(tag_file)
            .is_some()
    }

    pub fn clear(&self) {
        self.watchers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
