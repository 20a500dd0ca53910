//! Snapshot cache keyed by project root.
//!
//! Every root owns a [`LatestCell`]: a single-slot value that replays the
//! most recently published snapshot to anyone who subscribes later. Writers
//! always replace the whole snapshot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

use super::TagSnapshot;

/// Latest-value cell with replay for late subscribers
#[derive(Debug)]
pub struct LatestCell<T> {
    sender: watch::Sender<Option<T>>,
}

impl<T: Clone> LatestCell<T> {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replaces the current value and wakes subscribers
    pub fn publish(&self, value: T) {
        self.sender.send_replace(Some(value));
    }

    pub fn clear(&self) {
        self.sender.send_replace(None);
    }

    pub fn get(&self) -> Option<T> {
        self.sender.borrow().clone()
    }

    /// Receiver that immediately observes the current value
    pub fn subscribe(&self) -> watch::Receiver<Option<T>> {
        self.sender.subscribe()
    }
}

impl<T: Clone> Default for LatestCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds one snapshot cell per project root
#[derive(Debug, Default)]
pub struct IndexStore {
    cells: RwLock<HashMap<PathBuf, LatestCell<TagSnapshot>>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, root: &Path) -> Option<TagSnapshot> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.get(root).and_then(|cell| cell.get())
    }

    pub fn set(&self, root: &Path, snapshot: TagSnapshot) {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        cells
            .entry(root.to_path_buf())
            .or_default()
            .publish(snapshot);
    }

    /// Drops the cached snapshot. Subscribers stay attached and see `None`.
    pub fn invalidate(&self, root: &Path) {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(cell) = cells.get(root) {
            cell.clear();
        }
    }

    pub fn subscribe(&self, root: &Path) -> watch::Receiver<Option<TagSnapshot>> {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        cells.entry(root.to_path_buf()).or_default().subscribe()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        let cells = self.cells.read().unwrap_or_else(PoisonError::into_inner);
        cells.keys().cloned().collect()
    }
}
