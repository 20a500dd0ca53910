use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Shared progress of tag generation runs
#[derive(Clone, Default)]
pub struct GenerationProgress {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    is_active: AtomicBool,
    runs_started: AtomicUsize,
    runs_succeeded: AtomicUsize,
    runs_failed: AtomicUsize,
    last_duration_ms: AtomicU64,
    started_at: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub is_active: bool,
    pub runs_started: usize,
    pub runs_succeeded: usize,
    pub runs_failed: usize,
    pub elapsed_ms: u64,
    pub last_duration_ms: u64,
}

impl GenerationProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.inner.runs_started.fetch_add(1, Ordering::Relaxed);
        self.inner.is_active.store(true, Ordering::Release);
        *self
            .inner
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
    }

    pub fn finish(&self, success: bool) {
        if success {
            self.inner.runs_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.runs_failed.fetch_add(1, Ordering::Relaxed);
        }
        self.inner
            .last_duration_ms
            .store(self.elapsed_ms(), Ordering::Release);
        self.inner.is_active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.inner.is_active.load(Ordering::Acquire)
    }

    fn elapsed_ms(&self) -> u64 {
        self.inner
            .started_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let is_active = self.is_active();
        ProgressSnapshot {
            is_active,
            runs_started: self.inner.runs_started.load(Ordering::Acquire),
            runs_succeeded: self.inner.runs_succeeded.load(Ordering::Acquire),
            runs_failed: self.inner.runs_failed.load(Ordering::Acquire),
            elapsed_ms: if is_active { self.elapsed_ms() } else { 0 },
            last_duration_ms: self.inner.last_duration_ms.load(Ordering::Acquire),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_runs() {
        let progress = GenerationProgress::new();
        assert!(!progress.is_active());

        progress.start();
        assert!(progress.snapshot().is_active);
        progress.finish(true);

        progress.start();
        progress.finish(false);

        let snap = progress.snapshot();
        assert!(!snap.is_active);
        assert_eq!(snap.runs_started, 2);
        assert_eq!(snap.runs_succeeded, 1);
        assert_eq!(snap.runs_failed, 1);
        assert_eq!(snap.elapsed_ms, 0);
    }
}
