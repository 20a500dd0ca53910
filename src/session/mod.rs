//! Interactive query loop.
//!
//! Keystrokes arrive as [`PickerEvent`]s. Each one bumps a session counter
//! and re-arms a debounce deadline; when the deadline passes with the counter
//! unchanged, the value is searched on a blocking task tagged with that
//! counter. A result is shown only if its tag is still the latest request, so
//! a slow search for an old keystroke never overwrites a newer one. Ending
//! the session drops the timer and aborts outstanding searches.

pub mod picker;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::Instant;

use crate::config::{DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_MATCHES};
use crate::search::{resolve_seed, ScoredTag, SearchStrategy, SeedOutcome};
use crate::tags::TagRecord;

pub use picker::{AdminAction, PickerEvent, PickerItem, Presenter, SessionOutcome};

/// Leading character that switches the picker to administrative actions
pub const COMMAND_PREFIX: char = '>';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub debounce: Duration,
    pub max_matches: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            max_matches: DEFAULT_MAX_MATCHES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingInput,
    Searching,
    Presenting,
    Finished,
}

/// A query waiting for its debounce deadline
#[derive(Debug)]
struct PendingQuery {
    value: String,
    armed_at: u64,
    deadline: Instant,
}

type SearchResult = (u64, Vec<ScoredTag>);

pub struct QuerySession {
    records: Arc<[TagRecord]>,
    options: SessionOptions,
    state: SessionState,
    counter: u64,
    pending: Option<PendingQuery>,
    /// Tag of the search whose result may still be shown
    current_request: Option<u64>,
    last_searched: Option<String>,
    searches: JoinSet<SearchResult>,
}

impl QuerySession {
    pub fn new(records: Arc<[TagRecord]>, options: SessionOptions) -> Self {
        Self {
            records,
            options,
            state: SessionState::Idle,
            counter: 0,
            pending: None,
            current_request: None,
            last_searched: None,
            searches: JoinSet::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs the session until the user selects an item or dismisses the
    /// picker.
    ///
    /// A `seed` is first looked up by exact name: a unique hit returns
    /// immediately without touching the presenter, several hits seed the
    /// list, and no hit shows a notice and falls through to fuzzy search.
    pub async fn run<P: Presenter>(
        &mut self,
        seed: Option<&str>,
        presenter: &mut P,
        mut events: mpsc::Receiver<PickerEvent>,
    ) -> SessionOutcome {
        if let Some(seed) = seed.filter(|s| !s.is_empty()) {
            match resolve_seed(&self.records, seed) {
                SeedOutcome::Unique(record) => {
                    self.finish();
                    return SessionOutcome::Selected(record);
                }
                SeedOutcome::Candidates(records) => {
                    presenter.set_value(seed);
                    presenter.show_items(records.into_iter().map(PickerItem::Tag).collect());
                    self.last_searched = Some(seed.to_string());
                    self.state = SessionState::Presenting;
                }
                SeedOutcome::NotFound => {
                    presenter.notify(&format!("Nothing found for {}", seed));
                    presenter.set_value(seed);
                    self.on_input(seed.to_string(), presenter);
                }
            }
        }
        if self.state == SessionState::Idle {
            self.state = SessionState::AwaitingInput;
        }

        loop {
            let deadline = self.pending.as_ref().map(|p| p.deadline);

            tokio::select! {
                event = events.recv() => match event {
                    Some(PickerEvent::Input(value)) => self.on_input(value, presenter),
                    Some(PickerEvent::Select(item)) => {
                        self.finish();
                        return match item {
                            PickerItem::Tag(record) => SessionOutcome::Selected(record),
                            PickerItem::Action(action) => SessionOutcome::Action(action),
                        };
                    }
                    Some(PickerEvent::Dismiss) | None => {
                        self.finish();
                        return SessionOutcome::Cancelled;
                    }
                },
                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.on_deadline(presenter);
                }
                Some(joined) = self.searches.join_next(), if !self.searches.is_empty() => {
                    self.on_result(joined, presenter);
                }
            }
        }
    }

    fn on_input<P: Presenter>(&mut self, value: String, presenter: &mut P) {
        self.counter += 1;

        if value.starts_with(COMMAND_PREFIX) {
            self.pending = None;
            self.current_request = None;
            self.last_searched = None;
            presenter.set_busy(false);
            presenter.show_items(PickerItem::admin_actions());
            self.state = SessionState::Presenting;
            return;
        }

        self.pending = Some(PendingQuery {
            value,
            armed_at: self.counter,
            deadline: Instant::now() + self.options.debounce,
        });
        self.state = SessionState::AwaitingInput;
    }

    fn on_deadline<P: Presenter>(&mut self, presenter: &mut P) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.armed_at != self.counter {
            return;
        }
        if self.last_searched.as_deref() == Some(pending.value.as_str()) {
            self.state = SessionState::Presenting;
            return;
        }
        self.last_searched = Some(pending.value.clone());

        if pending.value.is_empty() {
            self.current_request = None;
            presenter.show_items(Vec::new());
            presenter.set_busy(false);
            self.state = SessionState::Presenting;
            return;
        }

        let tag = self.counter;
        let records = Arc::clone(&self.records);
        let strategy = SearchStrategy::FuzzyMatch {
            limit: self.options.max_matches,
        };
        let query = pending.value;
        tracing::debug!("Searching tags for {:?} (request {})", query, tag);
        self.searches
            .spawn_blocking(move || (tag, strategy.search(&records, &query)));
        self.current_request = Some(tag);
        presenter.set_busy(true);
        self.state = SessionState::Searching;
    }

    fn on_result<P: Presenter>(
        &mut self,
        joined: std::result::Result<SearchResult, JoinError>,
        presenter: &mut P,
    ) {
        match joined {
            Ok((tag, results)) if Some(tag) == self.current_request => {
                presenter.show_items(
                    results
                        .into_iter()
                        .map(|hit| PickerItem::Tag(hit.record))
                        .collect(),
                );
                presenter.set_busy(false);
                self.state = SessionState::Presenting;
            }
            Ok((tag, _)) => {
                tracing::debug!("Discarding stale search result {}", tag);
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => {
                tracing::warn!("Search task failed: {}", e);
                presenter.set_busy(false);
            }
        }
    }

    fn finish(&mut self) {
        self.pending = None;
        self.current_request = None;
        self.searches.abort_all();
        self.state = SessionState::Finished;
    }
}
