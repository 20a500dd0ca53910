pub mod exact;
pub mod fuzzy;

use serde::Serialize;

use crate::tags::TagRecord;

pub use exact::exact_search;
pub use fuzzy::FuzzySearch;

/// A search hit. Exact matches carry no score; fuzzy scores are
/// higher-is-better.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredTag {
    pub record: TagRecord,
    pub score: Option<i64>,
}

/// The two interchangeable search strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    ExactMatch,
    FuzzyMatch { limit: usize },
}

impl SearchStrategy {
    pub fn search(&self, records: &[TagRecord], query: &str) -> Vec<ScoredTag> {
        match self {
            SearchStrategy::ExactMatch => exact_search(records, query),
            SearchStrategy::FuzzyMatch { limit } => FuzzySearch::new().search(records, query, *limit),
        }
    }
}

/// What an explicit seed text (e.g. the editor selection) resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// Nothing matched; fall back to interactive fuzzy search
    NotFound,
    /// Exactly one definition; jump without showing a picker
    Unique(TagRecord),
    /// Several definitions to seed the picker with
    Candidates(Vec<TagRecord>),
}

pub fn resolve_seed(records: &[TagRecord], seed: &str) -> SeedOutcome {
    let mut hits: Vec<TagRecord> = SearchStrategy::ExactMatch
        .search(records, seed)
        .into_iter()
        .map(|hit| hit.record)
        .collect();

    match hits.len() {
        0 => SeedOutcome::NotFound,
        1 => SeedOutcome::Unique(hits.remove(0)),
        _ => SeedOutcome::Candidates(hits),
    }
}
