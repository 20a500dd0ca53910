use super::ScoredTag;
use crate::tags::TagRecord;

/// Case-sensitive equality on the symbol name. Every hit is unscored.
pub fn exact_search(records: &[TagRecord], query: &str) -> Vec<ScoredTag> {
    records
        .iter()
        .filter(|record| record.name == query)
        .map(|record| ScoredTag {
            record: record.clone(),
            score: None,
        })
        .collect()
}
