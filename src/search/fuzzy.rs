use std::cmp::Reverse;

use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::ScoredTag;
use crate::tags::TagRecord;

/// Subsequence matcher over symbol names.
///
/// Scores come from the Skim V2 algorithm: higher is better, contiguous and
/// word-boundary matches score above scattered characters.
pub struct FuzzySearch {
    matcher: SkimMatcherV2,
}

impl FuzzySearch {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default().ignore_case(),
        }
    }

    /// Ranks every record whose name contains `query` as a subsequence and
    /// keeps the best `limit`. Ties go to the shorter name, then tag-file order.
    pub fn search(&self, records: &[TagRecord], query: &str, limit: usize) -> Vec<ScoredTag> {
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(usize, i64)> = records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                self.matcher
                    .fuzzy_match(&record.name, query)
                    .map(|score| (idx, score))
            })
            .collect();

        scored.sort_by_key(|&(idx, score)| (Reverse(score), records[idx].name.len(), idx));
        scored.truncate(limit);

        scored
            .into_iter()
            .map(|(idx, score)| ScoredTag {
                record: records[idx].clone(),
                score: Some(score),
            })
            .collect()
    }
}

impl Default for FuzzySearch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagKind;
    use std::path::PathBuf;

    fn records(names: &[&str]) -> Vec<TagRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| TagRecord {
                name: name.to_string(),
                file_path: PathBuf::from("/p/src/lib.rs"),
                display_path: "src/lib.rs".to_string(),
                line_number: i as u32 + 1,
                kind: TagKind::Function,
                scope: Some("scope_foo".to_string()),
            })
            .collect()
    }

    fn names(results: &[ScoredTag]) -> Vec<&str> {
        results.iter().map(|r| r.record.name.as_str()).collect()
    }

    #[test]
    fn test_contiguous_prefix_beats_scattered() {
        let tags = records(&["fabcoxyo", "foobar"]);
        let results = FuzzySearch::new().search(&tags, "foo", 10);
        assert_eq!(names(&results), vec!["foobar", "fabcoxyo"]);
        assert!(results[0].score > results[1].score);
    }

    #[test]
    fn test_case_insensitive() {
        let tags = records(&["parse_line", "TagParser"]);
        let results = FuzzySearch::new().search(&tags, "PARSE", 10);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_scope_and_path_are_not_matched() {
        let tags = records(&["alpha", "beta"]);
        let results = FuzzySearch::new().search(&tags, "scope", 10);
        assert!(results.is_empty());
        let results = FuzzySearch::new().search(&tags, "lib", 10);
        assert!(results.is_empty());
    }

    #[test]
    fn test_limit_applies_after_ranking() {
        let tags = records(&["xxfxxoxxo", "fxoxo", "foo"]);
        let results = FuzzySearch::new().search(&tags, "foo", 1);
        assert_eq!(names(&results), vec!["foo"]);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let tags = records(&["foo"]);
        assert!(FuzzySearch::new().search(&tags, "", 10).is_empty());
    }
}
