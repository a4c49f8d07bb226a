// File: src/core/filters.rs
use std::collections::{HashMap, HashSet};

/// Sentence-final and grammatical particles that are never proposed as
/// vocabulary on their own.
pub const DEFAULT_STOPLIST: &[&str] = &[
    "嘅", "咩", "吖", "啦", "喎", "咗", "嗎", "嘛", "啫", "囉", "呀", "喇", "呀嘛", "哋", "嘞",
    "嗰", "咁", "喺", "哇", "啊", "么", "么呀",
];

/// Categories that are never expanded.
pub const DEFAULT_SKIP_CATEGORIES: &[&str] = &["unassigned"];

pub const DEFAULT_MAX_WORD_CHARS: usize = 4;

/// Structural pre-filter on candidate words, applied before any gate.
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    stoplist: HashSet<String>,
    skip_categories: HashSet<String>,
    max_word_chars: usize,
    /// category -> characters a candidate must share at least one of
    hints: HashMap<String, HashSet<char>>,
}

impl Default for CandidateFilter {
    fn default() -> Self {
        Self {
            stoplist: DEFAULT_STOPLIST.iter().map(|s| s.to_string()).collect(),
            skip_categories: DEFAULT_SKIP_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            max_word_chars: DEFAULT_MAX_WORD_CHARS,
            hints: HashMap::new(),
        }
    }
}

impl CandidateFilter {
    pub fn new(
        stoplist: impl IntoIterator<Item = String>,
        skip_categories: impl IntoIterator<Item = String>,
        max_word_chars: usize,
        hints: &HashMap<String, String>,
    ) -> Self {
        Self {
            stoplist: stoplist.into_iter().collect(),
            skip_categories: skip_categories.into_iter().collect(),
            max_word_chars,
            hints: hints
                .iter()
                .map(|(category, chars)| (category.clone(), chars.chars().collect()))
                .collect(),
        }
    }

    /// No filtering at all; every word of every category is a candidate.
    pub fn permissive() -> Self {
        Self {
            stoplist: HashSet::new(),
            skip_categories: HashSet::new(),
            max_word_chars: usize::MAX,
            hints: HashMap::new(),
        }
    }

    pub fn is_skipped(&self, category: &str) -> bool {
        self.skip_categories.contains(category)
    }

    pub fn admits(&self, category: &str, word: &str) -> bool {
        let len = word.chars().count();
        if len == 0 || len > self.max_word_chars || self.stoplist.contains(word) {
            return false;
        }
        match self.hints.get(category) {
            Some(hint) => word.chars().any(|c| hint.contains(&c)),
            None => true,
        }
    }
}
