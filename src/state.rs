// File: src/state.rs
//! Record of the words this tool added to each category, kept so later runs
//! know what `--undo` may take back.

use crate::categories::CategoryFile;
use crate::error::{ExpandError, ExpandResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(default)]
    pub added_items: Vec<String>,
}

/// Per-category auto-added words. A missing file is an empty state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpansionState {
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryRecord>,
}

impl ExpansionState {
    pub fn load(path: &Path) -> ExpandResult<Self> {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no expansion state yet");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(&text).map_err(|e| ExpandError::corrupt(path, e))
    }

    pub fn to_json(&self) -> ExpandResult<String> {
        serde_json::to_string_pretty(self)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| ExpandError::corrupt(Path::new("<state>"), e))
    }

    pub fn added(&self, category: &str) -> &[String] {
        self.categories
            .get(category)
            .map(|record| record.added_items.as_slice())
            .unwrap_or(&[])
    }

    /// Appends `words` to the category's record, keeping first-seen order.
    pub fn record(&mut self, category: &str, words: &[String]) {
        let record = self.categories.entry(category.to_string()).or_default();
        let mut seen: HashSet<String> = record.added_items.iter().cloned().collect();
        for word in words {
            if seen.insert(word.clone()) {
                record.added_items.push(word.clone());
            }
        }
    }

    /// Drops recorded words that are no longer members of the category.
    /// Returns the words dropped.
    pub fn prune(&mut self, category: &str, members: &HashSet<String>) -> Vec<String> {
        let Some(record) = self.categories.get_mut(category) else {
            return Vec::new();
        };
        let (kept, stale): (Vec<String>, Vec<String>) = record
            .added_items
            .drain(..)
            .partition(|word| members.contains(word));
        record.added_items = kept;
        stale
    }

    /// Empties the category's record and returns what it held.
    pub fn take(&mut self, category: &str) -> Vec<String> {
        self.categories
            .get_mut(category)
            .map(|record| std::mem::take(&mut record.added_items))
            .unwrap_or_default()
    }

    /// Whether every recorded word is still a member of its category.
    pub fn is_consistent_with(&self, categories: &CategoryFile) -> bool {
        self.categories.iter().all(|(category, record)| {
            let members = categories.member_set(category);
            record.added_items.iter().all(|word| members.contains(word))
        })
    }
}
