// File: src/categories.rs
use crate::error::{ExpandError, ExpandResult};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::path::Path;

/// The category file: category name -> member words.
///
/// A category is either a plain list of words or a mapping holding an
/// `items` list next to other keys (`examples_en`, ...). Both shapes are kept
/// as they are when the file is rewritten; only the word lists change.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFile {
    doc: Mapping,
}

impl CategoryFile {
    pub fn load(path: &Path) -> ExpandResult<Self> {
        if !path.is_file() {
            return Err(ExpandError::CategoryFileMissing(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text).map_err(|reason| ExpandError::corrupt(path, reason))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self { doc: Mapping::new() });
        }
        match serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())? {
            Value::Mapping(doc) => Ok(Self { doc }),
            Value::Null => Ok(Self { doc: Mapping::new() }),
            other => Err(format!("expected a mapping of categories, found {}", kind(&other))),
        }
    }

    pub fn to_yaml(&self) -> ExpandResult<String> {
        serde_yaml::to_string(&self.doc)
            .map_err(|e| ExpandError::corrupt(Path::new("<categories>"), e))
    }

    /// Category names in file order.
    pub fn names(&self) -> Vec<String> {
        self.doc
            .keys()
            .filter_map(|key| key.as_str().map(str::to_string))
            .collect()
    }

    pub fn contains(&self, category: &str) -> bool {
        self.doc.contains_key(category)
    }

    /// Member words of `category`, in file order. Unknown shapes are empty.
    pub fn members(&self, category: &str) -> Vec<String> {
        self.doc
            .get(category)
            .and_then(items)
            .map(|list| list.iter().filter_map(word_of).collect())
            .unwrap_or_default()
    }

    pub fn member_set(&self, category: &str) -> HashSet<String> {
        self.members(category).into_iter().collect()
    }

    /// Every member of every category, once per category it appears in.
    pub fn all_memberships(&self) -> Vec<String> {
        self.names()
            .iter()
            .flat_map(|category| {
                let mut seen = HashSet::new();
                self.members(category)
                    .into_iter()
                    .filter(move |word| seen.insert(word.clone()))
            })
            .collect()
    }

    /// Appends `words` that are not yet members. Returns how many were added.
    pub fn append(&mut self, category: &str, words: &[String]) -> usize {
        let existing = self.member_set(category);
        let fresh: Vec<Value> = words
            .iter()
            .filter(|word| !existing.contains(*word))
            .map(|word| Value::String(word.clone()))
            .collect();
        let added = fresh.len();
        if added == 0 {
            return 0;
        }

        let key = Value::String(category.to_string());
        match self.doc.get_mut(&key) {
            Some(Value::Sequence(list)) => list.extend(fresh),
            Some(Value::Mapping(node)) => match node.get_mut("items") {
                Some(Value::Sequence(list)) => list.extend(fresh),
                _ => {
                    node.insert(Value::String("items".into()), Value::Sequence(fresh));
                }
            },
            _ => {
                self.doc.insert(key, Value::Sequence(fresh));
            }
        }
        added
    }

    /// Removes every occurrence of `words` from the category. Words that are
    /// not members are ignored. Returns how many entries were removed.
    pub fn remove(&mut self, category: &str, words: &HashSet<String>) -> usize {
        let Some(list) = self.doc.get_mut(category).and_then(items_mut) else {
            return 0;
        };
        let before = list.len();
        list.retain(|value| word_of(value).map_or(true, |word| !words.contains(&word)));
        before - list.len()
    }
}

fn items(node: &Value) -> Option<&Vec<Value>> {
    match node {
        Value::Sequence(list) => Some(list),
        Value::Mapping(map) => map.get("items").and_then(Value::as_sequence),
        _ => None,
    }
}

fn items_mut(node: &mut Value) -> Option<&mut Vec<Value>> {
    match node {
        Value::Sequence(list) => Some(list),
        Value::Mapping(map) => map.get_mut("items").and_then(Value::as_sequence_mut),
        _ => None,
    }
}

/// Words are strings, but YAML happily reads `一` as a string and `1` as a number.
fn word_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
