use crate::categories::CategoryFile;
use crate::core::filters::CandidateFilter;
use crate::core::frequency::FrequencyTable;
use crate::core::gate::GateEvaluator;
use crate::core::types::WordFrequencyRow;
use crate::error::{ExpandError, ExpandResult};
use crate::state::ExpansionState;
use std::cmp::Ordering;
use std::collections::HashSet;

pub const DEFAULT_TOP_N: usize = 10;

/// One proposed word and the rank value it was selected by.
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub word: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Proposed,
    Nothing,
    Skipped,
}

/// Outcome of expanding a single category.
#[derive(Debug, Clone, PartialEq)]
pub struct Proposal {
    pub category: String,
    pub status: ProposalStatus,
    pub picks: Vec<Pick>,
    /// Frequency cut actually applied, `None` if the gated pool was empty.
    pub threshold: Option<f64>,
    /// Candidates left after gating, before the top-N cut.
    pub pool_size: usize,
    pub existing: usize,
}

impl Proposal {
    pub fn words(&self) -> Vec<String> {
        self.picks.iter().map(|pick| pick.word.clone()).collect()
    }
}

/// Ranks frequency-table words as new members for each category.
pub struct CategoryExpander<'a> {
    table: &'a FrequencyTable,
    gates: GateEvaluator,
    filter: &'a CandidateFilter,
    top_n: usize,
}

impl<'a> CategoryExpander<'a> {
    pub fn new(
        table: &'a FrequencyTable,
        gates: GateEvaluator,
        filter: &'a CandidateFilter,
        top_n: usize,
    ) -> Self {
        Self { table, gates, filter, top_n }
    }

    /// Proposals for every selected category, in the order given.
    pub fn propose(&self, categories: &CategoryFile, selected: &[String]) -> Vec<Proposal> {
        selected
            .iter()
            .map(|category| self.propose_for_category(category, &categories.member_set(category)))
            .collect()
    }

    pub fn propose_for_category(&self, category: &str, members: &HashSet<String>) -> Proposal {
        if self.filter.is_skipped(category) {
            tracing::debug!(category, "category is in the skip list");
            return Proposal {
                category: category.to_string(),
                status: ProposalStatus::Skipped,
                picks: Vec::new(),
                threshold: None,
                pool_size: 0,
                existing: members.len(),
            };
        }

        // 1. Candidate pool: every table word not already in this category
        let pool: Vec<&WordFrequencyRow> = self
            .table
            .rows()
            .iter()
            .filter(|row| !members.contains(&row.word))
            .filter(|row| self.filter.admits(category, &row.word))
            .collect();
        let considered = pool.len();

        // 2. Presence and frequency gates
        let outcome = self.gates.apply(pool);
        let mut survivors = outcome.survivors;

        // 3. Rank descending, ties by word
        let column = self.gates.rank_column;
        survivors.sort_by(|a, b| {
            b.rank_value(column)
                .partial_cmp(&a.rank_value(column))
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.word.cmp(&b.word))
        });
        let pool_size = survivors.len();

        // 4. Top N
        let picks: Vec<Pick> = survivors
            .into_iter()
            .take(self.top_n)
            .map(|row| Pick {
                word: row.word.clone(),
                value: row.rank_value(column),
            })
            .collect();

        tracing::debug!(
            category,
            considered,
            gated = pool_size,
            picked = picks.len(),
            threshold = ?outcome.threshold,
            "category ranked"
        );

        Proposal {
            category: category.to_string(),
            status: if picks.is_empty() {
                ProposalStatus::Nothing
            } else {
                ProposalStatus::Proposed
            },
            picks,
            threshold: outcome.threshold,
            pool_size,
            existing: members.len(),
        }
    }
}

/// Resolves `--only` against the category file. Every unknown name is
/// reported at once; no name means every category.
pub fn select_categories(
    categories: &CategoryFile,
    only: Option<&[String]>,
) -> ExpandResult<Vec<String>> {
    let Some(only) = only else {
        return Ok(categories.names());
    };

    let unknown: Vec<String> = only
        .iter()
        .filter(|name| !categories.contains(name))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(ExpandError::UnknownCategories(unknown));
    }

    let mut seen = HashSet::new();
    Ok(only
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect())
}

/// What a commit changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitSummary {
    /// category -> words appended
    pub added: Vec<(String, Vec<String>)>,
    /// category -> stale state entries dropped
    pub pruned: Vec<(String, Vec<String>)>,
}

impl CommitSummary {
    pub fn total_added(&self) -> usize {
        self.added.iter().map(|(_, words)| words.len()).sum()
    }
}

/// Appends every proposal to its category and records it as auto-added.
/// Only mutates the in-memory artifacts; the caller writes them.
pub fn apply_commit(
    categories: &mut CategoryFile,
    state: &mut ExpansionState,
    proposals: &[Proposal],
) -> CommitSummary {
    let mut summary = CommitSummary::default();
    for proposal in proposals {
        if proposal.status == ProposalStatus::Skipped {
            continue;
        }
        let category = proposal.category.as_str();

        let stale = state.prune(category, &categories.member_set(category));
        if !stale.is_empty() {
            tracing::info!(category, count = stale.len(), "dropping state for words removed by hand");
            summary.pruned.push((category.to_string(), stale));
        }

        let words = proposal.words();
        if words.is_empty() {
            continue;
        }
        categories.append(category, &words);
        state.record(category, &words);
        summary.added.push((category.to_string(), words));
    }
    summary
}

/// What an undo removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UndoSummary {
    /// category -> words cleared from state
    pub cleared: Vec<(String, Vec<String>)>,
    /// entries actually removed from the category file
    pub removed_members: usize,
}

impl UndoSummary {
    pub fn is_empty(&self) -> bool {
        self.cleared.is_empty()
    }
}

/// Removes each selected category's auto-added words from both the
/// category and the state. Words already gone from the category are only
/// cleared from the state.
pub fn apply_undo(
    categories: &mut CategoryFile,
    state: &mut ExpansionState,
    selected: &[String],
) -> UndoSummary {
    let mut summary = UndoSummary::default();
    for category in selected {
        let recorded = state.take(category);
        if recorded.is_empty() {
            continue;
        }
        let words: HashSet<String> = recorded.iter().cloned().collect();
        let removed = categories.remove(category, &words);
        tracing::info!(category = %category, recorded = recorded.len(), removed, "undo");
        summary.removed_members += removed;
        summary.cleared.push((category.clone(), recorded));
    }
    summary
}
