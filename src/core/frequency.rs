// File: src/core/frequency.rs
use crate::core::types::{
    Denominators, PerSource, Source, SourceCounts, SourceWeights, WordFrequencyRow,
};
use std::collections::{BTreeMap, HashMap};

/// Parts-per-million of `count` within a source of `total_tokens` tokens.
/// An empty source contributes nothing.
pub fn ppm_raw(count: u64, total_tokens: u64) -> f64 {
    if total_tokens == 0 {
        return 0.0;
    }
    count as f64 / total_tokens as f64 * 1_000_000.0
}

/// `Σ weight(s) * ppm_raw(s)` with each source normalised by its own denominator.
pub fn weighted_ppm(
    counts: &SourceCounts,
    weights: &SourceWeights,
    denominators: &Denominators,
) -> f64 {
    Source::ALL
        .iter()
        .map(|&source| {
            let weight = weights.get(source);
            if weight == 0.0 {
                return 0.0;
            }
            weight * ppm_raw(counts.get(source), denominators.get(source))
        })
        .sum()
}

/// Token counts observed in a single source.
#[derive(Debug, Clone, Default)]
pub struct SourceTally {
    counts: HashMap<String, u64>,
    total_tokens: u64,
    declared_total: Option<u64>,
}

impl SourceTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `n` more hits of `word`. O(1) amortized.
    pub fn add(&mut self, word: &str, n: u64) {
        if word.is_empty() || n == 0 {
            return;
        }
        *self.counts.entry(word.to_string()).or_insert(0) += n;
        self.total_tokens += n;
    }

    /// Overrides the denominator with a corpus size known up front.
    pub fn declare_total(&mut self, total: u64) {
        self.declared_total = Some(total);
    }

    pub fn total_tokens(&self) -> u64 {
        self.declared_total.unwrap_or(self.total_tokens)
    }

    pub fn get(&self, word: &str) -> u64 {
        self.counts.get(word).copied().unwrap_or(0)
    }

    pub fn distinct_words(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Merges per-source tallies into one row per word.
#[derive(Debug, Default)]
pub struct FrequencyTableBuilder {
    tallies: HashMap<Source, SourceTally>,
}

impl FrequencyTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: Source, tally: SourceTally) -> Self {
        self.tallies.insert(source, tally);
        self
    }

    pub fn build(self, weights: SourceWeights) -> FrequencyTable {
        let mut denominators = Denominators::default();
        let mut merged: BTreeMap<String, SourceCounts> = BTreeMap::new();

        for (source, tally) in self.tallies {
            *denominators.get_mut(source) = tally.total_tokens();
            for (word, count) in tally.counts {
                *merged.entry(word).or_default().get_mut(source) += count;
            }
        }

        FrequencyTable::from_counts(merged.into_iter().collect(), denominators, weights)
    }
}

/// The merged, weighted frequency table. Rows are kept sorted by word.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    rows: Vec<WordFrequencyRow>,
    denominators: Denominators,
    weights: SourceWeights,
}

impl FrequencyTable {
    /// Builds rows from raw counts, deriving every ppm column.
    pub fn from_counts(
        mut counts: Vec<(String, SourceCounts)>,
        denominators: Denominators,
        weights: SourceWeights,
    ) -> Self {
        counts.sort_by(|a, b| a.0.cmp(&b.0));
        counts.dedup_by(|a, b| a.0 == b.0);
        let rows = counts
            .into_iter()
            .map(|(word, counts)| derive_row(word, counts, &denominators, &weights))
            .collect();
        Self { rows, denominators, weights }
    }

    /// Recomputes every derived column under new weights.
    pub fn reweight(&mut self, weights: SourceWeights) {
        self.weights = weights;
        for row in &mut self.rows {
            row.ppm_weighted = weighted_ppm(&row.counts, &weights, &self.denominators);
        }
    }

    pub fn rows(&self) -> &[WordFrequencyRow] {
        &self.rows
    }

    pub fn get(&self, word: &str) -> Option<&WordFrequencyRow> {
        self.rows
            .binary_search_by(|row| row.word.as_str().cmp(word))
            .ok()
            .map(|idx| &self.rows[idx])
    }

    pub fn denominators(&self) -> Denominators {
        self.denominators
    }

    pub fn weights(&self) -> SourceWeights {
        self.weights
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn derive_row(
    word: String,
    counts: SourceCounts,
    denominators: &Denominators,
    weights: &SourceWeights,
) -> WordFrequencyRow {
    let ppm = PerSource::new(
        ppm_raw(counts.hkcancor, denominators.hkcancor),
        ppm_raw(counts.subtitles, denominators.subtitles),
        ppm_raw(counts.app, denominators.app),
    );
    WordFrequencyRow {
        word,
        counts,
        ppm_raw: ppm,
        ppm_weighted: weighted_ppm(&counts, weights, denominators),
    }
}
