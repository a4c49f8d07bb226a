// File: src/core/gate.rs
use crate::core::types::{PerSource, RankColumn, Source, WordFrequencyRow};
use crate::error::{ExpandError, ExpandResult};

/// Per-source minimum raw counts. A minimum of 0 always passes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PresenceGate {
    pub min_counts: PerSource<u64>,
}

impl PresenceGate {
    pub fn new(hkc_min: u64, sub_min: u64, app_min: u64) -> Self {
        Self {
            min_counts: PerSource::new(hkc_min, sub_min, app_min),
        }
    }

    pub fn passes(&self, row: &WordFrequencyRow) -> bool {
        Source::ALL
            .iter()
            .all(|&source| row.count(source) >= self.min_counts.get(source))
    }
}

/// The frequency gate. Exactly one mode is active per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrequencyGate {
    /// Keep rows whose rank value is at least this ppm.
    Floor(f64),
    /// Keep rows at or above this quantile (0..=1) of the pool's rank values.
    Percentile(f64),
}

impl FrequencyGate {
    pub fn floor(ppm_min: f64) -> ExpandResult<Self> {
        if !ppm_min.is_finite() || ppm_min < 0.0 {
            return Err(ExpandError::InvalidThreshold(format!(
                "ppm floor must be a non-negative number, got {ppm_min}"
            )));
        }
        Ok(Self::Floor(ppm_min))
    }

    pub fn percentile(fraction: f64) -> ExpandResult<Self> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ExpandError::InvalidThreshold(format!(
                "percentile is a fraction in 0..=1, got {fraction}"
            )));
        }
        Ok(Self::Percentile(fraction))
    }

    /// The cut-off for a pool with the given rank values, `None` when a
    /// percentile is asked of an empty pool.
    pub fn threshold(&self, values: &[f64]) -> Option<f64> {
        match *self {
            FrequencyGate::Floor(ppm_min) => Some(ppm_min),
            FrequencyGate::Percentile(fraction) => quantile(values, fraction),
        }
    }
}

/// Linear-interpolated quantile, `fraction` in 0..=1.
pub fn quantile(values: &[f64], fraction: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = fraction.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Rows that survived the gates, plus the threshold that was applied.
#[derive(Debug)]
pub struct GateOutcome<'a> {
    pub survivors: Vec<&'a WordFrequencyRow>,
    pub threshold: Option<f64>,
}

/// Presence gates first, then the frequency gate over whatever remains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateEvaluator {
    pub presence: PresenceGate,
    pub frequency: FrequencyGate,
    pub rank_column: RankColumn,
}

impl GateEvaluator {
    pub fn new(presence: PresenceGate, frequency: FrequencyGate, rank_column: RankColumn) -> Self {
        Self { presence, frequency, rank_column }
    }

    /// Drops every row of `pool` failing a presence gate or the frequency gate.
    /// The percentile, when active, is taken over the presence-gated pool.
    pub fn apply<'a>(&self, pool: Vec<&'a WordFrequencyRow>) -> GateOutcome<'a> {
        let present: Vec<&WordFrequencyRow> =
            pool.into_iter().filter(|row| self.presence.passes(row)).collect();

        let values: Vec<f64> = present
            .iter()
            .map(|row| row.rank_value(self.rank_column))
            .collect();
        let Some(threshold) = self.frequency.threshold(&values) else {
            return GateOutcome { survivors: Vec::new(), threshold: None };
        };

        let survivors = present
            .into_iter()
            .filter(|row| row.rank_value(self.rank_column) >= threshold)
            .collect();
        GateOutcome { survivors, threshold: Some(threshold) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frequency::FrequencyTable;

    fn table(rows: &[(&str, u64, u64, u64)]) -> FrequencyTable {
        FrequencyTable::from_counts(
            rows.iter()
                .map(|&(w, h, s, a)| (w.to_string(), PerSource::new(h, s, a)))
                .collect(),
            PerSource::new(1_000_000, 1_000_000, 1_000_000),
            PerSource::new(1.0, 0.35, 0.0),
        )
    }

    #[test]
    fn test_floor_gate_scenario() {
        let t = table(&[("你好", 50, 20, 0)]);
        let row = t.get("你好").unwrap();
        assert!((row.ppm_weighted - 57.0).abs() < 1e-9);

        let gate = GateEvaluator::new(
            PresenceGate::default(),
            FrequencyGate::floor(10.0).unwrap(),
            RankColumn::PpmWeighted,
        );
        let outcome = gate.apply(t.rows().iter().collect());
        assert_eq!(outcome.survivors.len(), 1);
        assert_eq!(outcome.threshold, Some(10.0));
    }

    #[test]
    fn test_presence_gates_are_conjunctive() {
        let t = table(&[("甲", 5, 5, 0), ("乙", 5, 0, 0), ("丙", 0, 5, 0)]);
        let gate = PresenceGate::new(1, 1, 0);
        let passing: Vec<&str> = t
            .rows()
            .iter()
            .filter(|r| gate.passes(r))
            .map(|r| r.word.as_str())
            .collect();
        assert_eq!(passing, vec!["甲"]);
    }

    #[test]
    fn test_zero_minimum_passes_absent_source() {
        let t = table(&[("甲", 0, 0, 0)]);
        assert_eq!(PresenceGate::new(0, 0, 0), PresenceGate::default());
        assert!(PresenceGate::default().passes(&t.rows()[0]));
    }

    #[test]
    fn test_failing_rows_are_dropped_not_ranked_last() {
        let t = table(&[("甲", 100, 0, 0), ("乙", 1, 0, 0)]);
        let gate = GateEvaluator::new(
            PresenceGate::default(),
            FrequencyGate::floor(5.0).unwrap(),
            RankColumn::Ppm(Source::HkCanCor),
        );
        let outcome = gate.apply(t.rows().iter().collect());
        let words: Vec<&str> = outcome.survivors.iter().map(|r| r.word.as_str()).collect();
        assert_eq!(words, vec!["甲"]);
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&values, 0.0), Some(1.0));
        assert_eq!(quantile(&values, 1.0), Some(5.0));
        assert_eq!(quantile(&values, 0.5), Some(3.0));
        assert!((quantile(&values, 0.8).unwrap() - 4.2).abs() < 1e-9);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_percentile_is_taken_over_the_given_pool() {
        let t = table(&[("甲", 10, 0, 0), ("乙", 20, 0, 0), ("丙", 30, 0, 0), ("丁", 40, 0, 0)]);
        let gate = GateEvaluator::new(
            PresenceGate::default(),
            FrequencyGate::percentile(0.5).unwrap(),
            RankColumn::PpmWeighted,
        );

        let full = gate.apply(t.rows().iter().collect());
        assert_eq!(full.survivors.len(), 2);

        // Removing the top row from the pool lowers the cut.
        let pool: Vec<_> = t.rows().iter().filter(|r| r.word != "丁").collect();
        let narrowed = gate.apply(pool);
        assert!((narrowed.threshold.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(narrowed.survivors.len(), 2);
    }

    #[test]
    fn test_threshold_validation() {
        assert!(FrequencyGate::percentile(80.0).is_err());
        assert!(FrequencyGate::percentile(-0.1).is_err());
        assert!(FrequencyGate::floor(-1.0).is_err());
        assert!(FrequencyGate::floor(f64::NAN).is_err());
    }
}
