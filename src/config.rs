//! Run configuration
//!
//! Defaults can be overridden from a TOML file passed with `--config`, then
//! field by field from command-line flags.

use crate::core::engine::DEFAULT_TOP_N;
use crate::core::filters::{
    CandidateFilter, DEFAULT_MAX_WORD_CHARS, DEFAULT_SKIP_CATEGORIES, DEFAULT_STOPLIST,
};
use crate::core::gate::{FrequencyGate, GateEvaluator, PresenceGate};
use crate::core::tokenizer::Tokenizer;
use crate::core::types::{RankColumn, Source, SourceWeights, DEFAULT_WEIGHTS};
use crate::error::{ExpandError, ExpandResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Complete configuration of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpanderConfig {
    pub paths: PathsConfig,
    pub weights: WeightsConfig,
    pub gates: GatesConfig,
    pub tokenizer: TokenizerConfig,
    pub filters: FiltersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub categories: PathBuf,
    pub frequency: PathBuf,
    pub state: PathBuf,
    pub hkcancor: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            categories: PathBuf::from("categories.yaml"),
            frequency: PathBuf::from("data/frequency/cantonese_wordfreq.bin"),
            state: PathBuf::from("data/frequency/category_expansion_state.json"),
            hkcancor: PathBuf::from("data/frequency/hkcancor_lexicon.tsv"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    pub hkcancor: f64,
    pub subtitles: f64,
    pub app: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            hkcancor: DEFAULT_WEIGHTS.hkcancor,
            subtitles: DEFAULT_WEIGHTS.subtitles,
            app: DEFAULT_WEIGHTS.app,
        }
    }
}

impl WeightsConfig {
    pub fn as_weights(&self) -> SourceWeights {
        SourceWeights::new(self.hkcancor, self.subtitles, self.app)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatesConfig {
    pub hkc_min: u64,
    pub sub_min: u64,
    pub app_min: u64,
    pub ppm_min: f64,
    pub percentile: f64,
    /// `false` selects the ppm floor instead of the percentile cut.
    pub use_percentile: bool,
    pub rank_column: RankColumn,
    /// Signed so a negative value is reported instead of failing to parse.
    pub top_n: i64,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            hkc_min: 0,
            sub_min: 0,
            app_min: 0,
            ppm_min: 2.0,
            percentile: 0.80,
            use_percentile: true,
            rank_column: RankColumn::PpmWeighted,
            top_n: DEFAULT_TOP_N as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { min_len: 1, max_len: 4 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    pub stoplist: Vec<String>,
    pub skip_categories: Vec<String>,
    pub max_word_chars: usize,
    /// category -> hint characters, e.g. `colors = "紅藍綠色"`
    pub category_hints: HashMap<String, String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            stoplist: DEFAULT_STOPLIST.iter().map(|s| s.to_string()).collect(),
            skip_categories: DEFAULT_SKIP_CATEGORIES.iter().map(|s| s.to_string()).collect(),
            max_word_chars: DEFAULT_MAX_WORD_CHARS,
            category_hints: HashMap::new(),
        }
    }
}

/// Gate flags as given on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateOverrides {
    pub pct: Option<f64>,
    pub no_pct: bool,
    pub ppm_min: Option<f64>,
    pub top_n: Option<i64>,
}

impl ExpanderConfig {
    /// Loads `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> ExpandResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| ExpandError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> ExpandResult<()> {
        for source in Source::ALL {
            let weight = self.weights.as_weights().get(source);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ExpandError::InvalidThreshold(format!(
                    "weight for {} must be a non-negative number, got {weight}",
                    source.column_suffix()
                )));
            }
        }
        FrequencyGate::floor(self.gates.ppm_min)?;
        FrequencyGate::percentile(self.gates.percentile)?;
        Tokenizer::new(self.tokenizer.min_len, self.tokenizer.max_len)?;
        self.top_n()?;
        Ok(())
    }

    /// Proposals per category.
    pub fn top_n(&self) -> ExpandResult<usize> {
        usize::try_from(self.gates.top_n).map_err(|_| {
            ExpandError::InvalidThreshold(format!(
                "top-n must not be negative, got {}",
                self.gates.top_n
            ))
        })
    }

    /// Folds the command-line gate flags into the config.
    ///
    /// `--no-pct` or an explicit `--ppm-min` selects the floor; `--pct` selects
    /// the percentile. Asking for both is an error. A negative `--top-n` is
    /// rejected here as well.
    pub fn apply_gate_overrides(&mut self, overrides: GateOverrides) -> ExpandResult<()> {
        if let Some(top_n) = overrides.top_n {
            self.gates.top_n = top_n;
            self.top_n()?;
        }
        let wants_floor = overrides.no_pct || overrides.ppm_min.is_some();
        if let Some(pct) = overrides.pct {
            if wants_floor {
                return Err(ExpandError::ThresholdConflict(
                    "--pct cannot be combined with --no-pct or --ppm-min".to_string(),
                ));
            }
            self.gates.percentile = pct;
            self.gates.use_percentile = true;
        }
        if let Some(ppm_min) = overrides.ppm_min {
            self.gates.ppm_min = ppm_min;
        }
        if wants_floor {
            self.gates.use_percentile = false;
        }
        Ok(())
    }

    pub fn frequency_gate(&self) -> ExpandResult<FrequencyGate> {
        if self.gates.use_percentile {
            FrequencyGate::percentile(self.gates.percentile)
        } else {
            FrequencyGate::floor(self.gates.ppm_min)
        }
    }

    pub fn gate_evaluator(&self) -> ExpandResult<GateEvaluator> {
        Ok(GateEvaluator::new(
            PresenceGate::new(self.gates.hkc_min, self.gates.sub_min, self.gates.app_min),
            self.frequency_gate()?,
            self.gates.rank_column,
        ))
    }

    pub fn tokenizer(&self) -> ExpandResult<Tokenizer> {
        Tokenizer::new(self.tokenizer.min_len, self.tokenizer.max_len)
    }

    pub fn candidate_filter(&self) -> CandidateFilter {
        CandidateFilter::new(
            self.filters.stoplist.iter().cloned(),
            self.filters.skip_categories.iter().cloned(),
            self.filters.max_word_chars,
            &self.filters.category_hints,
        )
    }
}
