// src/core/types.rs
use crate::error::{ExpandError, ExpandResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the corpora a frequency table is merged from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    /// The reference lexicon with known per-word counts.
    HkCanCor,
    /// Subtitle and plain-text files matched by a glob.
    Subtitles,
    /// Current category membership, used as a bootstrap signal.
    App,
}

impl Source {
    pub const ALL: [Source; 3] = [Source::HkCanCor, Source::Subtitles, Source::App];

    /// Column suffix used in `count_*` / `ppm_*` names.
    pub fn column_suffix(self) -> &'static str {
        match self {
            Source::HkCanCor => "hkcancor",
            Source::Subtitles => "subtitles",
            Source::App => "app",
        }
    }
}

/// A value carried once per source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerSource<T> {
    pub hkcancor: T,
    pub subtitles: T,
    pub app: T,
}

impl<T: Copy> PerSource<T> {
    pub fn new(hkcancor: T, subtitles: T, app: T) -> Self {
        Self { hkcancor, subtitles, app }
    }

    pub fn get(&self, source: Source) -> T {
        match source {
            Source::HkCanCor => self.hkcancor,
            Source::Subtitles => self.subtitles,
            Source::App => self.app,
        }
    }

    pub fn get_mut(&mut self, source: Source) -> &mut T {
        match source {
            Source::HkCanCor => &mut self.hkcancor,
            Source::Subtitles => &mut self.subtitles,
            Source::App => &mut self.app,
        }
    }
}

/// Raw hits of one word in each source.
pub type SourceCounts = PerSource<u64>;
/// Total token count of each source, the ppm denominator.
pub type Denominators = PerSource<u64>;
/// Linear weight applied to each source's ppm.
pub type SourceWeights = PerSource<f64>;

/// Reference lexicon first, subtitles moderately, the app signal barely.
pub const DEFAULT_WEIGHTS: SourceWeights = PerSource {
    hkcancor: 1.0,
    subtitles: 0.35,
    app: 0.10,
};

/// One row per distinct word of the merged frequency table.
/// `ppm_raw` and `ppm_weighted` are always derived from `counts`, the
/// table denominators and the weights in effect; they are never read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct WordFrequencyRow {
    pub word: String,
    pub counts: SourceCounts,
    pub ppm_raw: PerSource<f64>,
    pub ppm_weighted: f64,
}

impl WordFrequencyRow {
    pub fn count(&self, source: Source) -> u64 {
        self.counts.get(source)
    }

    /// The value this row is gated and ranked by.
    pub fn rank_value(&self, column: RankColumn) -> f64 {
        match column {
            RankColumn::PpmWeighted => self.ppm_weighted,
            RankColumn::Ppm(source) => self.ppm_raw.get(source),
        }
    }
}

/// Column used by the frequency gate and for sorting candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RankColumn {
    #[default]
    PpmWeighted,
    Ppm(Source),
}

impl fmt::Display for RankColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankColumn::PpmWeighted => f.write_str("ppm_weighted"),
            RankColumn::Ppm(source) => write!(f, "ppm_{}", source.column_suffix()),
        }
    }
}

impl FromStr for RankColumn {
    type Err = ExpandError;

    fn from_str(s: &str) -> ExpandResult<Self> {
        // The short names are the column names of older frequency tables.
        match s.trim() {
            "ppm_weighted" | "ppm" => Ok(RankColumn::PpmWeighted),
            "ppm_hkcancor" | "ppm_hkc" => Ok(RankColumn::Ppm(Source::HkCanCor)),
            "ppm_subtitles" | "ppm_sub" => Ok(RankColumn::Ppm(Source::Subtitles)),
            "ppm_app" => Ok(RankColumn::Ppm(Source::App)),
            other => Err(ExpandError::UnknownRankColumn(other.to_string())),
        }
    }
}

impl TryFrom<String> for RankColumn {
    type Error = ExpandError;

    fn try_from(value: String) -> ExpandResult<Self> {
        value.parse()
    }
}

impl From<RankColumn> for String {
    fn from(value: RankColumn) -> Self {
        value.to_string()
    }
}
