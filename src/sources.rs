// File: src/sources.rs
//! Source adapters: turn raw corpora into per-source token tallies.

use crate::categories::CategoryFile;
use crate::core::frequency::{FrequencyTable, FrequencyTableBuilder, SourceTally};
use crate::core::tokenizer::{only_cjk, Tokenizer};
use crate::core::types::{Source, SourceWeights};
use crate::error::{ExpandError, ExpandResult};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Which corpora a `--build-freq` run reads.
#[derive(Debug, Clone)]
pub struct CorpusRequest {
    /// Reference lexicon file, when `--include-hkcancor` is given.
    pub hkcancor: Option<PathBuf>,
    /// Comma-separated glob patterns for subtitle / text files.
    pub subtitles_glob: Option<String>,
    pub tokenizer: Tokenizer,
}

/// Reads the reference lexicon: `word<TAB>count` lines, `#` comments, and an
/// optional `#total<TAB>N` line declaring the corpus size.
pub fn load_lexicon(path: &Path) -> ExpandResult<SourceTally> {
    if !path.is_file() {
        return Err(ExpandError::LexiconMissing(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    Ok(parse_lexicon(&text))
}

pub fn parse_lexicon(text: &str) -> SourceTally {
    let mut tally = SourceTally::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix("#total") {
            match rest.trim().parse::<u64>() {
                Ok(total) => tally.declare_total(total),
                Err(_) => tracing::warn!(line = line_no + 1, "unreadable #total declaration"),
            }
            continue;
        }
        if line.starts_with('#') {
            continue;
        }

        let mut fields = line.split('\t');
        let (Some(word), Some(count)) = (fields.next(), fields.next()) else {
            tracing::warn!(line = line_no + 1, "lexicon line without a count, skipped");
            continue;
        };
        let Ok(count) = count.trim().parse::<u64>() else {
            tracing::warn!(line = line_no + 1, count, "lexicon count is not a number, skipped");
            continue;
        };
        tally.add(&only_cjk(word), count);
    }
    tally
}

/// Expands comma-separated glob patterns into the regular files they match,
/// sorted and without duplicates.
pub fn expand_globs(patterns: &str) -> ExpandResult<Vec<PathBuf>> {
    let mut files = BTreeSet::new();
    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let entries = glob::glob(pattern).map_err(|e| ExpandError::InvalidGlob {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    files.insert(path);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "unreadable glob entry"),
            }
        }
    }
    Ok(files.into_iter().collect())
}

/// Tokenizes every file into one tally. Unreadable files are skipped.
pub fn subtitle_tally(paths: &[PathBuf], tokenizer: &Tokenizer) -> SourceTally {
    let mut tally = SourceTally::new();
    for path in paths {
        match std::fs::read(path) {
            Ok(bytes) => tokenizer.count_into(&String::from_utf8_lossy(&bytes), &mut tally),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file"),
        }
    }
    tally
}

/// One hit per category a word belongs to.
pub fn app_tally(categories: &CategoryFile) -> SourceTally {
    let mut tally = SourceTally::new();
    for word in categories.all_memberships() {
        tally.add(&word, 1);
    }
    tally
}

/// Full rebuild from the requested corpora. The app signal is folded in when
/// a category file is available.
pub fn build_frequency_table(
    request: &CorpusRequest,
    categories: Option<&CategoryFile>,
    weights: SourceWeights,
) -> ExpandResult<FrequencyTable> {
    if request.hkcancor.is_none() && request.subtitles_glob.is_none() {
        return Err(ExpandError::NoCorpusData(
            "no corpus requested (use --include-hkcancor and/or --subtitles-glob)".to_string(),
        ));
    }

    let mut builder = FrequencyTableBuilder::new();
    let mut corpus_tokens = 0;

    if let Some(path) = &request.hkcancor {
        let tally = load_lexicon(path)?;
        tracing::info!(
            path = %path.display(),
            words = tally.distinct_words(),
            tokens = tally.total_tokens(),
            "reference lexicon loaded"
        );
        corpus_tokens += tally.total_tokens();
        builder = builder.with_source(Source::HkCanCor, tally);
    }

    if let Some(patterns) = &request.subtitles_glob {
        let files = expand_globs(patterns)?;
        tracing::info!(files = files.len(), patterns = %patterns, "subtitle glob expanded");
        if files.is_empty() {
            return Err(ExpandError::EmptySubtitleGlob(patterns.clone()));
        }
        let tally = subtitle_tally(&files, &request.tokenizer);
        tracing::info!(
            words = tally.distinct_words(),
            tokens = tally.total_tokens(),
            "subtitles tokenized"
        );
        corpus_tokens += tally.total_tokens();
        builder = builder.with_source(Source::Subtitles, tally);
    }

    if corpus_tokens == 0 {
        return Err(ExpandError::NoCorpusData(
            "the requested corpora contain no tokens".to_string(),
        ));
    }

    if let Some(categories) = categories {
        builder = builder.with_source(Source::App, app_tally(categories));
    }
    Ok(builder.build(weights))
}

/// Cheap rebuild from the category file alone.
pub fn refresh_frequency_table(
    categories: &CategoryFile,
    weights: SourceWeights,
) -> ExpandResult<FrequencyTable> {
    let tally = app_tally(categories);
    if tally.is_empty() {
        return Err(ExpandError::NoCorpusData(
            "the category file holds no words to bootstrap from".to_string(),
        ));
    }
    tracing::info!(words = tally.distinct_words(), "bootstrapping from categories");
    Ok(FrequencyTableBuilder::new()
        .with_source(Source::App, tally)
        .build(weights))
}
