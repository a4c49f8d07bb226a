// File: src/pipeline.rs
//! One run of the tool, start to finish.
//!
//! Every mode loads and validates all of its inputs and computes the full
//! result before any artifact is written; writes go through
//! [`StagedWrites`] so they land together.

use crate::categories::CategoryFile;
use crate::config::ExpanderConfig;
use crate::core::engine::{
    apply_commit, apply_undo, select_categories, CategoryExpander, CommitSummary, Proposal,
    UndoSummary,
};
use crate::error::{ExpandError, ExpandResult};
use crate::persistence::{FrequencyStore, StagedWrites};
use crate::sources::{self, CorpusRequest};
use crate::state::ExpansionState;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum RunMode {
    /// Full rebuild of the frequency table from the requested corpora.
    BuildFrequency(CorpusRequest),
    /// Rebuild from the category file alone.
    RefreshFrequency,
    DryRun,
    Commit,
    Undo,
}

#[derive(Debug)]
pub enum RunOutcome {
    FrequencyBuilt {
        rows: usize,
        path: PathBuf,
        mirror: PathBuf,
    },
    Proposed {
        proposals: Vec<Proposal>,
        committed: Option<CommitSummary>,
    },
    Undone(UndoSummary),
}

pub fn run(config: &ExpanderConfig, mode: RunMode, only: Option<&[String]>) -> ExpandResult<RunOutcome> {
    config.validate()?;
    tracing::info!(
        categories = %config.paths.categories.display(),
        frequency = %config.paths.frequency.display(),
        state = %config.paths.state.display(),
        "artifact paths"
    );
    match mode {
        RunMode::BuildFrequency(request) => build_frequency(config, &request),
        RunMode::RefreshFrequency => refresh_frequency(config),
        RunMode::DryRun => expand(config, only, false),
        RunMode::Commit => expand(config, only, true),
        RunMode::Undo => undo(config, only),
    }
}

pub fn build_frequency(config: &ExpanderConfig, request: &CorpusRequest) -> ExpandResult<RunOutcome> {
    // The app signal is optional for a corpus build.
    let categories = if config.paths.categories.is_file() {
        Some(CategoryFile::load(&config.paths.categories)?)
    } else {
        tracing::warn!(
            path = %config.paths.categories.display(),
            "category file not found, building without the app source"
        );
        None
    };
    let table = sources::build_frequency_table(
        request,
        categories.as_ref(),
        config.weights.as_weights(),
    )?;
    save_table(config, &table)
}

pub fn refresh_frequency(config: &ExpanderConfig) -> ExpandResult<RunOutcome> {
    let categories = CategoryFile::load(&config.paths.categories)?;
    let table = sources::refresh_frequency_table(&categories, config.weights.as_weights())?;
    save_table(config, &table)
}

fn save_table(
    config: &ExpanderConfig,
    table: &crate::core::frequency::FrequencyTable,
) -> ExpandResult<RunOutcome> {
    let store = FrequencyStore::new(&config.paths.frequency);
    store.save(table)?;
    tracing::info!(rows = table.len(), path = %store.path().display(), "frequency table written");
    Ok(RunOutcome::FrequencyBuilt {
        rows: table.len(),
        path: store.path().to_path_buf(),
        mirror: store.mirror_path(),
    })
}

pub fn expand(config: &ExpanderConfig, only: Option<&[String]>, commit: bool) -> ExpandResult<RunOutcome> {
    let gates = config.gate_evaluator()?;
    let mut categories = CategoryFile::load(&config.paths.categories)?;
    let selected = select_categories(&categories, only)?;

    let weights = config.weights.as_weights();
    let table = FrequencyStore::new(&config.paths.frequency).load(weights)?;
    if table.is_empty() {
        return Err(ExpandError::NoCorpusData("the frequency table has no rows".to_string()));
    }
    tracing::info!(
        hkcancor = weights.hkcancor,
        subtitles = weights.subtitles,
        app = weights.app,
        rank_column = %gates.rank_column,
        rows = table.len(),
        "weighting"
    );

    let filter = config.candidate_filter();
    let expander = CategoryExpander::new(&table, gates, &filter, config.top_n()?);
    let proposals = expander.propose(&categories, &selected);

    if !commit {
        return Ok(RunOutcome::Proposed { proposals, committed: None });
    }

    let mut state = ExpansionState::load(&config.paths.state)?;
    let summary = apply_commit(&mut categories, &mut state, &proposals);
    if summary.total_added() > 0 || !summary.pruned.is_empty() {
        write_categories_and_state(config, &categories, &state)?;
    }
    tracing::info!(
        categories = summary.added.len(),
        words = summary.total_added(),
        "commit finished"
    );
    Ok(RunOutcome::Proposed { proposals, committed: Some(summary) })
}

pub fn undo(config: &ExpanderConfig, only: Option<&[String]>) -> ExpandResult<RunOutcome> {
    let store = FrequencyStore::new(&config.paths.frequency);
    if !store.exists() {
        return Err(ExpandError::FrequencyTableMissing(store.path().to_path_buf()));
    }
    let mut categories = CategoryFile::load(&config.paths.categories)?;
    let selected = select_categories(&categories, only)?;
    let mut state = ExpansionState::load(&config.paths.state)?;

    let summary = apply_undo(&mut categories, &mut state, &selected);
    if !summary.is_empty() {
        write_categories_and_state(config, &categories, &state)?;
    }
    Ok(RunOutcome::Undone(summary))
}

fn write_categories_and_state(
    config: &ExpanderConfig,
    categories: &CategoryFile,
    state: &ExpansionState,
) -> ExpandResult<()> {
    let yaml = categories.to_yaml()?;
    let json = state.to_json()?;

    let mut writes = StagedWrites::new();
    writes.stage(&config.paths.categories, yaml.as_bytes())?;
    writes.stage(&config.paths.state, json.as_bytes())?;
    writes.commit()?;
    Ok(())
}
