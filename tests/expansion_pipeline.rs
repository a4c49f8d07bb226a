//! End-to-end runs over artifacts in a temp directory.

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vocab_core::categories::CategoryFile;
use vocab_core::config::ExpanderConfig;
use vocab_core::core::engine::{Proposal, ProposalStatus};
use vocab_core::core::tokenizer::Tokenizer;
use vocab_core::pipeline::{run, RunMode, RunOutcome};
use vocab_core::sources::CorpusRequest;
use vocab_core::state::ExpansionState;
use vocab_core::ExpandError;

const CATEGORIES: &str = r#"greetings:
  - 你好
people:
  items:
    - 朋友
  examples_en:
    - friend
unassigned: []
"#;

const LEXICON: &str = "#total\t1000000\n你好\t50\n早晨\t40\n多謝\t30\n朋友\t20\n同事\t10\n拜拜\t5\n";

fn setup() -> (TempDir, ExpanderConfig) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("categories.yaml"), CATEGORIES).unwrap();
    fs::write(dir.path().join("lexicon.tsv"), LEXICON).unwrap();

    let mut config = ExpanderConfig::default();
    config.paths.categories = dir.path().join("categories.yaml");
    config.paths.frequency = dir.path().join("freq/wordfreq.bin");
    config.paths.state = dir.path().join("freq/state.json");
    config.paths.hkcancor = dir.path().join("lexicon.tsv");
    config.weights.app = 0.0;
    config.gates.hkc_min = 1;
    config.gates.sub_min = 0;
    config.gates.use_percentile = false;
    config.gates.ppm_min = 1.0;
    config.gates.top_n = 3;
    (dir, config)
}

fn lexicon_build(config: &ExpanderConfig) -> RunMode {
    RunMode::BuildFrequency(CorpusRequest {
        hkcancor: Some(config.paths.hkcancor.clone()),
        subtitles_glob: None,
        tokenizer: Tokenizer::new(1, 4).unwrap(),
    })
}

fn proposals(outcome: RunOutcome) -> Vec<Proposal> {
    match outcome {
        RunOutcome::Proposed { proposals, .. } => proposals,
        other => panic!("expected proposals, got {other:?}"),
    }
}

fn words_of<'a>(proposals: &'a [Proposal], category: &str) -> Vec<&'a str> {
    proposals
        .iter()
        .find(|p| p.category == category)
        .map(|p| p.picks.iter().map(|pick| pick.word.as_str()).collect())
        .unwrap_or_default()
}

fn greetings_only() -> Vec<String> {
    vec!["greetings".to_string()]
}

fn members(path: &Path, category: &str) -> Vec<String> {
    CategoryFile::load(path).unwrap().members(category)
}

#[test]
fn test_build_then_dry_run_is_read_only_and_repeatable() {
    let (_dir, config) = setup();
    run(&config, lexicon_build(&config), None).unwrap();
    assert!(config.paths.frequency.is_file());
    assert!(config.paths.frequency.with_extension("tsv").is_file());

    let before = fs::read(&config.paths.categories).unwrap();
    let first = proposals(run(&config, RunMode::DryRun, None).unwrap());
    let second = proposals(run(&config, RunMode::DryRun, None).unwrap());

    assert_eq!(first, second);
    assert_eq!(words_of(&first, "greetings"), vec!["早晨", "多謝", "朋友"]);
    assert_eq!(words_of(&first, "people"), vec!["你好", "早晨", "多謝"]);
    assert_eq!(
        first.iter().find(|p| p.category == "unassigned").unwrap().status,
        ProposalStatus::Skipped
    );
    assert_eq!(fs::read(&config.paths.categories).unwrap(), before);
    assert!(!config.paths.state.exists());
}

#[test]
fn test_commit_twice_never_duplicates() {
    let (_dir, config) = setup();
    run(&config, lexicon_build(&config), None).unwrap();
    let only = vec!["greetings".to_string()];

    run(&config, RunMode::Commit, Some(only.as_slice())).unwrap();
    assert_eq!(members(&config.paths.categories, "greetings"), vec!["你好", "早晨", "多謝", "朋友"]);
    assert_eq!(members(&config.paths.categories, "people"), vec!["朋友"]);

    let second = proposals(run(&config, RunMode::Commit, Some(only.as_slice())).unwrap());
    assert_eq!(words_of(&second, "greetings"), vec!["同事", "拜拜"]);

    let greetings = members(&config.paths.categories, "greetings");
    let mut unique = greetings.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), greetings.len());

    let file = CategoryFile::load(&config.paths.categories).unwrap();
    let state = ExpansionState::load(&config.paths.state).unwrap();
    assert_eq!(state.added("greetings").len(), 5);
    assert!(state.is_consistent_with(&file));
}

#[test]
fn test_undo_restores_previous_proposals() {
    let (_dir, config) = setup();
    run(&config, lexicon_build(&config), None).unwrap();

    let before = proposals(run(&config, RunMode::DryRun, None).unwrap());
    run(&config, RunMode::Commit, None).unwrap();

    let only = vec!["greetings".to_string()];
    match run(&config, RunMode::Undo, Some(only.as_slice())).unwrap() {
        RunOutcome::Undone(summary) => assert_eq!(summary.removed_members, 3),
        other => panic!("expected undo, got {other:?}"),
    }
    assert_eq!(members(&config.paths.categories, "greetings"), vec!["你好"]);
    // people was not targeted
    assert_eq!(members(&config.paths.categories, "people"), vec!["朋友", "你好", "早晨", "多謝"]);

    let after = proposals(run(&config, RunMode::DryRun, Some(only.as_slice())).unwrap());
    assert_eq!(words_of(&after, "greetings"), words_of(&before, "greetings"));
}

#[test]
fn test_undo_keeps_manual_words() {
    let (_dir, config) = setup();
    run(&config, lexicon_build(&config), None).unwrap();
    fs::write(&config.paths.categories, "greetings: [你好, 早晨, 多謝]\n").unwrap();
    fs::write(
        &config.paths.state,
        r#"{"categories": {"greetings": {"added_items": ["早晨", "多謝"]}}}"#,
    )
    .unwrap();

    let only = vec!["greetings".to_string()];
    run(&config, RunMode::Undo, Some(only.as_slice())).unwrap();

    assert_eq!(members(&config.paths.categories, "greetings"), vec!["你好"]);
    let state = ExpansionState::load(&config.paths.state).unwrap();
    assert!(state.added("greetings").is_empty());
}

#[test]
fn test_unknown_category_fails_before_any_write() {
    let (_dir, config) = setup();
    run(&config, lexicon_build(&config), None).unwrap();
    let before = fs::read(&config.paths.categories).unwrap();

    let only = vec!["greetings".to_string(), "nope".to_string()];
    let err = run(&config, RunMode::Commit, Some(only.as_slice())).unwrap_err();
    assert!(matches!(err, ExpandError::UnknownCategories(ref names) if names == &["nope"]));
    assert_eq!(err.exit_code(), 4);

    assert_eq!(fs::read(&config.paths.categories).unwrap(), before);
    assert!(!config.paths.state.exists());
}

#[test]
fn test_expansion_without_table_is_fatal() {
    let (_dir, config) = setup();
    for mode in [RunMode::DryRun, RunMode::Commit, RunMode::Undo] {
        let err = run(&config, mode, None).unwrap_err();
        assert!(matches!(err, ExpandError::FrequencyTableMissing(_)));
        assert_eq!(err.exit_code(), 2);
    }
}

#[test]
fn test_build_from_subtitles() {
    let (dir, mut config) = setup();
    let subs = dir.path().join("subs/season1");
    fs::create_dir_all(&subs).unwrap();
    fs::write(
        subs.join("ep1.srt"),
        "1\n00:00:01,000 --> 00:00:02,000\n早晨！早晨！\n\n2\n00:00:03,000 --> 00:00:04,000\n多謝\n",
    )
    .unwrap();
    fs::write(dir.path().join("subs/notes.txt"), "早晨").unwrap();

    let glob = format!(
        "{0}/subs/**/*.srt,{0}/subs/**/*.txt",
        dir.path().display()
    );
    let request = CorpusRequest {
        hkcancor: None,
        subtitles_glob: Some(glob),
        tokenizer: Tokenizer::new(2, 2).unwrap(),
    };
    run(&config, RunMode::BuildFrequency(request), None).unwrap();

    config.weights = vocab_core::config::WeightsConfig { hkcancor: 0.0, subtitles: 1.0, app: 0.0 };
    config.gates.hkc_min = 0;
    let out = proposals(run(&config, RunMode::DryRun, Some(greetings_only().as_slice())).unwrap());
    // 早晨 x3, 多謝 x1 out of 4 bigrams
    let greetings = &out[0];
    assert_eq!(greetings.picks[0].word, "早晨");
    assert!((greetings.picks[0].value - 750_000.0).abs() < 1e-6);
    assert_eq!(greetings.picks[1].word, "多謝");
}

#[test]
fn test_build_with_empty_glob_is_fatal() {
    let (dir, config) = setup();
    let request = CorpusRequest {
        hkcancor: Some(config.paths.hkcancor.clone()),
        subtitles_glob: Some(format!("{}/none/**/*.srt", dir.path().display())),
        tokenizer: Tokenizer::new(1, 4).unwrap(),
    };
    let err = run(&config, RunMode::BuildFrequency(request), None).unwrap_err();
    assert!(matches!(err, ExpandError::EmptySubtitleGlob(_)));
    assert!(!config.paths.frequency.exists());
}

#[test]
fn test_refresh_bootstraps_from_categories() {
    let (_dir, mut config) = setup();
    run(&config, RunMode::RefreshFrequency, None).unwrap();

    config.weights.app = 1.0;
    config.gates.hkc_min = 0;
    let out = proposals(run(&config, RunMode::DryRun, Some(greetings_only().as_slice())).unwrap());
    // Only the other categories' words are left to propose.
    assert_eq!(words_of(&out, "greetings"), vec!["朋友"]);
}

/// The percentile is taken over the category's own candidate pool, so the
/// same table yields a different cut for categories with different members.
#[test]
fn test_percentile_cut_is_scoped_to_category_pool() {
    let (dir, mut config) = setup();
    fs::write(&config.paths.hkcancor, "#total\t1000000\n甲\t10\n乙\t20\n丙\t30\n丁\t40\n").unwrap();
    fs::write(&config.paths.categories, "empty: []\nhas_top: [丁]\n").unwrap();
    run(&config, lexicon_build(&config), None).unwrap();

    config.gates.use_percentile = true;
    config.gates.percentile = 0.5;
    config.gates.top_n = 10;
    config.filters.stoplist.clear();
    let out = proposals(run(&config, RunMode::DryRun, None).unwrap());

    // pool 10,20,30,40 -> cut 25; pool 10,20,30 -> cut 20
    assert_eq!(words_of(&out, "empty"), vec!["丁", "丙"]);
    assert_eq!(words_of(&out, "has_top"), vec!["丙", "乙"]);
    assert!((out[0].threshold.unwrap() - 25.0).abs() < 1e-6);
    assert!((out[1].threshold.unwrap() - 20.0).abs() < 1e-6);
    drop(dir);
}

#[test]
fn test_refresh_then_dry_run_with_default_gates_proposes() {
    let dir = TempDir::new().unwrap();
    let categories = dir.path().join("categories.yaml");
    fs::write(&categories, "greetings: [你好, 早晨]\npeople: [朋友, 同事, 你好]\nfood: [飯, 茶]\n").unwrap();

    let mut config = ExpanderConfig::default();
    config.paths.categories = categories;
    config.paths.frequency = dir.path().join("wordfreq.bin");
    config.paths.state = dir.path().join("state.json");

    run(&config, RunMode::RefreshFrequency, None).unwrap();
    let out = proposals(run(&config, RunMode::DryRun, None).unwrap());

    assert_eq!(out.len(), 3);
    for proposal in &out {
        assert_eq!(proposal.status, ProposalStatus::Proposed, "{}", proposal.category);
        assert!(!proposal.picks.is_empty());
    }
    // 你好 sits in two categories, so it tops the app signal for food.
    assert_eq!(words_of(&out, "food"), vec!["你好"]);
}
