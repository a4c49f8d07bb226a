use clap::{ArgGroup, Parser};
use crossterm::style::Stylize;
use std::io::{stdout, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};
use vocab_core::config::{ExpanderConfig, GateOverrides};
use vocab_core::pipeline::{self, RunMode};
use vocab_core::report::write_outcome;
use vocab_core::sources::CorpusRequest;
use vocab_core::ExpandResult;

/// Expand categories.yaml with high-frequency colloquial items
#[derive(Parser, Debug)]
#[command(name = "expand_categories", version)]
#[command(group(ArgGroup::new("mode").multiple(false).args(["dry_run", "commit", "undo", "build_freq", "refresh_freq"])))]
struct Cli {
    /// TOML file with defaults for every option below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to categories.yaml
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Path to the frequency table
    #[arg(long)]
    freq_file: Option<PathBuf>,

    /// Path to the expansion state JSON
    #[arg(long)]
    state_file: Option<PathBuf>,

    /// Comma-separated category subset to process
    #[arg(long, value_delimiter = ',')]
    only: Vec<String>,

    /// Number of new items per category
    #[arg(long, allow_negative_numbers = true)]
    top_n: Option<i64>,

    /// Percentile cutoff for the dynamic threshold (0-1 range)
    #[arg(long)]
    pct: Option<f64>,

    /// Disable the percentile threshold and use the ppm floor
    #[arg(long)]
    no_pct: bool,

    /// Minimum ppm (selects the floor gate)
    #[arg(long)]
    ppm_min: Option<f64>,

    /// Minimum HKCanCor hits for the presence gate
    #[arg(long)]
    hkc_min: Option<u64>,

    /// Minimum subtitle hits for the presence gate
    #[arg(long)]
    sub_min: Option<u64>,

    /// Minimum app hits for the presence gate
    #[arg(long)]
    app_min: Option<u64>,

    /// Weight of the HKCanCor ppm when ranking
    #[arg(long)]
    hkc_weight: Option<f64>,

    /// Weight of the subtitles ppm when ranking
    #[arg(long)]
    sub_weight: Option<f64>,

    /// Weight of the in-app ppm when ranking
    #[arg(long)]
    app_weight: Option<f64>,

    /// Column to rank by (ppm_weighted, ppm_hkcancor, ppm_subtitles, ppm_app)
    #[arg(long)]
    rank_col: Option<String>,

    /// Preview proposed additions only (default)
    #[arg(long)]
    dry_run: bool,

    /// Write changes to categories.yaml and state
    #[arg(long)]
    commit: bool,

    /// Remove previously added items recorded in state (respects --only)
    #[arg(long)]
    undo: bool,

    /// Build the frequency table from corpora
    #[arg(long)]
    build_freq: bool,

    /// Rebuild the frequency table from categories.yaml alone
    #[arg(long)]
    refresh_freq: bool,

    /// Include the reference lexicon in --build-freq
    #[arg(long)]
    include_hkcancor: bool,

    /// Reference lexicon file (word<TAB>count)
    #[arg(long)]
    hkcancor_file: Option<PathBuf>,

    /// Glob(s) for subtitles, comma-separated (e.g. data/subtitles/**/*.srt,data/subtitles/**/*.txt)
    #[arg(long)]
    subtitles_glob: Option<String>,

    /// Min token length considered in the frequency build
    #[arg(long)]
    min_len: Option<usize>,

    /// Max token length considered in the frequency build
    #[arg(long)]
    max_len: Option<usize>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match execute(cli) {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
            e.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(cli: Cli) -> ExpandResult<()> {
    let mut config = ExpanderConfig::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli)?;

    let mode = if cli.build_freq {
        RunMode::BuildFrequency(CorpusRequest {
            hkcancor: cli.include_hkcancor.then(|| config.paths.hkcancor.clone()),
            subtitles_glob: cli.subtitles_glob.clone().filter(|g| !g.trim().is_empty()),
            tokenizer: config.tokenizer()?,
        })
    } else if cli.refresh_freq {
        RunMode::RefreshFrequency
    } else if cli.undo {
        RunMode::Undo
    } else if cli.commit {
        RunMode::Commit
    } else {
        RunMode::DryRun
    };

    let only: Vec<String> = cli
        .only
        .iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    let only = (!only.is_empty()).then_some(only.as_slice());

    let outcome = pipeline::run(&config, mode, only)?;

    let mut out = stdout().lock();
    write_outcome(&mut out, &outcome, config.gates.rank_column)?;
    out.flush()?;
    Ok(())
}

fn apply_overrides(config: &mut ExpanderConfig, cli: &Cli) -> ExpandResult<()> {
    if let Some(path) = &cli.categories {
        config.paths.categories = path.clone();
    }
    if let Some(path) = &cli.freq_file {
        config.paths.frequency = path.clone();
    }
    if let Some(path) = &cli.state_file {
        config.paths.state = path.clone();
    }
    if let Some(path) = &cli.hkcancor_file {
        config.paths.hkcancor = path.clone();
    }

    if let Some(v) = cli.hkc_min {
        config.gates.hkc_min = v;
    }
    if let Some(v) = cli.sub_min {
        config.gates.sub_min = v;
    }
    if let Some(v) = cli.app_min {
        config.gates.app_min = v;
    }
    if let Some(column) = &cli.rank_col {
        config.gates.rank_column = column.parse()?;
    }
    config.apply_gate_overrides(GateOverrides {
        pct: cli.pct,
        no_pct: cli.no_pct,
        ppm_min: cli.ppm_min,
        top_n: cli.top_n,
    })?;

    if let Some(w) = cli.hkc_weight {
        config.weights.hkcancor = w;
    }
    if let Some(w) = cli.sub_weight {
        config.weights.subtitles = w;
    }
    if let Some(w) = cli.app_weight {
        config.weights.app = w;
    }

    if let Some(n) = cli.min_len {
        config.tokenizer.min_len = n;
    }
    if let Some(n) = cli.max_len {
        config.tokenizer.max_len = n;
    }
    Ok(())
}
