// File: src/report.rs
use crate::core::engine::{Proposal, ProposalStatus};
use crate::core::types::RankColumn;
use crate::pipeline::RunOutcome;
use crossterm::style::Stylize;
use std::io::{self, Write};

/// Proposals shown per category line.
const PREVIEW_LIMIT: usize = 10;

/// Writes the human-facing summary of a run.
pub fn write_outcome<W: Write>(out: &mut W, outcome: &RunOutcome, rank_column: RankColumn) -> io::Result<()> {
    match outcome {
        RunOutcome::FrequencyBuilt { rows, path, mirror } => {
            writeln!(
                out,
                "{} Built frequency table with {} rows at {} (mirror: {})",
                "[INFO]".cyan(),
                rows,
                path.display(),
                mirror.display()
            )
        }
        RunOutcome::Proposed { proposals, committed } => {
            for proposal in proposals {
                write_proposal(out, proposal, rank_column)?;
            }
            match committed {
                None => writeln!(
                    out,
                    "\n{} No changes written. Use --commit to apply.",
                    "[DRY-RUN]".yellow().bold()
                ),
                Some(summary) if summary.total_added() == 0 => {
                    writeln!(out, "\n{} Nothing to add.", "[INFO]".cyan())
                }
                Some(summary) => writeln!(
                    out,
                    "\n{} Added {} words across {} categories.",
                    "[COMMIT]".green().bold(),
                    summary.total_added(),
                    summary.added.len()
                ),
            }
        }
        RunOutcome::Undone(summary) => {
            if summary.is_empty() {
                return writeln!(out, "{} No recorded auto-added items to remove.", "[UNDO]".yellow());
            }
            for (category, words) in &summary.cleared {
                writeln!(out, "{} {}: -{} ({})", "[UNDO]".yellow(), category, words.len(), words.join(", "))?;
            }
            writeln!(
                out,
                "{} Removed auto-added items from {} categories.",
                "[UNDO]".yellow().bold(),
                summary.cleared.len()
            )
        }
    }
}

fn write_proposal<W: Write>(out: &mut W, proposal: &Proposal, rank_column: RankColumn) -> io::Result<()> {
    let threshold = proposal
        .threshold
        .map(|t| format!("{t:.3}"))
        .unwrap_or_else(|| "n/a".to_string());

    match proposal.status {
        ProposalStatus::Skipped => writeln!(out, "{} {}: skipped", "[SKIP]".dark_grey(), proposal.category),
        ProposalStatus::Nothing => writeln!(
            out,
            "{} {}: 0 items proposed (thr={}, existing={}, pool={})",
            "[INFO]".cyan(),
            proposal.category,
            threshold,
            proposal.existing,
            proposal.pool_size
        ),
        ProposalStatus::Proposed => {
            writeln!(
                out,
                "{} {}: +{} items proposed (thr={}, pool={})",
                "[OK]".green(),
                proposal.category,
                proposal.picks.len(),
                threshold,
                proposal.pool_size
            )?;
            let preview: Vec<String> = proposal
                .picks
                .iter()
                .take(PREVIEW_LIMIT)
                .map(|pick| format!("{} ({}={:.3})", pick.word, rank_column, pick.value))
                .collect();
            writeln!(out, "      -> {}", preview.join(", "))
        }
    }
}
