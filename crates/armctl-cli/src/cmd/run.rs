use crate::output::{degrees, print_json, print_table};
use anyhow::Context;
use armctl_core::delay::{CancelToken, ThreadDelay};
use armctl_core::instruction::InstructionSource;
use armctl_core::sequencer::{RunOutcome, RunReport, Sequencer};
use std::path::{Path, PathBuf};

pub struct RunOptions {
    pub file: Option<PathBuf>,
    pub settle: Option<f64>,
    pub divisions: Option<u32>,
}

/// Returned when the operator stops the run; `main` maps it to exit status 130.
#[derive(Debug, thiserror::Error)]
#[error("Stopped prematurely after {executed} of {total} instructions.")]
pub struct Interrupted {
    pub executed: usize,
    pub total: usize,
}

pub fn run(root: &Path, opts: RunOptions, json: bool) -> anyhow::Result<()> {
    let mut config = super::load_config(root)?;
    if let Some(settle) = opts.settle {
        config.timing.settle_seconds = settle;
    }
    if let Some(divisions) = opts.divisions {
        config.timing.divisions = divisions;
    }
    super::ensure_valid(&config)?;

    let calibration = config
        .calibration_model()
        .context("failed to build calibration model")?;
    let mut registry = config.simulated_registry();
    let source = super::instruction_source(root, &config, opts.file);

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || handler_token.cancel())
        .context("failed to install Ctrl-C handler")?;

    tracing::info!(root = %root.display(), "starting arm sequence");
    let report = Sequencer::new(&calibration, &mut registry, ThreadDelay::default())
        .with_timing(config.timing.clone())
        .with_cancel_token(cancel)
        .run(&source)
        .with_context(|| format!("sequence from {} aborted", source.describe()))?;

    if json {
        print_json(&report)?;
    } else {
        print_summary(&report);
    }

    match report.outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Interrupted => Err(Interrupted {
            executed: report.instructions_executed,
            total: report.instructions_total,
        }
        .into()),
    }
}

fn print_summary(report: &RunReport) {
    let elapsed = report.finished_at - report.started_at;
    match report.outcome {
        RunOutcome::Completed => println!(
            "Completed {} instructions ({} servo commands) in {:.1}s.",
            report.instructions_total,
            report.commands_issued,
            elapsed.num_milliseconds() as f64 / 1000.0
        ),
        RunOutcome::Interrupted => {
            let phase = if report.interrupted_while_settling {
                "while settling after"
            } else {
                "during"
            };
            println!(
                "Interrupted {phase} '{}' ({} servo commands issued).",
                report.interrupted_during.as_deref().unwrap_or("?"),
                report.commands_issued
            )
        }
    }

    let rows = report
        .final_angles
        .iter()
        .map(|(joint, angle)| vec![joint.to_string(), joint.role().to_string(), degrees(*angle)])
        .collect();
    print_table(&["JOINT", "ROLE", "INPUT"], rows);
}
