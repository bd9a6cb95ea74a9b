mod cmd;
mod output;
mod root;

use armctl_core::joint::JointId;
use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "armctl",
    about = "Drive a servo arm through a scripted sequence of calibrated poses",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest directory holding arm.yaml)
    #[arg(long, global = true, env = "ARMCTL_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default arm.yaml and a sample instruction file
    Init,

    /// Execute the instruction file against the arm
    Run {
        /// Instruction file (default: the one named in arm.yaml)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Override the pause after each instruction, in seconds
        #[arg(long)]
        settle: Option<f64>,

        /// Override the number of interpolation slices per instruction
        #[arg(long)]
        divisions: Option<u32>,
    },

    /// Show the servo input every instruction resolves to, without moving anything
    Plan {
        /// Instruction file (default: the one named in arm.yaml)
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Convert one joint angle through its calibration
    Convert {
        joint: JointId,

        #[arg(allow_negative_numbers = true)]
        angle: f64,

        /// Treat ANGLE as a servo input and return the actual angle
        #[arg(long)]
        inverse: bool,
    },

    /// Show the calibration table
    Calibration,

    /// Inspect the arm configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root, cli.json),
        Commands::Run {
            file,
            settle,
            divisions,
        } => cmd::run::run(
            &root,
            cmd::run::RunOptions {
                file,
                settle,
                divisions,
            },
            cli.json,
        ),
        Commands::Plan { file } => cmd::plan::run(&root, file, cli.json),
        Commands::Convert {
            joint,
            angle,
            inverse,
        } => cmd::convert::run(&root, joint, angle, inverse, cli.json),
        Commands::Calibration => cmd::calibration::run(&root, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        if let Some(stop) = e.downcast_ref::<cmd::run::Interrupted>() {
            eprintln!("\n{stop}");
            std::process::exit(130);
        }
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
