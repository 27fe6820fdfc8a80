mod session;

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{constants::POW_DEFAULT_DIFFICULTY, ChainConfig, Difficulty};
use session::{OutputFormat, RunOptions, DEFAULT_DEMO_PAYLOADS};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Build, mine and validate a hash-linked ledger")]
struct Cli {
    /// Leading zero hex digits required in every block hash (0-63)
    #[arg(long, global = true, default_value_t = POW_DEFAULT_DIFFICULTY)]
    difficulty: u32,

    /// Give up on a block after this many nonces
    #[arg(long, global = true)]
    max_attempts: Option<u64>,

    /// Output format for the final chain dump
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mine a fixed list of payloads
    Demo {
        /// Payload for one block; repeat for more blocks
        #[arg(long = "payload")]
        payloads: Vec<String>,
    },
    /// Prompt for a block count and read one payload per line from stdin
    Interactive,
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let difficulty = Difficulty::new(cli.difficulty).context("invalid --difficulty")?;
    let mut config = ChainConfig::new(difficulty);
    if let Some(max_attempts) = cli.max_attempts {
        config = config.with_max_attempts(max_attempts);
    }
    let opts = RunOptions {
        config,
        format: cli.format,
    };

    let mut out = io::stdout().lock();
    match cli.cmd {
        Command::Demo { payloads } => {
            let payloads = if payloads.is_empty() {
                DEFAULT_DEMO_PAYLOADS.iter().map(|p| p.to_string()).collect()
            } else {
                payloads
            };
            session::run_demo(&payloads, &opts, &mut out)?;
        }
        Command::Interactive => {
            session::run_interactive(io::stdin().lock(), &mut out, &opts)?;
        }
    }
    Ok(())
}
