//! Console driver: mines blocks for a list of payloads and prints the chain.
//!
//! Input and output are passed in, so the same code serves stdin/stdout in
//! the binary and in-memory buffers in tests.

use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use ledger_core::{Block, Chain, ChainConfig};
use serde::Serialize;
use tracing::info;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub config: ChainConfig,
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct Report<'a> {
    difficulty: u32,
    valid: bool,
    violation: Option<String>,
    blocks: &'a [Block],
}

pub const DEFAULT_DEMO_PAYLOADS: [&str; 3] = ["Block 1", "Block 2", "Block 3"];

/// Mine genesis plus one block per payload, then print the summary.
pub fn run_demo<W: Write>(payloads: &[String], opts: &RunOptions, out: &mut W) -> Result<Chain> {
    let mut chain = new_chain(opts, out)?;
    for payload in payloads {
        mine_one(&mut chain, payload.clone(), opts, out)?;
    }
    print_summary(&chain, opts, out)?;
    Ok(chain)
}

/// Prompt for a block count, then read one line of payload per block.
pub fn run_interactive<R: BufRead, W: Write>(
    mut input: R,
    out: &mut W,
    opts: &RunOptions,
) -> Result<Chain> {
    let prompt = opts.format == OutputFormat::Text;

    if prompt {
        write!(out, "Enter the number of blocks: ")?;
        out.flush()?;
    }
    let line = read_line(&mut input)?.context("no block count given")?;
    let count: usize = line
        .trim()
        .parse()
        .with_context(|| format!("invalid block count {:?}", line.trim()))?;

    let mut payloads = Vec::with_capacity(count);
    for i in 1..=count {
        if prompt {
            write!(out, "Enter data for block {i}: ")?;
            out.flush()?;
        }
        match read_line(&mut input)? {
            Some(payload) => payloads.push(payload),
            None => bail!("input ended before data for block {i}"),
        }
    }
    if prompt {
        writeln!(out)?;
    }

    run_demo(&payloads, opts, out)
}

fn new_chain<W: Write>(opts: &RunOptions, out: &mut W) -> Result<Chain> {
    let chain = Chain::new(opts.config).context("mining genesis block")?;
    if opts.format == OutputFormat::Text {
        writeln!(out, "Genesis block created!")?;
    }
    Ok(chain)
}

fn mine_one<W: Write>(
    chain: &mut Chain,
    payload: String,
    opts: &RunOptions,
    out: &mut W,
) -> Result<()> {
    let position = chain.len();
    if opts.format == OutputFormat::Text {
        writeln!(out, "Mining block {position}...")?;
    }
    let block = chain
        .append(payload)
        .with_context(|| format!("mining block {position}"))?;
    info!(position, nonce = block.nonce(), "block appended");
    if opts.format == OutputFormat::Text {
        writeln!(out, "Block mined! Hash: {}", block.hash())?;
    }
    Ok(())
}

fn print_summary<W: Write>(chain: &Chain, opts: &RunOptions, out: &mut W) -> Result<()> {
    let verdict = chain.validate();
    match opts.format {
        OutputFormat::Text => {
            writeln!(out)?;
            writeln!(out, "Blockchain validation: {}", verdict.is_ok())?;
            if let Err(violation) = &verdict {
                writeln!(out, "{violation}")?;
            }
            writeln!(out)?;
            writeln!(out, "The blockchain:")?;
            write!(out, "{chain}")?;
        }
        OutputFormat::Json => {
            let report = Report {
                difficulty: chain.difficulty().zeros(),
                valid: verdict.is_ok(),
                violation: verdict.err().map(|v| v.to_string()),
                blocks: chain.blocks(),
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// One line without its line ending, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).context("reading input")? == 0 {
        return Ok(None);
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Ok(Some(line))
}
