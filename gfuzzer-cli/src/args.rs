use std::path::PathBuf;

use clap::Parser;

use crate::error::ArgumentError;

pub const MAX_NUMBER: u32 = 4_194_304;
pub const MIN_TIMEOUT_SECS: u64 = 1;
pub const MAX_TIMEOUT_SECS: u64 = 604_800;

const DEFAULT_NUMBER: u32 = 100;
const DEFAULT_SEED: u32 = 131_077;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn parse_number(raw: &str) -> Result<u32, ArgumentError> {
    let value: u32 = raw
        .parse()
        .map_err(|_| ArgumentError::NumberOutOfRange { value: 0 })?;
    if value == 0 || value > MAX_NUMBER {
        return Err(ArgumentError::NumberOutOfRange { value });
    }
    Ok(value)
}

fn parse_timeout(raw: &str) -> Result<u64, ArgumentError> {
    let value: u64 = raw
        .parse()
        .map_err(|_| ArgumentError::TimeoutOutOfRange { value: 0 })?;
    if value < MIN_TIMEOUT_SECS || value > MAX_TIMEOUT_SECS {
        return Err(ArgumentError::TimeoutOutOfRange { value });
    }
    Ok(value)
}

fn parse_root(raw: &str) -> Result<String, ArgumentError> {
    if raw.len() > gfuzzer_core::intern::MAX_TOKEN_LEN {
        return Err(ArgumentError::RootNameTooLong { value: raw.len() });
    }
    Ok(raw.to_string())
}

fn parse_seed(raw: &str) -> Result<u32, ArgumentError> {
    raw.parse().map_err(|_| ArgumentError::SeedOutOfRange { raw: raw.to_string() })
}

/// Samples sentences from a BNF grammar, biased toward broad exploration of
/// its alternatives.
#[derive(Debug, Parser)]
#[command(name = "gfuzzer", about, disable_version_flag = true)]
pub struct Args {
    /// Path to the BNF grammar file.
    #[arg(short = 'b', long = "bnf", value_name = "FILE")]
    pub bnf: PathBuf,

    /// Bias alternative selection toward expansions not yet covered.
    #[arg(short = 'c', long = "cov-guided")]
    pub cov_guided: bool,

    /// Print copyright information and exit.
    #[arg(short = 'C', long = "copyright")]
    pub copyright: bool,

    /// Write a DOT rendering of the grammar graph to this path.
    #[arg(short = 'd', long = "dot-file", value_name = "FILE")]
    pub dot_file: Option<PathBuf>,

    /// Minimum accepted decision-sequence length; shorter sequences are
    /// discarded and redrawn.
    #[arg(short = 'm', long = "min-depth", default_value_t = 0)]
    pub min_depth: u32,

    /// Number of sentences to generate.
    #[arg(short = 'n', long = "number", default_value_t = DEFAULT_NUMBER, value_parser = parse_number)]
    pub number: u32,

    /// Write a DOT rendering of the decision tree (prefix tree) to this
    /// path.
    #[arg(short = 'p', long = "prefix-tree", value_name = "FILE")]
    pub prefix_tree_file: Option<PathBuf>,

    /// Explicit root rule, e.g. "<start>". Defaults to the first rule
    /// declared in the grammar.
    #[arg(short = 'r', long = "root", value_parser = parse_root)]
    pub root: Option<String>,

    /// RNG seed.
    #[arg(short = 's', long = "seed", default_value_t = DEFAULT_SEED, value_parser = parse_seed)]
    pub seed: u32,

    /// Allow repeated sentences by disabling uniqueness tracking.
    #[arg(short = 'S', long = "same")]
    pub same: bool,

    /// Wall-clock budget, in seconds.
    #[arg(short = 't', long = "timeout", default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = parse_timeout)]
    pub timeout_secs: u64,

    /// Raise logging verbosity from WARN to INFO.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Print version information and exit.
    #[arg(short = 'V', long = "version")]
    pub version: bool,
}
