mod args;
mod diagnostic;
mod error;

use std::fs;
use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use args::Args;
use diagnostic::{report_io_error, report_syntax_error};
use gfuzzer_core::{construct, generator, DecisionTree, GeneratorConfig};

const COPYRIGHT: &str = "Copyright (C) 2026 the gfuzzer project contributors";

fn init_tracing(verbose: bool) {
    let filter = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .without_time()
        .init();
}

/// Strips a single layer of `<`/`>` from an explicit `-r`/`--root` value so
/// users can pass either `<start>` or `start`; the grammar's own rule-name
/// interner never stores the delimiters.
fn strip_root_brackets(root: &str) -> Vec<u8> {
    let inner = root
        .strip_prefix('<')
        .and_then(|rest| rest.strip_suffix('>'))
        .unwrap_or(root);
    inner.as_bytes().to_vec()
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.copyright {
        println!("{COPYRIGHT}");
        return ExitCode::SUCCESS;
    }
    if args.version {
        println!("gfuzzer {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    let bnf_bytes = match fs::read(&args.bnf) {
        Ok(bytes) => bytes,
        Err(e) => {
            report_io_error(args.bnf.display(), &e);
            return ExitCode::from(3);
        }
    };

    let root_bytes = args.root.as_deref().map(strip_root_brackets);
    let mut graph = match construct(&bnf_bytes, root_bytes.as_deref()) {
        Ok(graph) => graph,
        Err(e) => {
            report_syntax_error(&e);
            return ExitCode::from(1);
        }
    };

    let mut dtree = DecisionTree::construct_empty();
    let mut rng = StdRng::seed_from_u64(args.seed as u64);
    let config = GeneratorConfig {
        n: args.number,
        timeout: Duration::from_secs(args.timeout_secs),
        min_depth: args.min_depth,
        cov_guided: args.cov_guided,
        unique: !args.same,
    };

    let stdout = io::stdout();
    let mut lock = stdout.lock();
    if let Err(e) = generator::run(&mut graph, &mut dtree, &config, &mut lock, &mut rng) {
        report_io_error("<stdout>", &e);
        return ExitCode::from(3);
    }

    if let Some(path) = &args.dot_file {
        let dot = gfuzzer_dot::render_grammar_dot(&graph);
        if let Err(e) = fs::write(path, dot) {
            report_io_error(path.display(), &e);
            return ExitCode::from(3);
        }
    }

    if let Some(path) = &args.prefix_tree_file {
        let dot = gfuzzer_dot::render_dtree_dot(&dtree);
        if let Err(e) = fs::write(path, dot) {
            report_io_error(path.display(), &e);
            return ExitCode::from(3);
        }
    }

    ExitCode::SUCCESS
}
