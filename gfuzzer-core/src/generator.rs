//! The outer generation loop (spec §4.4): draws decision sequences until a
//! quota, a wall-clock deadline, or tree exhaustion stops it, materializing
//! and emitting one sentence per accepted sequence.

use std::io::Write;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{info, trace};

use crate::dtree::{DecisionTree, GenerateStatus};
use crate::graph::GrammarGraph;

/// Parameters of one generation run, taken directly from the CLI flags of
/// spec §6 (`-n`, `-t`, `-m`, `-c`, `-s`/`-S`).
#[derive(Debug, Clone, Copy)]
pub struct GeneratorConfig {
    pub n: u32,
    pub timeout: Duration,
    pub min_depth: u32,
    pub cov_guided: bool,
    pub unique: bool,
}

/// Runs the loop, writing one sentence per line to `sink`. Returns the
/// number of sentences actually emitted, which may be less than
/// `config.n` if the deadline or tree exhaustion stopped the run early.
pub fn run<W: Write, R: Rng>(
    graph: &mut GrammarGraph,
    dtree: &mut DecisionTree,
    config: &GeneratorConfig,
    sink: &mut W,
    rng: &mut R,
) -> std::io::Result<u32> {
    let deadline = Instant::now() + config.timeout;
    let mut emitted = 0u32;

    while emitted < config.n && Instant::now() < deadline {
        let (sequence, status) =
            dtree.generate_sequence(graph, config.min_depth, config.cov_guided, config.unique, rng);

        match status {
            GenerateStatus::NoUniqueSequenceRemaining => {
                info!(emitted, "decision tree fully explored; no unique sequence remains");
                break;
            }
            GenerateStatus::ShallowSequence => {
                trace!(len = sequence.len(), min_depth = config.min_depth, "discarding sequence below min-depth");
                continue;
            }
            GenerateStatus::Ok => {
                let sentence = graph
                    .generate_sentence(&sequence)
                    .expect("a sequence drawn from this graph's own decision tree always materializes");
                sink.write_all(&sentence)?;
                sink.write_all(b"\n")?;
                emitted += 1;
                trace!(emitted, coverage_percent = graph.coverage_percent(), "emitted sentence");
            }
        }
    }

    info!(emitted, coverage_percent = graph.coverage_percent(), "generation run finished");
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxError;
    use crate::graph::{ExpansionTerm, ExpansionTermKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coin_flip_graph() -> GrammarGraph {
        let mut g = GrammarGraph::empty();
        let start = g.intern_rule_name(b"start", SyntaxError::RuleNameTooLong).unwrap();
        let zero = g.intern_terminal(b"0", SyntaxError::TerminalTooLong).unwrap();
        let one = g.intern_terminal(b"1", SyntaxError::TerminalTooLong).unwrap();
        let alt0 = g.push_term(ExpansionTerm { kind: ExpansionTermKind::Terminal(zero), has_next: false, cov_count: 0 });
        let alt1 = g.push_term(ExpansionTerm { kind: ExpansionTermKind::Terminal(one), has_next: false, cov_count: 0 });
        g.rule_mut(start).alt_starts.push(alt0);
        g.rule_mut(start).alt_starts.push(alt1);
        g.set_root_rule_id(start);
        g
    }

    #[test]
    fn emits_requested_quota_and_stops() {
        let mut graph = coin_flip_graph();
        let mut dtree = DecisionTree::construct_empty();
        let mut rng = StdRng::seed_from_u64(42);
        let config = GeneratorConfig {
            n: 2,
            timeout: Duration::from_secs(5),
            min_depth: 0,
            cov_guided: false,
            unique: false,
        };
        let mut out = Vec::new();
        let emitted = run(&mut graph, &mut dtree, &config, &mut out, &mut rng).unwrap();
        assert_eq!(emitted, 2);
        assert_eq!(out.iter().filter(|&&b| b == b'\n').count(), 2);
    }

    #[test]
    fn stops_early_on_unique_exhaustion() {
        let mut graph = coin_flip_graph();
        let mut dtree = DecisionTree::construct_empty();
        let mut rng = StdRng::seed_from_u64(1);
        let config = GeneratorConfig {
            n: 100,
            timeout: Duration::from_secs(5),
            min_depth: 0,
            cov_guided: false,
            unique: true,
        };
        let mut out = Vec::new();
        let emitted = run(&mut graph, &mut dtree, &config, &mut out, &mut rng).unwrap();
        assert_eq!(emitted, 2, "only two distinct sequences exist for a two-alternative rule");
    }
}
