//! Decision tree over decision sequences (spec §4.3): a prefix trie recording
//! which alternative was chosen at each point of a derivation, so that
//! repeated generation can avoid re-emitting sequences already produced in
//! full (`unique`) and can bias toward alternatives not yet covered
//! (`cov_guided`).

use rand::Rng;

use crate::container::Bitset;
use crate::graph::{ExpansionTermKind, GrammarGraph};

/// The exploration state of one node. Newly allocated nodes start
/// `Unexplored`; the first time a node is used as a decision point it
/// becomes `PartiallyExplored` and its children are allocated contiguously
/// starting at `first_child_id` (`child_k = first_child_id + k`); a node
/// becomes `FullyExplored` once every child under it is `FullyExplored`, or
/// immediately upon becoming a leaf ([`DecisionTree::set_leaf`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unexplored,
    PartiallyExplored { n_choices: u32, first_child_id: u32 },
    FullyExplored,
}

#[derive(Debug, Clone)]
struct Node {
    state: NodeState,
    parent_id: Option<u32>,
}

/// Outcome of [`DecisionTree::generate_sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateStatus {
    /// A sequence was produced and meets `min_depth`.
    Ok,
    /// A sequence was produced but is shorter than `min_depth`.
    ShallowSequence,
    /// `unique` was set and the tree is already fully explored: no further
    /// distinct sequence exists. The returned sequence is empty.
    NoUniqueSequenceRemaining,
}

/// Flat, `Vec`-indexed prefix trie of decision sequences, rooted at node
/// `0`. See spec §3 and §4.3 for the full invariant list.
#[derive(Debug)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    pub fn construct_empty() -> Self {
        DecisionTree {
            nodes: vec![Node { state: NodeState::Unexplored, parent_id: None }],
        }
    }

    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    pub fn node_state(&self, node_id: u32) -> NodeState {
        self.nodes[node_id as usize].state
    }

    pub fn node_parent(&self, node_id: u32) -> Option<u32> {
        self.nodes[node_id as usize].parent_id
    }

    fn is_fully_explored(&self, node_id: u32) -> bool {
        matches!(self.nodes[node_id as usize].state, NodeState::FullyExplored)
    }

    fn allocate_children(&mut self, parent_id: u32, n: u32) -> u32 {
        let first_child_id = self.nodes.len() as u32;
        for _ in 0..n {
            self.nodes.push(Node { state: NodeState::Unexplored, parent_id: Some(parent_id) });
        }
        first_child_id
    }

    /// Computes the candidate alternative-index set at `node_id` (allocating
    /// its children on first visit), applies the `unique`/`cov_guided`
    /// restrictions, and draws one candidate uniformly at random.
    fn partially_explore_node(
        &mut self,
        node_id: u32,
        graph: &GrammarGraph,
        rule_id: u32,
        cov_guided: bool,
        unique: bool,
        rng: &mut impl Rng,
    ) -> u32 {
        let n_choices = graph.n_alternatives(rule_id);
        let first_child_id = match self.nodes[node_id as usize].state {
            NodeState::Unexplored => {
                let first_child_id = self.allocate_children(node_id, n_choices);
                self.nodes[node_id as usize].state =
                    NodeState::PartiallyExplored { n_choices, first_child_id };
                first_child_id
            }
            NodeState::PartiallyExplored { first_child_id, .. } => first_child_id,
            NodeState::FullyExplored => {
                unreachable!("a node is only used as a decision point once, before it can be fully explored")
            }
        };

        let mut candidates = Bitset::new_all_set(n_choices as usize);
        if unique {
            for c in 0..n_choices {
                if self.is_fully_explored(first_child_id + c) {
                    candidates.clear(c as usize);
                }
            }
        }

        if cov_guided {
            let mut uncovered = Bitset::new_all_set(n_choices as usize);
            for c in 0..n_choices {
                let term = graph.alt_expansion(rule_id, c).expect("alt index in range");
                if term.cov_count != 0 {
                    uncovered.clear(c as usize);
                }
            }
            uncovered.intersect_with(&candidates);
            if uncovered.count_ones() > 0 {
                candidates = uncovered;
            }
        }

        assert!(
            candidates.count_ones() > 0,
            "uniqueness invariant violated: no candidates at a node not marked fully explored"
        );
        let pick = rng.gen_range(0..candidates.count_ones());
        candidates.nth_one(pick) as u32
    }

    /// Marks `node_id` fully explored and propagates the fully-explored
    /// state up to ancestors whose every child is now fully explored.
    /// Idempotent: re-reaching an already fully-explored leaf (possible in
    /// non-`unique` mode, where the same prefix of choices can be drawn more
    /// than once) leaves the tree unchanged.
    fn set_leaf(&mut self, node_id: u32) {
        if self.is_fully_explored(node_id) {
            return;
        }
        debug_assert!(matches!(self.nodes[node_id as usize].state, NodeState::Unexplored));
        self.nodes[node_id as usize].state = NodeState::FullyExplored;
        self.propagate_fully_explored(node_id);
    }

    fn propagate_fully_explored(&mut self, mut node_id: u32) {
        while let Some(parent_id) = self.nodes[node_id as usize].parent_id {
            let (n_choices, first_child_id) = match self.nodes[parent_id as usize].state {
                NodeState::PartiallyExplored { n_choices, first_child_id } => (n_choices, first_child_id),
                _ => return,
            };
            let all_children_done = (0..n_choices).all(|c| self.is_fully_explored(first_child_id + c));
            if !all_children_done {
                break;
            }
            self.nodes[parent_id as usize].state = NodeState::FullyExplored;
            node_id = parent_id;
        }
    }

    /// Draws one decision sequence by walking the grammar depth-first from
    /// `graph`'s root rule, choosing an alternative at each rule via
    /// [`Self::partially_explore_node`] and pushing the rule ids of every
    /// `Reference` term of the chosen alternative onto a pending stack in
    /// reverse order (so the leftmost reference is expanded next). Returns
    /// the sequence of chosen alternative indices and a [`GenerateStatus`].
    pub fn generate_sequence(
        &mut self,
        graph: &GrammarGraph,
        min_depth: u32,
        cov_guided: bool,
        unique: bool,
        rng: &mut impl Rng,
    ) -> (Vec<u32>, GenerateStatus) {
        if unique && self.is_fully_explored(0) {
            return (Vec::new(), GenerateStatus::NoUniqueSequenceRemaining);
        }

        let mut pending = vec![graph.root_rule_id()];
        let mut current_node = 0u32;
        let mut sequence = Vec::new();

        while let Some(rule_id) = pending.pop() {
            let choice = self.partially_explore_node(current_node, graph, rule_id, cov_guided, unique, rng);
            sequence.push(choice);

            let first_child_id = match self.nodes[current_node as usize].state {
                NodeState::PartiallyExplored { first_child_id, .. } => first_child_id,
                _ => unreachable!("partially_explore_node always leaves this node PartiallyExplored"),
            };
            current_node = first_child_id + choice;

            let run = graph
                .alt_term_indices(rule_id, choice)
                .expect("choice drawn from this rule's own alternative range");
            for &term_idx in run.iter().rev() {
                if let ExpansionTermKind::Reference(referenced_rule) = graph.term_at(term_idx).kind {
                    pending.push(referenced_rule);
                }
            }
        }

        self.set_leaf(current_node);

        let status = if sequence.len() < min_depth as usize {
            GenerateStatus::ShallowSequence
        } else {
            GenerateStatus::Ok
        };
        (sequence, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxError;
    use crate::graph::ExpansionTerm;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// `<start> ::= '0' | '1'`: two terminal-only alternatives, enough to
    /// exercise uniqueness exhaustion without needing the parser.
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
    fn unique_mode_exhausts_after_all_alternatives_drawn() {
        let graph = coin_flip_graph();
        let mut dtree = DecisionTree::construct_empty();
        let mut rng = StdRng::seed_from_u64(131077);

        let (first, status) = dtree.generate_sequence(&graph, 0, false, true, &mut rng);
        assert_eq!(status, GenerateStatus::Ok);
        let (second, status) = dtree.generate_sequence(&graph, 0, false, true, &mut rng);
        assert_eq!(status, GenerateStatus::Ok);
        assert_ne!(first, second, "unique mode must not repeat a fully-drawn sequence");

        let (third, status) = dtree.generate_sequence(&graph, 0, false, true, &mut rng);
        assert_eq!(status, GenerateStatus::NoUniqueSequenceRemaining);
        assert!(third.is_empty());
    }

    #[test]
    fn min_depth_flags_short_sequences() {
        let graph = coin_flip_graph();
        let mut dtree = DecisionTree::construct_empty();
        let mut rng = StdRng::seed_from_u64(1);
        let (_, status) = dtree.generate_sequence(&graph, 5, false, false, &mut rng);
        assert_eq!(status, GenerateStatus::ShallowSequence);
    }

    #[test]
    fn non_unique_mode_can_repeat_sequences() {
        let graph = coin_flip_graph();
        let mut dtree = DecisionTree::construct_empty();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            let (_, status) = dtree.generate_sequence(&graph, 0, false, false, &mut rng);
            assert_eq!(status, GenerateStatus::Ok);
        }
    }
}
