//! DOT diagnostic rendering for [`GrammarGraph`] and [`DecisionTree`]
//! (spec §4.2/§4.3 last paragraphs, §6.4). Deliberately hand-built strings
//! rather than `petgraph::dot::Dot`: the record-shaped, ported, coverage-
//! shaded nodes this needs don't fit `petgraph`'s generic node/edge
//! formatter, and the C original (`grammargraph.c: printDot_ggraph`) builds
//! its DOT text by hand for the same reason.

use std::fmt::Write as _;

use gfuzzer_core::dtree::{DecisionTree, NodeState};
use gfuzzer_core::graph::{ExpansionTermKind, GrammarGraph};

fn escape_label(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '|' => out.push_str("\\|"),
            '<' => out.push_str("\\<"),
            '>' => out.push_str("\\>"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders `graph` as a Graphviz `digraph`: one record node per rule (one
/// field per alternative, one sub-field per term), an edge per reference
/// term to the rule it refers to, and coverage shading (filled nodes for
/// covered rules, a leading `*` on covered terms) taken directly from the
/// graph's running `cov_count`s — binary shaded/unshaded, matching the C
/// original, not a gradient.
pub fn render_grammar_dot(graph: &GrammarGraph) -> String {
    let mut out = String::new();
    out.push_str("digraph grammar {\n");
    out.push_str("    rankdir=LR;\n");
    out.push_str("    node [shape=record, fontname=\"monospace\"];\n");

    for rule_id in 0..graph.rule_count() {
        let name = escape_label(graph.rule_name(rule_id));
        let covered = graph.rule_cov_count(rule_id) > 0;
        let mut fields = String::new();
        for alt in 0..graph.n_alternatives(rule_id) {
            if alt > 0 {
                fields.push('|');
            }
            let run = graph.alt_term_indices(rule_id, alt).expect("alt index in range");
            write!(fields, "<a{alt}> ").unwrap();
            for (i, &term_idx) in run.iter().enumerate() {
                if i > 0 {
                    fields.push(' ');
                }
                let term = graph.term_at(term_idx);
                let mark = if term.cov_count > 0 { "*" } else { "" };
                match term.kind {
                    ExpansionTermKind::Terminal(terminal_id) => {
                        write!(fields, "{mark}'{}'", escape_label(graph.terminal_bytes(terminal_id))).unwrap();
                    }
                    ExpansionTermKind::Reference(referenced_rule) => {
                        write!(fields, "{mark}\\<{}\\>", escape_label(graph.rule_name(referenced_rule))).unwrap();
                    }
                }
            }
        }
        let style = if covered { ", style=filled, fillcolor=lightgrey" } else { "" };
        writeln!(out, "    rule_{rule_id} [label=\"{{{name}|{fields}}}\"{style}];").unwrap();
    }

    for rule_id in 0..graph.rule_count() {
        for alt in 0..graph.n_alternatives(rule_id) {
            let run = graph.alt_term_indices(rule_id, alt).expect("alt index in range");
            for term_idx in run {
                if let ExpansionTermKind::Reference(referenced_rule) = graph.term_at(term_idx).kind {
                    writeln!(out, "    rule_{rule_id}:a{alt} -> rule_{referenced_rule};").unwrap();
                }
            }
        }
    }

    out.push_str("}\n");
    out
}

/// Renders `dtree` as a Graphviz `digraph`: one node per trie node, labeled
/// with its branching factor (`?` while unexplored, `\u{2713}` once fully
/// explored), filled when fully explored, with a parent-to-child edge per
/// node.
pub fn render_dtree_dot(dtree: &DecisionTree) -> String {
    let mut out = String::new();
    out.push_str("digraph decision_tree {\n");
    out.push_str("    node [shape=circle, fontname=\"monospace\"];\n");

    for node_id in 0..dtree.node_count() {
        let (label, style) = match dtree.node_state(node_id) {
            NodeState::Unexplored => ("?".to_string(), ""),
            NodeState::PartiallyExplored { n_choices, .. } => (n_choices.to_string(), ""),
            NodeState::FullyExplored => ("\u{2713}".to_string(), ", style=filled, fillcolor=lightgrey"),
        };
        writeln!(out, "    node_{node_id} [label=\"{label}\"{style}];").unwrap();
        if let Some(parent_id) = dtree.node_parent(node_id) {
            writeln!(out, "    node_{parent_id} -> node_{node_id};").unwrap();
        }
    }

    out.push_str("}\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfuzzer_core::construct;

    #[test]
    fn grammar_dot_contains_one_record_per_rule() {
        let graph = construct(b"<start> ::= 'a' <start> | 'b'\n", None).unwrap();
        let dot = render_grammar_dot(&graph);
        assert!(dot.starts_with("digraph grammar {"));
        assert!(dot.contains("rule_0"));
        assert!(dot.contains("'a'"));
        assert!(dot.contains("'b'"));
    }

    #[test]
    fn dtree_dot_renders_root_node() {
        let dtree = DecisionTree::construct_empty();
        let dot = render_dtree_dot(&dtree);
        assert!(dot.contains("node_0"));
        assert!(dot.contains("\"?\""));
    }
}
