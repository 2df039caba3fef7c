use crate::error::SentenceError;
use crate::intern::Interner;

/// What an [`ExpansionTerm`] expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionTermKind {
    /// References the interned terminal at this id.
    Terminal(u32),
    /// References the rule at this id.
    Reference(u32),
}

/// One term of one alternative, in the flat, append-only arena described by
/// spec §3: `terms` is the concatenation of every alternative of every rule,
/// in rule-declaration order. `has_next` links a term to the next term of
/// the same alternative (the last term of an alternative has `has_next ==
/// false`); there is no pointer back to the owning rule or alternative.
#[derive(Debug, Clone)]
pub struct ExpansionTerm {
    pub kind: ExpansionTermKind,
    pub has_next: bool,
    pub cov_count: u32,
}

/// A grammar rule: zero or more alternatives, each a run of
/// [`ExpansionTerm`]s recorded by the index of its first term in the
/// graph's flat `terms` vector.
#[derive(Debug, Clone, Default)]
pub struct Rule {
    pub cov_count: u32,
    pub alt_starts: Vec<u32>,
}

/// The grammar graph: interned rule names and terminals, rules, and the flat
/// expansion-term arena, plus the running coverage summary `n_cov`. See
/// spec §3 for the full invariant list; §4.2 for operations.
#[derive(Debug)]
pub struct GrammarGraph {
    rule_names: Interner,
    terminals: Interner,
    rules: Vec<Rule>,
    terms: Vec<ExpansionTerm>,
    root_rule_id: u32,
    n_cov: u32,
}

impl GrammarGraph {
    pub(crate) fn empty() -> Self {
        GrammarGraph {
            rule_names: Interner::new(),
            terminals: Interner::new(),
            rules: Vec::new(),
            terms: Vec::new(),
            root_rule_id: 0,
            n_cov: 0,
        }
    }

    /// Interns `name`, allocating a fresh, alternative-less [`Rule`] the
    /// first time a given name is seen — whether that first sighting is a
    /// declaration (`<name> ::= …`) or a forward reference from another
    /// rule's alternative. The rule/name-interner invariant `rules.len() ==
    /// rule_names.len()` is maintained here and nowhere else.
    pub(crate) fn intern_rule_name(
        &mut self,
        name: &[u8],
        too_long: crate::error::SyntaxError,
    ) -> Result<u32, crate::error::SyntaxError> {
        let id = self.rule_names.intern(name, too_long)?;
        if id as usize == self.rules.len() {
            self.rules.push(Rule::default());
        }
        Ok(id)
    }

    pub(crate) fn intern_terminal(
        &mut self,
        content: &[u8],
        too_long: crate::error::SyntaxError,
    ) -> Result<u32, crate::error::SyntaxError> {
        self.terminals.intern(content, too_long)
    }

    pub(crate) fn find_rule_name(&self, name: &[u8]) -> Option<u32> {
        self.rule_names.find(name)
    }

    pub(crate) fn push_term(&mut self, term: ExpansionTerm) -> u32 {
        let idx = self.terms.len() as u32;
        self.terms.push(term);
        idx
    }

    pub(crate) fn rule_mut(&mut self, rule_id: u32) -> &mut Rule {
        &mut self.rules[rule_id as usize]
    }

    pub(crate) fn rules_iter(&self) -> impl Iterator<Item = (u32, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (i as u32, r))
    }

    pub(crate) fn set_root_rule_id(&mut self, id: u32) {
        self.root_rule_id = id;
    }

    // --- public read API (spec §4.2) ---------------------------------

    pub fn root_rule_id(&self) -> u32 {
        self.root_rule_id
    }

    pub fn rule_count(&self) -> u32 {
        self.rules.len() as u32
    }

    pub fn terminal_count(&self) -> u32 {
        self.terminals.len() as u32
    }

    pub fn n_alternatives(&self, rule_id: u32) -> u32 {
        self.rules[rule_id as usize].alt_starts.len() as u32
    }

    pub fn rule_name(&self, rule_id: u32) -> &[u8] {
        self.rule_names.get(rule_id)
    }

    pub fn rule_cov_count(&self, rule_id: u32) -> u32 {
        self.rules[rule_id as usize].cov_count
    }

    pub fn terminal_bytes(&self, terminal_id: u32) -> &[u8] {
        self.terminals.get(terminal_id)
    }

    pub fn term_at(&self, term_idx: u32) -> &ExpansionTerm {
        &self.terms[term_idx as usize]
    }

    /// The first expansion term of alternative `alt_index` of `rule_id`, or
    /// `None` if either index is out of range.
    pub fn alt_expansion(&self, rule_id: u32, alt_index: u32) -> Option<&ExpansionTerm> {
        let start = *self.rules.get(rule_id as usize)?.alt_starts.get(alt_index as usize)?;
        self.terms.get(start as usize)
    }

    /// Every term index of alternative `alt_index` of `rule_id`, in order.
    /// `None` if either index is out of range.
    pub fn alt_term_indices(&self, rule_id: u32, alt_index: u32) -> Option<Vec<u32>> {
        let start = *self.rules.get(rule_id as usize)?.alt_starts.get(alt_index as usize)?;
        let mut idx = start;
        let mut out = vec![idx];
        while self.terms[idx as usize].has_next {
            idx += 1;
            out.push(idx);
        }
        Some(out)
    }

    /// `rules.len() + terms.len()`: the denominator of [`Self::coverage_percent`].
    pub fn n_total_terms(&self) -> u32 {
        (self.rules.len() + self.terms.len()) as u32
    }

    /// Running count of distinct rules/terms whose `cov_count` has gone
    /// from zero to nonzero at least once.
    pub fn n_cov(&self) -> u32 {
        self.n_cov
    }

    /// `100 * n_cov / n_total_terms`, floor division, as the C original's
    /// `termCov_ggraph`.
    pub fn coverage_percent(&self) -> u32 {
        (100 * self.n_cov) / self.n_total_terms().max(1)
    }

    fn bump_rule_cov(&mut self, rule_id: u32) {
        let became_covered = {
            let rule = &mut self.rules[rule_id as usize];
            let was_zero = rule.cov_count == 0;
            rule.cov_count = rule.cov_count.saturating_add(1);
            was_zero
        };
        if became_covered {
            self.n_cov += 1;
        }
    }

    fn bump_term_cov(&mut self, term_idx: u32) {
        let became_covered = {
            let term = &mut self.terms[term_idx as usize];
            let was_zero = term.cov_count == 0;
            term.cov_count = term.cov_count.saturating_add(1);
            was_zero
        };
        if became_covered {
            self.n_cov += 1;
        }
    }

    fn push_alt_reversed(
        &self,
        rule_id: u32,
        alt_id: u32,
        stack: &mut Vec<u32>,
    ) -> Result<(), SentenceError> {
        let run = self.alt_term_indices(rule_id, alt_id).ok_or(SentenceError)?;
        stack.extend(run.iter().rev());
        Ok(())
    }

    /// Materializes a sentence by walking the derivation tree induced by
    /// `decisions` depth-first, left to right, pre-order (spec §4.2): an
    /// explicit `Vec`-backed stack of pending expansion-term indices, never
    /// recursion. Each visited rule and each visited expansion term has its
    /// `cov_count` bumped (saturating), feeding `n_cov`.
    ///
    /// `decisions[0]` selects the root rule's alternative; each `Reference`
    /// term consumes the next decision to select the referenced rule's
    /// alternative. Returns [`SentenceError`] if `decisions` runs out before
    /// the walk completes.
    pub fn generate_sentence(&mut self, decisions: &[u32]) -> Result<Vec<u8>, SentenceError> {
        let mut decision_pos = 0usize;
        let first = *decisions.first().ok_or(SentenceError)?;
        decision_pos += 1;

        self.bump_rule_cov(self.root_rule_id);
        let mut stack: Vec<u32> = Vec::new();
        self.push_alt_reversed(self.root_rule_id, first, &mut stack)?;

        let mut output = Vec::new();
        while let Some(term_idx) = stack.pop() {
            self.bump_term_cov(term_idx);
            match self.terms[term_idx as usize].kind {
                ExpansionTermKind::Terminal(terminal_id) => {
                    output.extend_from_slice(self.terminals.get(terminal_id));
                }
                ExpansionTermKind::Reference(rule_id) => {
                    self.bump_rule_cov(rule_id);
                    let decision = *decisions.get(decision_pos).ok_or(SentenceError)?;
                    decision_pos += 1;
                    self.push_alt_reversed(rule_id, decision, &mut stack)?;
                }
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyntaxError;

    /// `<start> ::= 'a' <start> | 'b'`, a minimal two-alternative rule with
    /// one terminal-only and one recursive alternative, built by hand since
    /// this module does not depend on the parser.
    fn sample_graph() -> GrammarGraph {
        let mut g = GrammarGraph::empty();
        let start = g.intern_rule_name(b"start", SyntaxError::RuleNameTooLong).unwrap();
        let a = g.intern_terminal(b"a", SyntaxError::TerminalTooLong).unwrap();
        let b = g.intern_terminal(b"b", SyntaxError::TerminalTooLong).unwrap();

        let alt0_start = g.push_term(ExpansionTerm {
            kind: ExpansionTermKind::Terminal(a),
            has_next: true,
            cov_count: 0,
        });
        g.push_term(ExpansionTerm {
            kind: ExpansionTermKind::Reference(start),
            has_next: false,
            cov_count: 0,
        });
        let alt1_start = g.push_term(ExpansionTerm {
            kind: ExpansionTermKind::Terminal(b),
            has_next: false,
            cov_count: 0,
        });

        g.rule_mut(start).alt_starts.push(alt0_start);
        g.rule_mut(start).alt_starts.push(alt1_start);
        g.set_root_rule_id(start);
        g
    }

    #[test]
    fn generate_sentence_follows_decisions() {
        let mut g = sample_graph();
        // alt 0 ("a" <start>), then alt 1 ("b") -> "ab"
        let out = g.generate_sentence(&[0, 1]).unwrap();
        assert_eq!(out, b"ab");
    }

    #[test]
    fn generate_sentence_errors_on_exhausted_decisions() {
        let mut g = sample_graph();
        let err = g.generate_sentence(&[0]).unwrap_err();
        assert_eq!(err, SentenceError);
    }

    #[test]
    fn coverage_counters_saturate_and_feed_n_cov() {
        let mut g = sample_graph();
        assert_eq!(g.n_cov(), 0);
        g.generate_sentence(&[0, 1]).unwrap();
        // root rule + reference-visited rule (same rule) + 3 terms visited
        assert!(g.n_cov() > 0);
        assert_eq!(g.rule_cov_count(g.root_rule_id()), 2);
    }

    #[test]
    fn n_total_terms_is_rules_plus_terms() {
        let g = sample_graph();
        assert_eq!(g.n_total_terms(), 1 + 3);
    }
}
