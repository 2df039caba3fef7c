use thiserror::Error;

/// Failures raised while constructing a [`crate::graph::GrammarGraph`] from
/// BNF source. Fatal: no partial graph is ever returned alongside one of
/// these (spec §4.1, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("grammar source exceeds the 1 MiB size limit")]
    SourceTooLarge,
    #[error("rule name exceeds the {} byte limit", crate::intern::MAX_TOKEN_LEN)]
    RuleNameTooLong,
    #[error("terminal exceeds the {} byte limit", crate::intern::MAX_TOKEN_LEN)]
    TerminalTooLong,
    #[error("the \"…\" regex-terminal form is reserved and not currently parsed")]
    ReservedRegexTerminal,
    #[error("an alternative must contain at least one expansion term")]
    EmptyAlternative,
    #[error("malformed grammar line")]
    MalformedLine,
    #[error("rule <{0}> is referenced but never defined")]
    UndefinedRule(String),
    #[error("root rule <{0}> is not defined")]
    UndefinedRoot(String),
    #[error("grammar source defines no rules")]
    EmptyGrammar,
}

/// Raised by [`crate::graph::GrammarGraph::generate_sentence`] when the
/// supplied decision sequence runs out before the derivation it induced
/// finished. Internal: must not occur for a sequence produced by
/// [`crate::dtree::DecisionTree::generate_sequence`] against the same graph
/// (spec §7, a tested property).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("decision sequence exhausted before the derivation completed")]
pub struct SentenceError;
