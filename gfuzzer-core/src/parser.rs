//! BNF surface-syntax parsing (spec §4.1). One logical line at a time:
//! comments and blank lines are skipped, `<name> ::= alt (| alt)*` lines
//! accumulate onto the named rule, and the reserved `"…"` terminal form is
//! rejected outright.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{char, space0, space1};
use nom::multi::separated_list1;
use nom::sequence::delimited;
use nom::IResult;

use crate::error::SyntaxError;
use crate::graph::{ExpansionTerm, ExpansionTermKind, GrammarGraph};

/// A byte buffer larger than this is rejected before any parsing is
/// attempted (spec §4.1 size limits).
pub const MAX_SOURCE_BYTES: usize = 1024 * 1024;

/// Wraps a [`SyntaxError`] so it can ride through `nom`'s combinators as a
/// `nom::Err`, short-circuiting `alt()` via `Failure` when the cause is
/// already known precisely (the reserved `"…"` form) rather than falling
/// back to generic backtracking.
#[derive(Debug, Clone)]
struct NomError(SyntaxError);

impl<'a> nom::error::ParseError<&'a [u8]> for NomError {
    fn from_error_kind(_input: &'a [u8], _kind: nom::error::ErrorKind) -> Self {
        NomError(SyntaxError::MalformedLine)
    }

    fn append(_input: &'a [u8], _kind: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

fn to_syntax_error(e: nom::Err<NomError>) -> SyntaxError {
    match e {
        nom::Err::Error(NomError(err)) | nom::Err::Failure(NomError(err)) => err,
        nom::Err::Incomplete(_) => SyntaxError::MalformedLine,
    }
}

#[derive(Debug, Clone, Copy)]
enum ParsedTerm<'a> {
    Terminal(&'a [u8]),
    Reference(&'a [u8]),
}

fn is_rule_name_byte(c: u8) -> bool {
    !matches!(c, b' ' | b'\t' | b'<' | b'>')
}

fn rule_name_bytes(input: &[u8]) -> IResult<&[u8], &[u8], NomError> {
    delimited(char('<'), take_while1(is_rule_name_byte), char('>'))(input)
}

fn terminal_bytes(input: &[u8]) -> IResult<&[u8], &[u8], NomError> {
    delimited(char('\''), take_while(|c: u8| c != b'\''), char('\''))(input)
}

fn term(input: &[u8]) -> IResult<&[u8], ParsedTerm, NomError> {
    if input.first() == Some(&b'"') {
        return Err(nom::Err::Failure(NomError(SyntaxError::ReservedRegexTerminal)));
    }
    alt((
        |i| rule_name_bytes(i).map(|(r, name)| (r, ParsedTerm::Reference(name))),
        |i| terminal_bytes(i).map(|(r, content)| (r, ParsedTerm::Terminal(content))),
    ))(input)
}

fn sequence(input: &[u8]) -> IResult<&[u8], Vec<ParsedTerm>, NomError> {
    separated_list1(space1, term)(input)
}

/// A clause between `|` separators. Parsed permissively as zero-or-more
/// terms (`opt(sequence)`, defaulting to empty) so that a genuinely empty
/// alternative parses successfully and is reported as the specific
/// `SyntaxError::EmptyAlternative` by the caller, rather than a generic
/// parse failure.
fn alt_clause(input: &[u8]) -> IResult<&[u8], Vec<ParsedTerm>, NomError> {
    nom::combinator::map(nom::combinator::opt(sequence), |o| o.unwrap_or_default())(input)
}

fn alternatives(input: &[u8]) -> IResult<&[u8], Vec<Vec<ParsedTerm>>, NomError> {
    separated_list1(delimited(space0, char('|'), space0), alt_clause)(input)
}

fn rule_decl(input: &[u8]) -> IResult<&[u8], (&[u8], Vec<Vec<ParsedTerm>>), NomError> {
    let (input, name) = rule_name_bytes(input)?;
    let (input, _) = space0(input)?;
    let (input, _) = tag("::=")(input)?;
    let (input, _) = space0(input)?;
    let (input, alts) = alternatives(input)?;
    Ok((input, (name, alts)))
}

/// Parses one line (no trailing `\n`). `None` for blank lines and comment
/// lines (`;` to end of line, possibly after leading space); `Some` with
/// the declared rule name and its parsed alternatives otherwise.
fn parse_line(line: &[u8]) -> Result<Option<(&[u8], Vec<Vec<ParsedTerm>>)>, SyntaxError> {
    let (rest, _) = space0::<_, NomError>(line).map_err(to_syntax_error)?;
    if rest.is_empty() || rest[0] == b';' {
        return Ok(None);
    }
    let (rest, parsed) = rule_decl(rest).map_err(to_syntax_error)?;
    let (rest, _) = space0::<_, NomError>(rest).map_err(to_syntax_error)?;
    if !rest.is_empty() {
        return Err(SyntaxError::MalformedLine);
    }
    Ok(Some(parsed))
}

/// Parses `bnf_bytes` as a complete grammar and builds a [`GrammarGraph`].
/// `root_name` is the bare rule-name content (no `<`/`>`) of an explicit
/// root; `None` selects the first rule declared in source order, which is
/// always rule id `0` (the first `intern_rule_name` call of the whole
/// parse, guaranteed by the fact that nothing can reference a rule before
/// its own declaration line is reached).
pub fn construct(bnf_bytes: &[u8], root_name: Option<&[u8]>) -> Result<GrammarGraph, SyntaxError> {
    if bnf_bytes.len() > MAX_SOURCE_BYTES {
        return Err(SyntaxError::SourceTooLarge);
    }

    let mut graph = GrammarGraph::empty();

    for line in bnf_bytes.split(|&b| b == b'\n') {
        let Some((name, alts)) = parse_line(line)? else {
            continue;
        };
        let rule_id = graph.intern_rule_name(name, SyntaxError::RuleNameTooLong)?;
        for seq in alts {
            if seq.is_empty() {
                return Err(SyntaxError::EmptyAlternative);
            }
            let last = seq.len() - 1;
            let mut start = None;
            for (i, parsed_term) in seq.into_iter().enumerate() {
                let has_next = i != last;
                let kind = match parsed_term {
                    ParsedTerm::Terminal(bytes) => {
                        let id = graph.intern_terminal(bytes, SyntaxError::TerminalTooLong)?;
                        ExpansionTermKind::Terminal(id)
                    }
                    ParsedTerm::Reference(bytes) => {
                        let id = graph.intern_rule_name(bytes, SyntaxError::RuleNameTooLong)?;
                        ExpansionTermKind::Reference(id)
                    }
                };
                let idx = graph.push_term(ExpansionTerm { kind, has_next, cov_count: 0 });
                if start.is_none() {
                    start = Some(idx);
                }
            }
            graph.rule_mut(rule_id).alt_starts.push(start.expect("seq is non-empty"));
        }
    }

    if graph.rule_count() == 0 {
        return Err(SyntaxError::EmptyGrammar);
    }

    if let Some((id, _)) = graph.rules_iter().find(|(_, rule)| rule.alt_starts.is_empty()) {
        let name = graph.rule_name(id).to_vec();
        return Err(SyntaxError::UndefinedRule(String::from_utf8_lossy(&name).into_owned()));
    }

    let root_rule_id = match root_name {
        Some(name) => graph.find_rule_name(name).ok_or_else(|| {
            SyntaxError::UndefinedRoot(String::from_utf8_lossy(name).into_owned())
        })?,
        None => 0,
    };
    graph.set_root_rule_id(root_rule_id);

    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_grammar() {
        let src = b"<start> ::= 'a' <start> | 'b'\n";
        let graph = construct(src, None).unwrap();
        assert_eq!(graph.rule_count(), 1);
        assert_eq!(graph.n_alternatives(graph.root_rule_id()), 2);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let src = b"; a comment\n\n<start> ::= 'x'\n  ; trailing comment\n";
        let graph = construct(src, None).unwrap();
        assert_eq!(graph.rule_count(), 1);
    }

    #[test]
    fn accumulates_multiple_declaration_lines() {
        let src = b"<start> ::= 'a'\n<start> ::= 'b'\n";
        let graph = construct(src, None).unwrap();
        assert_eq!(graph.rule_count(), 1);
        assert_eq!(graph.n_alternatives(graph.root_rule_id()), 2);
    }

    #[test]
    fn rejects_reserved_regex_terminal() {
        let src = b"<start> ::= \"abc\"\n";
        let err = construct(src, None).unwrap_err();
        assert_eq!(err, SyntaxError::ReservedRegexTerminal);
    }

    #[test]
    fn rejects_dangling_reference() {
        let src = b"<start> ::= <missing>\n";
        let err = construct(src, None).unwrap_err();
        assert!(matches!(err, SyntaxError::UndefinedRule(_)));
    }

    #[test]
    fn rejects_unknown_explicit_root() {
        let src = b"<start> ::= 'a'\n";
        let err = construct(src, Some(b"nonexistent")).unwrap_err();
        assert!(matches!(err, SyntaxError::UndefinedRoot(_)));
    }

    #[test]
    fn rejects_empty_alternative() {
        let src = b"<start> ::= 'a' | \n";
        let err = construct(src, None).unwrap_err();
        assert_eq!(err, SyntaxError::EmptyAlternative);
    }

    #[test]
    fn rejects_source_over_size_limit() {
        let src = vec![b'x'; MAX_SOURCE_BYTES + 1];
        let err = construct(&src, None).unwrap_err();
        assert_eq!(err, SyntaxError::SourceTooLarge);
    }

    #[test]
    fn explicit_root_selects_named_rule() {
        let src = b"<a> ::= 'x' <b>\n<b> ::= 'y'\n";
        let graph = construct(src, Some(b"b")).unwrap();
        assert_eq!(graph.rule_name(graph.root_rule_id()), b"b");
    }
}
