//! Diagnostic rendering: a small `Severity`-tagged `Display` wrapper styled
//! with `owo-colors`, in the shape of the teacher's `lapex/src/errors.rs`
//! but without its source-span machinery — spec §7 requires error kind
//! only, never a source location, for `SyntaxError`/`SentenceError`.

use std::fmt;

use owo_colors::OwoColorize;

use gfuzzer_core::SyntaxError;

#[derive(Debug, Clone, Copy)]
enum Severity {
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "{}", "error".red().bold()),
        }
    }
}

pub fn report_syntax_error(err: &SyntaxError) {
    eprintln!("{}: {err}", Severity::Error);
}

pub fn report_io_error(context: impl fmt::Display, err: &std::io::Error) {
    eprintln!("{}: {context}: {err}", Severity::Error);
}
