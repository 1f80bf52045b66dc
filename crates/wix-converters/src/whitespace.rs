//! Canonical indentation text.
//!
//! Indentation is a run of newlines followed by `unit * level` spaces. Blank
//! lines the author left are kept; everything after the last newline is
//! rewritten.

/// Whether `text` already is valid indentation for `level`.
///
/// Any number of leading newlines is accepted, including none.
pub fn is_canonical(text: &str, unit: usize, level: usize) -> bool {
    let rest = text.trim_start_matches('\n');
    rest.len() == unit * level && rest.bytes().all(|b| b == b' ')
}

/// Rewrite `text` into the indentation for `level`, keeping its count of
/// leading newlines (at least one).
pub fn canonicalize(text: &str, unit: usize, level: usize) -> String {
    let newlines = text.chars().take_while(|c| *c == '\n').count().max(1);
    let mut out = "\n".repeat(newlines);
    out.push_str(&" ".repeat(unit * level));
    out
}
