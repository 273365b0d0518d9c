//! logos-based literal classifier.
//!
//! The declarative format is line-oriented, so instead of tokenizing a whole
//! document this lexer is pointed at the start of a value and asked what kind
//! of literal begins there. Longest match wins, so `12.5` is a single
//! [`Literal::Float`] and `#ffcc00` a single [`Literal::HexRun`].

use logos::Logos;

/// Literal kinds recognized at the start of a value.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    /// `12`, `-3`, `+7`.
    #[regex(r"[-+]?[0-9]+")]
    Integer,

    /// `1.5`, `-.5`, `3.`, `2e10`, `1.5E-3`.
    #[regex(r"[-+]?([0-9]+\.[0-9]*|\.[0-9]+)([eE][-+]?[0-9]+)?")]
    #[regex(r"[-+]?[0-9]+[eE][-+]?[0-9]+")]
    Float,

    /// `#` followed by the maximal run of hex digits (possibly empty).
    #[regex(r"#[0-9a-fA-F]*")]
    HexRun,

    /// `@` followed by everything up to a space or colon.
    #[regex(r"@[^ :]*")]
    Reference,
}

/// Classify the literal at the very start of `s`, returning it with its length.
pub fn leading_literal(s: &str) -> Option<(Literal, usize)> {
    let mut lexer = Literal::lexer(s);
    match lexer.next() {
        Some(Ok(literal)) if lexer.span().start == 0 => Some((literal, lexer.span().end)),
        _ => None,
    }
}

/// Whether `s` starts with something that reads as a number (`-`, `.` and a digit).
pub fn is_start_of_number(s: &str) -> bool {
    let mut bytes = s.as_bytes();
    if let [b'-', rest @ ..] = bytes {
        bytes = rest;
    }
    if let [b'.', rest @ ..] = bytes {
        bytes = rest;
    }
    matches!(bytes.first(), Some(b'0'..=b'9'))
}

/// Whether the whole of `s` (ignoring trailing spaces) is one numeric literal.
pub fn is_number_only(s: &str) -> bool {
    if s.starts_with(' ') {
        return false;
    }
    let trimmed = s.trim_end_matches(' ');
    match leading_literal(trimmed) {
        Some((Literal::Integer | Literal::Float, len)) => len == trimmed.len(),
        _ => false,
    }
}

/// Whether `s` starts with a color literal: `#` and exactly 3, 4, 6 or 8 hex digits.
pub fn is_start_of_color(s: &str) -> bool {
    match leading_literal(s) {
        Some((Literal::HexRun, len)) => matches!(len - 1, 3 | 4 | 6 | 8),
        _ => false,
    }
}

/// Whether `s` starts with an `@reference` value.
///
/// A colon before the first space means the text is a key (`@foo: ...`), not a
/// reference.
pub fn is_start_of_reference(s: &str) -> bool {
    match leading_literal(s) {
        Some((Literal::Reference, len)) => s.as_bytes().get(len) != Some(&b':'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Numbers ──────────────────────────────────────────────────────

    #[test]
    fn test_leading_number_kinds() {
        assert_eq!(leading_literal("42"), Some((Literal::Integer, 2)));
        assert_eq!(leading_literal("-4.25 px"), Some((Literal::Float, 5)));
        assert_eq!(leading_literal(".5"), Some((Literal::Float, 2)));
        assert_eq!(leading_literal("1e3"), Some((Literal::Float, 3)));
        assert_eq!(leading_literal("abc"), None);
    }

    #[test]
    fn test_start_of_number() {
        assert!(is_start_of_number("1"));
        assert!(is_start_of_number("-1"));
        assert!(is_start_of_number(".5"));
        assert!(is_start_of_number("-.5"));
        assert!(is_start_of_number("10 20"));
        assert!(!is_start_of_number("-"));
        assert!(!is_start_of_number("a1"));
        assert!(!is_start_of_number(""));
    }

    #[test]
    fn test_number_only() {
        assert!(is_number_only("10"));
        assert!(is_number_only("10.5  "));
        assert!(!is_number_only("10px"));
        assert!(!is_number_only("10 20"));
        assert!(!is_number_only(" 10"));
        assert!(!is_number_only(""));
    }

    // ── Colors ───────────────────────────────────────────────────────

    #[test]
    fn test_color_digit_counts() {
        assert!(is_start_of_color("#fff"));
        assert!(is_start_of_color("#ffff"));
        assert!(is_start_of_color("#ffffff"));
        assert!(is_start_of_color("#ffffffff"));
        assert!(is_start_of_color("#A0b1C2 rest"));

        assert!(!is_start_of_color("#ff"));
        assert!(!is_start_of_color("#fffff"));
        assert!(!is_start_of_color("#fffffff"));
        assert!(!is_start_of_color("#fffffffff"));
        assert!(!is_start_of_color("#"));
        assert!(!is_start_of_color("fff"));
    }

    #[test]
    fn test_color_counts_maximal_run() {
        // Six digits followed by more hex is not a six digit color.
        assert!(!is_start_of_color("#1234567"));
        // Non-hex characters end the run.
        assert!(is_start_of_color("#123xyz"));
    }

    // ── References ───────────────────────────────────────────────────

    #[test]
    fn test_references() {
        assert!(is_start_of_reference("@search"));
        assert!(is_start_of_reference("@search rest: of line"));
        assert!(is_start_of_reference("@"));
        assert!(!is_start_of_reference("@key: value"));
        assert!(!is_start_of_reference("search"));
    }
}
