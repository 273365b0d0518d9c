//! Backslash escape decoding and encoding for string values.

/// Decode backslash escapes.
///
/// Supports `\a \b \f \n \r \t \v \0 \" \' \\`, `\xNN` (up to two hex digits)
/// and `\uNNNN` (up to four hex digits). A hex escape with value zero produces
/// nothing; an invalid code point becomes U+FFFD. Unknown escapes are kept
/// verbatim, backslash included.
pub fn unescape(s: &str) -> String {
    if !s.contains('\\') {
        return s.to_owned();
    }
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let decoded = match chars.peek().copied() {
            Some('a') => '\u{07}',
            Some('b') => '\u{08}',
            Some('f') => '\u{0c}',
            Some('n') => '\n',
            Some('r') => '\r',
            Some('t') => '\t',
            Some('v') => '\u{0b}',
            Some('0') => '\0',
            Some('"') => '"',
            Some('\'') => '\'',
            Some('\\') => '\\',
            Some(kind @ ('x' | 'u')) => {
                chars.next();
                let max_digits = if kind == 'x' { 2 } else { 4 };
                let mut code = 0u32;
                for _ in 0..max_digits {
                    match chars.peek().and_then(|c| c.to_digit(16)) {
                        Some(digit) => {
                            code = (code << 4) | digit;
                            chars.next();
                        }
                        None => break,
                    }
                }
                if code != 0 {
                    out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                }
                continue;
            }
            _ => {
                out.push('\\');
                continue;
            }
        };
        chars.next();
        out.push(decoded);
    }
    out
}

/// Encode `s` so that [`unescape`] restores it exactly.
///
/// Printable characters, including non-ASCII, are kept as-is; quotes,
/// backslashes and control characters are escaped.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        match c {
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0b}' => out.push_str("\\v"),
            '\0' => out.push_str("\\0"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            c if c.is_control() => {
                // Two digit \x escapes only reach U+00FF; everything here is below that.
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_simple_escapes() {
        assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
        assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
        assert_eq!(unescape(r"it\'s"), "it's");
        assert_eq!(unescape(r"back\\slash"), "back\\slash");
        assert_eq!(unescape(r"\a\b\f\v\r\0"), "\u{07}\u{08}\u{0c}\u{0b}\r\0");
    }

    #[test]
    fn test_hex_escapes() {
        assert_eq!(unescape(r"\x41\x42"), "AB");
        assert_eq!(unescape(r"\x4"), "\u{04}");
        // Only two digits are read for \x.
        assert_eq!(unescape(r"\x414"), "A4");
        assert_eq!(unescape(r"\u00e5"), "å");
        assert_eq!(unescape(r"\u20AC!"), "€!");
        assert_eq!(unescape(r"\u00e5\u00e4\u00f6"), "åäö");
    }

    #[test]
    fn test_zero_hex_escape_is_dropped() {
        assert_eq!(unescape(r"a\x00b"), "ab");
        assert_eq!(unescape(r"a\xzzb"), "azzb");
    }

    #[test]
    fn test_unknown_escape_keeps_backslash() {
        assert_eq!(unescape(r"c:\path"), r"c:\path");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }

    #[test]
    fn test_surrogate_code_point_becomes_replacement() {
        assert_eq!(unescape(r"\ud800"), "\u{fffd}");
    }

    #[test]
    fn test_escape_round_trip() {
        let samples = [
            "plain",
            "quote \" and 'single'",
            "back\\slash\\",
            "tabs\tand\nnewlines\r\n",
            "bell\u{07} vt\u{0b} nul\0 esc\u{1b}",
            "unicode åäö € 日本",
        ];
        for s in samples {
            assert_eq!(unescape(&escape(s)), s, "round trip of {s:?}");
        }
    }

    #[test]
    fn test_escape_output() {
        assert_eq!(escape("a\"b\\c\n"), r#"a\"b\\c\n"#);
        assert_eq!(escape("\u{1b}"), r"\x1b");
    }
}
