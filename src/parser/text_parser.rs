//! Indentation-sensitive, line-oriented parser for the declarative UI format.
//!
//! The parser never builds a tree itself. It reports structure to a
//! [`TextParserTarget`] as a flat sequence of calls:
//!
//! ```text
//! Window                 on_token("Window", Null)
//! 	text "Hello"         enter(), on_token("text", "Hello")
//! 	Button: id: ok       on_token("Button", Null), enter(), on_token("id", "ok"), leave()
//! Label                  leave(), on_token("Label", Null)
//! ```
//!
//! Input is pulled from a [`TextParserStream`] one chunk at a time. Partial
//! lines and an unfinished multiline value carry over between chunks.

use std::io;

use super::escape::unescape;
use super::lexer::{is_start_of_color, is_start_of_number, is_start_of_reference};
use crate::value::Value;

const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const CHUNK_SIZE: usize = 1024;

/// Receiver of parse events.
pub trait TextParserTarget {
    /// A nested scope opens under the most recent token.
    fn enter(&mut self);
    /// The innermost scope closes.
    fn leave(&mut self);
    /// A token with an optional value (`Value::Null` when the line has none).
    fn on_token(&mut self, line_nr: usize, token: &str, value: Value);
    /// A `#` comment, with the indentation and the hash stripped.
    fn on_comment(&mut self, line_nr: usize, text: &str) {
        let _ = (line_nr, text);
    }
    /// A recoverable structural error. The offending line has been skipped.
    fn on_error(&mut self, line_nr: usize, message: &str);
}

/// Source of raw bytes for [`TextParser::read`].
pub trait TextParserStream {
    /// Fill `buf` with the next chunk. Returning `Ok(0)` ends the stream.
    fn more_data(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

/// Stream over an in-memory byte slice, optionally in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct SliceStream<'a> {
    data: &'a [u8],
    chunk_size: usize,
}

impl<'a> SliceStream<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, chunk_size: usize::MAX }
    }

    /// Hand out at most `chunk_size` bytes per call.
    pub fn chunked(data: &'a [u8], chunk_size: usize) -> Self {
        Self { data, chunk_size: chunk_size.max(1) }
    }
}

impl TextParserStream for SliceStream<'_> {
    fn more_data(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let len = self.data.len().min(buf.len()).min(self.chunk_size);
        let (head, tail) = self.data.split_at(len);
        buf[..len].copy_from_slice(head);
        self.data = tail;
        Ok(len)
    }
}

/// Stream over any [`io::Read`], such as a file.
#[derive(Debug)]
pub struct ReadStream<R>(pub R);

impl<R: io::Read> TextParserStream for ReadStream<R> {
    fn more_data(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.0.read(buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }
}

/// A value being continued over several lines with trailing backslashes.
#[derive(Debug)]
struct PendingMultiline {
    token: String,
    /// Whether the value sits inside a compact block that still needs its `leave()`.
    close_scope: bool,
    buffer: String,
}

/// A value read from the front of a line and what follows it.
struct Consumed<'a> {
    value: Value,
    continues: bool,
    rest: &'a str,
}

/// The declarative format parser. One instance can be reused for several reads.
#[derive(Debug, Default)]
pub struct TextParser {
    current_indent: usize,
    line_nr: usize,
    pending: Option<PendingMultiline>,
}

impl TextParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse everything `stream` produces, reporting to `target`.
    ///
    /// Content problems never fail the read; they are reported through
    /// [`TextParserTarget::on_error`]. The only error is an I/O failure of
    /// the stream. At end of input an unfinished multiline value is flushed
    /// and every open scope is closed, so `enter`/`leave` always balance.
    pub fn read(
        &mut self,
        stream: &mut dyn TextParserStream,
        target: &mut dyn TextParserTarget,
    ) -> io::Result<()> {
        self.current_indent = 0;
        self.line_nr = 1;
        self.pending = None;

        let mut chunk = vec![0u8; CHUNK_SIZE];
        let mut line: Vec<u8> = Vec::new();
        let mut first_chunk = true;

        loop {
            let read_len = stream.more_data(&mut chunk)?;
            if read_len == 0 {
                break;
            }
            let mut data = &chunk[..read_len];
            if first_chunk && data.starts_with(BOM) {
                data = &data[BOM.len()..];
            }
            first_chunk = false;

            while let Some(newline) = data.iter().position(|&b| b == b'\n') {
                line.extend_from_slice(&data[..newline]);
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.process_line(&line, target);
                line.clear();
                data = &data[newline + 1..];
            }
            line.extend_from_slice(data);
        }
        if !line.is_empty() {
            self.process_line(&line, target);
        }
        self.finish(target);
        Ok(())
    }

    /// Parse an in-memory document.
    pub fn read_str(&mut self, text: &str, target: &mut dyn TextParserTarget) {
        // An in-memory slice stream cannot fail.
        let _ = self.read(&mut SliceStream::new(text.as_bytes()), target);
    }

    fn process_line(&mut self, raw: &[u8], target: &mut dyn TextParserTarget) {
        let line = String::from_utf8_lossy(raw);
        self.on_line(&line, target);
        self.line_nr += 1;
    }

    fn finish(&mut self, target: &mut dyn TextParserTarget) {
        if let Some(pending) = self.pending.take() {
            target.on_token(self.line_nr - 1, &pending.token, Value::String(pending.buffer));
            if pending.close_scope {
                target.leave();
            }
        }
        while self.current_indent > 0 {
            target.leave();
            self.current_indent -= 1;
        }
    }

    fn on_line(&mut self, line: &str, target: &mut dyn TextParserTarget) {
        let content = skip_white_space(line);
        if content.is_empty() {
            return;
        }
        if let Some(comment) = content.strip_prefix('#') {
            target.on_comment(self.line_nr, comment);
            return;
        }
        if self.pending.is_some() {
            self.on_multiline(content, target);
            return;
        }

        let indent = line.bytes().take_while(|&b| b == b'\t').count();
        if indent > self.current_indent + 1 {
            target.on_error(self.line_nr, "Indentation error. (Line skipped)");
            return;
        }
        if indent > self.current_indent {
            target.enter();
            self.current_indent += 1;
        }
        while indent < self.current_indent {
            target.leave();
            self.current_indent -= 1;
        }

        let line = skip_white_space(&line[indent..]);
        let token_len = line.find([' ', '\t']).unwrap_or(line.len());
        let (token, rest) = line.split_at(token_len);
        let rest = skip_white_space(rest);

        if let Some(token) = token.strip_suffix(':') {
            let mut rest = rest;
            let mut value = Value::Null;
            if starts_inline_value(rest) {
                let consumed = consume_value(rest);
                if consumed.continues {
                    self.pending = Some(PendingMultiline {
                        token: token.to_owned(),
                        close_scope: false,
                        buffer: consumed.value.as_string(),
                    });
                    return;
                }
                value = consumed.value;
                rest = consumed.rest;
            }
            target.on_token(self.line_nr, token, value);
            self.on_compact_line(rest, target);
        } else if rest.is_empty() {
            target.on_token(self.line_nr, token, Value::Null);
        } else if rest.starts_with(['"', '\'', '[']) {
            let consumed = consume_value(rest);
            if consumed.continues {
                self.pending = Some(PendingMultiline {
                    token: token.to_owned(),
                    close_scope: false,
                    buffer: consumed.value.as_string(),
                });
                return;
            }
            target.on_token(self.line_nr, token, consumed.value);
        } else {
            let (text, continues) = strip_continuation(rest);
            let value = Value::parse_auto(&unescape(text));
            if continues {
                self.pending = Some(PendingMultiline {
                    token: token.to_owned(),
                    close_scope: false,
                    buffer: value.as_string(),
                });
                return;
            }
            target.on_token(self.line_nr, token, value);
        }
    }

    /// The `key: value, key: value` tail of a compact line, wrapped in its own scope.
    fn on_compact_line(&mut self, mut line: &str, target: &mut dyn TextParserTarget) {
        target.enter();
        loop {
            line = skip_white_space(line);
            let Some(colon) = line.find(':') else {
                break;
            };
            let key = &line[..colon];
            let consumed = consume_value(skip_white_space(&line[colon + 1..]));
            if consumed.continues {
                self.pending = Some(PendingMultiline {
                    token: key.to_owned(),
                    close_scope: true,
                    buffer: consumed.value.as_string(),
                });
                return;
            }
            target.on_token(self.line_nr, key, consumed.value);
            line = consumed.rest;
        }
        target.leave();
    }

    fn on_multiline(&mut self, line: &str, target: &mut dyn TextParserTarget) {
        let consumed = consume_value(line);
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.buffer.push_str(&consumed.value.as_string());
        if consumed.continues {
            return;
        }
        if let Some(pending) = self.pending.take() {
            target.on_token(self.line_nr, &pending.token, Value::String(pending.buffer));
            if pending.close_scope {
                target.leave();
            }
        }
    }
}

fn skip_white_space(s: &str) -> &str {
    s.trim_start_matches([' ', '\t'])
}

/// Whether the text after `token:` is the token's own value rather than the
/// first key of the compact block.
fn starts_inline_value(s: &str) -> bool {
    s.starts_with(['[', '"', '\''])
        || is_start_of_number(s)
        || is_start_of_color(s)
        || is_start_of_reference(s)
}

/// Whether `s` is only whitespace and a lone trailing backslash.
fn is_pending_multiline(s: &str) -> bool {
    skip_white_space(s) == "\\"
}

/// Split an unquoted value from a trailing ` \` continuation marker.
fn strip_continuation(s: &str) -> (&str, bool) {
    let trimmed = s.trim_end_matches([' ', '\t']);
    match trimmed.strip_suffix('\\') {
        Some(text) if text.is_empty() || text.ends_with([' ', '\t']) => {
            (text.trim_end_matches([' ', '\t']), true)
        }
        _ => (trimmed, false),
    }
}

/// Whether the quote at byte `pos` closes a string whose content starts at `start`.
fn is_end_quote(bytes: &[u8], start: usize, pos: usize, quote: u8) -> bool {
    if bytes[pos] != quote {
        return false;
    }
    let backslashes = bytes[start..pos].iter().rev().take_while(|&&b| b == b'\\').count();
    backslashes % 2 == 0
}

/// Read one value from the front of `line`.
///
/// Quoted values run to the matching unescaped quote and stay strings.
/// Bracketed values run to the closing `]`. Anything else runs to the next
/// comma and is auto-typed. A trailing comma is consumed, and the value
/// continues on the next line if only a backslash remains after it.
fn consume_value(line: &str) -> Consumed<'_> {
    let bytes = line.as_bytes();
    match bytes.first() {
        Some(&quote @ (b'"' | b'\'')) => {
            let start = 1;
            let end = (start..bytes.len())
                .find(|&pos| is_end_quote(bytes, start, pos, quote))
                .unwrap_or(bytes.len());
            let text = &line[start..end];
            let mut rest = if end < bytes.len() { &line[end + 1..] } else { "" };
            rest = skip_white_space(rest);
            rest = rest.strip_prefix(',').unwrap_or(rest);
            Consumed {
                value: Value::String(unescape(text)),
                continues: is_pending_multiline(rest),
                rest,
            }
        }
        Some(b'[') if line.contains(']') => {
            let close = line.find(']').map_or(line.len(), |i| i + 1);
            let text = &line[..close];
            let mut rest = skip_white_space(&line[close..]);
            rest = rest.strip_prefix(',').unwrap_or(rest);
            Consumed {
                value: Value::parse_auto(&unescape(text)),
                continues: is_pending_multiline(rest),
                rest,
            }
        }
        Some(b'[') => {
            // No closing bracket: the rest of the line is one value.
            let (text, continues) = strip_continuation(line);
            Consumed {
                value: Value::parse_auto(&unescape(text)),
                continues,
                rest: "",
            }
        }
        _ => match line.find(',') {
            Some(comma) => {
                let rest = &line[comma + 1..];
                Consumed {
                    value: Value::parse_auto(&unescape(line[..comma].trim_end())),
                    continues: is_pending_multiline(rest),
                    rest,
                }
            }
            None => {
                let (text, continues) = strip_continuation(line);
                Consumed {
                    value: Value::parse_auto(&unescape(text)),
                    continues,
                    rest: "",
                }
            }
        },
    }
}
