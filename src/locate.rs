//! Source Localization
//!
//! Parsing a document into a `serde_json::Value` throws positions away, so
//! localization re-walks the original JSON text: a small scanner follows a
//! document path through objects and arrays and reports where the value (or
//! its key) starts.
//!
//! Lines and columns are 1-based, columns count chars, offsets are 0-based
//! byte offsets. For duplicate keys the last occurrence wins, matching what
//! the parser keeps.

use serde::{Deserialize, Serialize};

use crate::pointer;

/// Position in source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// What part of a member to point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The member's value
    Value,
    /// The member's key (falls back to the value for array elements)
    Key,
}

/// Line index plus scanner over one JSON source text
#[derive(Debug)]
pub struct SourceMap<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> SourceMap<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// Location of the value (or key) at `path`
    pub fn locate(&self, path: &str, anchor: Anchor) -> Option<SourceLocation> {
        let segments = pointer::segments(path);
        let mut scanner = Scanner::new(self.text);
        let (key, value) = scanner.find(&segments)?;
        let offset = match anchor {
            Anchor::Key => key.unwrap_or(value),
            Anchor::Value => value,
        };
        Some(self.location(offset))
    }

    /// Line/column of a byte offset
    pub fn location(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.text.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_index];
        let column = self.text.get(line_start..offset).map(|s| s.chars().count()).unwrap_or(0) + 1;
        SourceLocation {
            line: line_index + 1,
            column,
            offset,
        }
    }

    /// Text of a 1-based line, without its terminator
    pub fn line_text(&self, line: usize) -> Option<&'a str> {
        let start = *self.line_starts.get(line.checked_sub(1)?)?;
        let end = self
            .line_starts
            .get(line)
            .map(|next| next - 1)
            .unwrap_or(self.text.len());
        self.text.get(start..end).map(|s| s.trim_end_matches('\r'))
    }
}

struct Scanner<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            text,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
        // A leading byte-order mark is tolerated like whitespace
        if self.pos == 0 && self.text.starts_with('\u{feff}') {
            self.pos = '\u{feff}'.len_utf8();
            self.skip_ws();
        }
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        self.skip_ws();
        if self.peek()? == byte {
            self.pos += 1;
            Some(())
        } else {
            None
        }
    }

    /// Follow `segments` from the current position. Returns the key offset
    /// (for object members) and the value offset of the target.
    fn find(&mut self, segments: &[String]) -> Option<(Option<usize>, usize)> {
        self.skip_ws();
        let mut key_at = None;
        for segment in segments {
            match self.peek()? {
                b'{' => {
                    let (key, value) = self.find_member(segment)?;
                    key_at = Some(key);
                    self.pos = value;
                }
                b'[' => {
                    let index: usize = segment.parse().ok()?;
                    key_at = None;
                    self.pos = self.find_element(index)?;
                }
                _ => return None,
            }
        }
        Some((key_at, self.pos))
    }

    /// Scan a whole object; offsets of the last member named `name`
    fn find_member(&mut self, name: &str) -> Option<(usize, usize)> {
        self.expect(b'{')?;
        let mut found = None;
        self.skip_ws();
        if self.peek()? == b'}' {
            return None;
        }
        loop {
            self.skip_ws();
            let key_start = self.pos;
            let key = self.read_string()?;
            self.expect(b':')?;
            self.skip_ws();
            let value_start = self.pos;
            if key == name {
                found = Some((key_start, value_start));
            }
            self.skip_value()?;
            self.skip_ws();
            match self.peek()? {
                b',' => self.pos += 1,
                b'}' => {
                    self.pos += 1;
                    break;
                }
                _ => return None,
            }
        }
        found
    }

    fn find_element(&mut self, index: usize) -> Option<usize> {
        self.expect(b'[')?;
        let mut i = 0;
        loop {
            self.skip_ws();
            if self.peek()? == b']' {
                return None;
            }
            if i == index {
                return Some(self.pos);
            }
            self.skip_value()?;
            self.skip_ws();
            match self.peek()? {
                b',' => self.pos += 1,
                _ => return None,
            }
            i += 1;
        }
    }

    fn skip_value(&mut self) -> Option<()> {
        self.skip_ws();
        match self.peek()? {
            b'"' => self.read_string().map(|_| ()),
            b'{' | b'[' => self.skip_container(),
            _ => {
                // number or literal
                let start = self.pos;
                while matches!(self.peek(), Some(b) if !matches!(b, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r')) {
                    self.pos += 1;
                }
                (self.pos > start).then_some(())
            }
        }
    }

    fn skip_container(&mut self) -> Option<()> {
        let mut depth = 0usize;
        loop {
            match self.peek()? {
                b'"' => {
                    self.read_string()?;
                    continue;
                }
                b'{' | b'[' => depth += 1,
                b'}' | b']' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos += 1;
                        return Some(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    /// Read a string literal, decoding escapes
    fn read_string(&mut self) -> Option<String> {
        if self.peek()? != b'"' {
            return None;
        }
        self.pos += 1;
        let mut out = String::new();
        let mut run_start = self.pos;
        loop {
            match self.peek()? {
                b'"' => {
                    out.push_str(self.text.get(run_start..self.pos)?);
                    self.pos += 1;
                    return Some(out);
                }
                b'\\' => {
                    out.push_str(self.text.get(run_start..self.pos)?);
                    self.pos += 1;
                    let escaped = self.peek()?;
                    self.pos += 1;
                    match escaped {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'b' => out.push('\u{8}'),
                        b'f' => out.push('\u{c}'),
                        b'n' => out.push('\n'),
                        b'r' => out.push('\r'),
                        b't' => out.push('\t'),
                        b'u' => out.push(self.read_unicode_escape()?),
                        _ => return None,
                    }
                    run_start = self.pos;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn read_hex4(&mut self) -> Option<u32> {
        let hex = self.text.get(self.pos..self.pos + 4)?;
        let code = u32::from_str_radix(hex, 16).ok()?;
        self.pos += 4;
        Some(code)
    }

    fn read_unicode_escape(&mut self) -> Option<char> {
        let high = self.read_hex4()?;
        if (0xD800..0xDC00).contains(&high) {
            // surrogate pair: expect \uDC00..\uDFFF
            if self.text.get(self.pos..self.pos + 2)? != "\\u" {
                return Some(char::REPLACEMENT_CHARACTER);
            }
            self.pos += 2;
            let low = self.read_hex4()?;
            let code = 0x10000 + ((high - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
            return Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
        }
        Some(char::from_u32(high).unwrap_or(char::REPLACEMENT_CHARACTER))
    }
}
