//! Character-level scanner over configuration text.
//!
//! The cursor owns a byte offset into borrowed input and hands out tokens
//! that borrow from it whenever no escape had to be rewritten.
//!
//! # Performance
//!
//! - Zero-copy: identifiers and plain values borrow directly from input
//! - Quoted strings jump between quotes and backslashes with `memchr2`
//! - Delimiters are all ASCII, so value runs are scanned byte-wise

use std::borrow::Cow;

use memchr::memchr2;

use crate::span::Span;
use crate::tree::CowStr;

/// A scanned value: either a bare token or a quoted string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token text with quotes removed and escapes resolved.
    pub text: CowStr<'a>,
    /// Source span, including quotes for quoted strings.
    pub span: Span,
    /// The quote character, if this was a quoted string.
    pub quote: Option<char>,
    /// False when a quoted string ran to end of input.
    pub terminated: bool,
}

impl<'a> Token<'a> {
    /// Check if the token produced no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Check if the token is a quoted string missing its closing quote.
    #[inline]
    pub fn is_unterminated(&self) -> bool {
        self.quote.is_some() && !self.terminated
    }
}

/// Scanner with peek/consume access to the characters of the input.
///
/// The offset only moves forward and always sits on a UTF-8 boundary.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    /// The complete input text.
    input: &'a str,
    /// Input as bytes for efficient scanning.
    bytes: &'a [u8],
    /// Current byte offset.
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of `input`.
    #[inline]
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            offset: 0,
        }
    }

    /// Get the current byte offset.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Check if all input has been consumed.
    #[inline(always)]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Get the remaining unconsumed input.
    #[inline(always)]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.offset..]
    }

    /// Look at the current character without consuming it.
    ///
    /// Returns `None` at end of input.
    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Consume and return the current character.
    ///
    /// At end of input this returns `None` and leaves the offset alone.
    #[inline]
    pub fn consume(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    /// Consume the current character if it is `expected`.
    #[inline]
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.offset += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skip whitespace, newlines and the ASCII information separators included.
    #[inline]
    pub fn skip_whitespace(&mut self) {
        let rest = self.remaining();
        let trimmed = rest.trim_start_matches(is_space);
        self.offset += rest.len() - trimmed.len();
    }

    /// Read an identifier: letters, digits, `_`, `-`, `.` and `/`.
    ///
    /// Returns an empty string without moving when nothing matches.
    pub fn read_identifier(&mut self) -> &'a str {
        let start = self.offset;
        let len = self
            .remaining()
            .char_indices()
            .find(|&(_, c)| !is_identifier_char(c))
            .map_or(self.bytes.len() - start, |(i, _)| i);
        self.offset += len;
        &self.input[start..self.offset]
    }

    /// Read a quoted string, resolving escapes.
    ///
    /// Expects the cursor on a `"` or `'`; anything else yields an empty,
    /// unquoted token and consumes nothing. Recognized escapes are `\n`,
    /// `\t`, `\r` and `\\`; any other escaped character stands for itself.
    /// Input ending before the closing quote yields the text read so far
    /// with `terminated` cleared.
    pub fn read_quoted_string(&mut self) -> Token<'a> {
        let start = self.offset;
        let quote = match self.peek() {
            Some(q @ ('"' | '\'')) => q,
            _ => {
                return Token {
                    text: Cow::Borrowed(""),
                    span: Span::point(start),
                    quote: None,
                    terminated: true,
                }
            }
        };
        self.offset += 1;

        let mut owned: Option<String> = None;
        let mut segment_start = self.offset;
        let (segment_end, terminated) = loop {
            let Some(i) = memchr2(quote as u8, b'\\', &self.bytes[self.offset..]) else {
                self.offset = self.bytes.len();
                break (self.offset, false);
            };
            let at = self.offset + i;
            if self.bytes[at] == quote as u8 {
                self.offset = at + 1;
                break (at, true);
            }

            let buf = owned.get_or_insert_with(String::new);
            buf.push_str(&self.input[segment_start..at]);
            self.offset = at + 1;
            match self.consume() {
                Some('n') => buf.push('\n'),
                Some('t') => buf.push('\t'),
                Some('r') => buf.push('\r'),
                Some(c) => buf.push(c),
                None => {}
            }
            segment_start = self.offset;
        };

        let tail = &self.input[segment_start..segment_end];
        let text = match owned {
            Some(mut buf) => {
                buf.push_str(tail);
                Cow::Owned(buf)
            }
            None => Cow::Borrowed(tail),
        };

        Token {
            text,
            span: Span::from_offsets(start, self.offset),
            quote: Some(quote),
            terminated,
        }
    }

    /// Read one value after skipping leading whitespace.
    ///
    /// Quoted values go through [`Cursor::read_quoted_string`]; bare values
    /// run until `;`, a brace or ASCII whitespace and are trimmed.
    pub fn read_value(&mut self) -> Token<'a> {
        self.skip_whitespace();
        if matches!(self.peek(), Some('"' | '\'')) {
            return self.read_quoted_string();
        }

        let start = self.offset;
        let len = self.bytes[start..]
            .iter()
            .position(|&b| is_value_delimiter(b))
            .unwrap_or(self.bytes.len() - start);
        self.offset += len;

        Token {
            text: Cow::Borrowed(self.input[start..self.offset].trim_matches(is_space)),
            span: Span::from_offsets(start, self.offset),
            quote: None,
            terminated: true,
        }
    }

    /// Skip the body of a block whose `{` was already consumed.
    ///
    /// Nested braces are balanced and braces inside quoted strings are
    /// ignored. Returns `false` if input ended before the matching `}`.
    pub fn skip_block(&mut self) -> bool {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => return false,
                Some('"' | '\'') => {
                    self.read_quoted_string();
                }
                Some(c) => {
                    self.offset += c.len_utf8();
                    match c {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                return true;
                            }
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Get a slice of the input by span.
    #[inline]
    pub fn slice(&self, span: Span) -> &'a str {
        &self.input[span.start as usize..span.end as usize]
    }
}

/// Unicode whitespace plus the ASCII separators U+001C..=U+001F.
#[inline(always)]
fn is_space(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{1c}'..='\u{1f}')
}

#[inline(always)]
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/')
}

#[inline(always)]
fn is_value_delimiter(b: u8) -> bool {
    matches!(b, b';' | b'{' | b'}' | b' ' | b'\t' | b'\n' | b'\r')
}
