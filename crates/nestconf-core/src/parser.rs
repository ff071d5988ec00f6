//! Recursive-descent block parser.
//!
//! Borrows directly from input, allocating only for escaped strings and
//! joined multi-token values. Malformed input degrades into a partial tree
//! while the problems are collected as [`ParseError`]s.

use std::borrow::Cow;

use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::error::{ParseError, ParseErrors};
use crate::span::Span;
use crate::tree::{ConfigNode, ConfigValue, CowStr};

/// Default limit on block nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Result type for parsing that includes recovered errors.
#[derive(Debug)]
pub struct ParseResult<'a> {
    /// The parsed configuration (may be partial if errors occurred).
    pub config: ConfigNode<'a>,
    /// Errors encountered during parsing.
    pub errors: ParseErrors,
}

impl<'a> ParseResult<'a> {
    /// Check if parsing completed without errors.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if any error caused input to be dropped.
    pub fn has_fatal_errors(&self) -> bool {
        self.errors.has_fatal()
    }
}

/// Configuration parser with error recovery.
#[derive(Debug, Clone)]
pub struct Parser {
    /// Errors collected during the current parse.
    errors: ParseErrors,
    /// Whether to keep scanning after an error.
    recover_on_error: bool,
    /// Set once an error stops the parse when recovery is off.
    halted: bool,
    max_depth: Option<usize>,
    token_lists: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with recovery on and the default depth limit.
    #[inline]
    pub fn new() -> Self {
        Self {
            errors: ParseErrors::new(),
            recover_on_error: true,
            halted: false,
            max_depth: Some(DEFAULT_MAX_DEPTH),
            token_lists: false,
        }
    }

    /// Enable or disable error recovery mode.
    ///
    /// When enabled (default), the parser keeps scanning after an error,
    /// collecting every problem it recovers from. When disabled, parsing
    /// stops at the first error.
    pub fn with_recovery(mut self, recover: bool) -> Self {
        self.recover_on_error = recover;
        self
    }

    /// Limit block nesting; `None` removes the limit.
    ///
    /// A block that would nest deeper is skipped and reported as
    /// [`ParseErrorKind::DepthExceeded`](crate::ParseErrorKind::DepthExceeded).
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Keep the tokens of a multi-token directive as a
    /// [`ConfigValue::List`] instead of joining them with spaces.
    pub fn with_token_lists(mut self, enabled: bool) -> Self {
        self.token_lists = enabled;
        self
    }

    /// Parse with error recovery, returning both the tree and errors.
    #[inline]
    pub fn parse_with_recovery<'a>(&mut self, input: &'a str) -> ParseResult<'a> {
        let config = self.parse_internal(input);
        ParseResult {
            config,
            errors: std::mem::take(&mut self.errors),
        }
    }

    /// Parse the input, returning the first error if any occurred.
    #[inline]
    pub fn parse<'a>(&mut self, input: &'a str) -> Result<ConfigNode<'a>, ParseError> {
        let config = self.parse_internal(input);
        let errors = std::mem::take(&mut self.errors);
        match errors.into_iter().next() {
            Some(error) => Err(error),
            None => Ok(config),
        }
    }

    fn parse_internal<'a>(&mut self, input: &'a str) -> ConfigNode<'a> {
        self.errors = ParseErrors::new();
        self.halted = false;

        let mut cursor = Cursor::new(input);
        let mut root = self.parse_block(&mut cursor, 0);

        if !self.halted && cursor.peek() == Some('}') {
            let at = cursor.offset();
            self.record_error(ParseError::unmatched_close_brace(Span::from_offsets(
                at,
                at + 1,
            )));
        }

        root.span = Span::from_offsets(0, input.len());
        root
    }

    /// Record an error during parsing.
    #[inline]
    fn record_error(&mut self, error: ParseError) {
        debug!(kind = ?error.kind, span = ?error.span, "{}", error.message);
        if !self.recover_on_error {
            self.halted = true;
        }
        self.errors.push(error);
    }

    /// Parse directives until end of input or a `}` left for the caller.
    fn parse_block<'a>(&mut self, cursor: &mut Cursor<'a>, depth: usize) -> ConfigNode<'a> {
        trace!(depth, offset = cursor.offset(), "enter block");
        let start = cursor.offset();
        let mut node = ConfigNode::new();

        while !self.halted {
            cursor.skip_whitespace();
            let name_start = cursor.offset();
            let found = match cursor.peek() {
                None | Some('}') => break,
                Some(c) => c,
            };

            let name = cursor.read_identifier();
            if name.is_empty() {
                let span = Span::from_offsets(name_start, name_start + found.len_utf8());
                self.record_error(ParseError::empty_directive_name(found, span));
                // Every enclosing block would stop on the same character.
                self.halted = true;
                break;
            }
            trace!(directive = name, depth, "directive");

            cursor.skip_whitespace();
            if cursor.peek() == Some('{') {
                if let Some(child) = self.parse_nested(cursor, name, name_start, depth) {
                    node.insert(name, ConfigValue::Block(child));
                }
            } else {
                let value = self.parse_values(cursor);
                node.insert(name, value);
            }
        }

        node.span = Span::from_offsets(start, cursor.offset());
        trace!(depth, offset = cursor.offset(), "leave block");
        node
    }

    /// Parse a `{ ... }` body with the cursor on its `{`.
    ///
    /// Returns `None` when the block was skipped for exceeding the depth
    /// limit.
    fn parse_nested<'a>(
        &mut self,
        cursor: &mut Cursor<'a>,
        name: &str,
        name_start: usize,
        depth: usize,
    ) -> Option<ConfigNode<'a>> {
        let open = cursor.offset();
        cursor.consume();

        if let Some(limit) = self.max_depth.filter(|&limit| depth >= limit) {
            self.record_error(ParseError::depth_exceeded(
                name,
                limit,
                Span::from_offsets(name_start, open + 1),
            ));
            if !cursor.skip_block() && !self.halted {
                self.record_error(ParseError::unclosed_block(
                    name,
                    Span::from_offsets(name_start, cursor.offset()),
                ));
            }
            return None;
        }

        let child = self.parse_block(cursor, depth + 1);
        if self.halted {
            return Some(child);
        }

        cursor.skip_whitespace();
        // An inner stop on a bad directive leaves the cursor mid-block and
        // has already been reported.
        if !cursor.eat('}') && cursor.is_eof() {
            self.record_error(ParseError::unclosed_block(
                name,
                Span::from_offsets(name_start, cursor.offset()),
            ));
        }
        Some(child)
    }

    /// Parse the values of a directive up to and including its `;`.
    fn parse_values<'a>(&mut self, cursor: &mut Cursor<'a>) -> ConfigValue<'a> {
        let mut values: Vec<CowStr<'a>> = Vec::new();

        let first = self.read_value(cursor);
        if !first.is_empty() {
            values.push(first);
        }

        loop {
            cursor.skip_whitespace();
            if matches!(cursor.peek(), None | Some(';' | '{' | '}')) {
                break;
            }
            let more = self.read_value(cursor);
            if more.is_empty() {
                break;
            }
            values.push(more);
        }

        cursor.skip_whitespace();
        cursor.eat(';');

        match values.len() {
            0 => ConfigValue::Str(Cow::Borrowed("")),
            1 => ConfigValue::Str(values.swap_remove(0)),
            _ if self.token_lists => ConfigValue::List(values),
            _ => ConfigValue::Str(Cow::Owned(values.join(" "))),
        }
    }

    fn read_value<'a>(&mut self, cursor: &mut Cursor<'a>) -> CowStr<'a> {
        let token = cursor.read_value();
        if token.is_unterminated() {
            let quote = token.quote.unwrap_or('"');
            self.record_error(ParseError::unterminated_string(quote, token.span));
        }
        token.text
    }
}

/// Parse leniently, returning whatever tree the input yields.
///
/// ```rust
/// let config = nestconf_core::parse("a 1; a 2; d foo bar;");
/// assert_eq!(config.get("a").map(|e| e.len()), Some(2));
/// assert_eq!(config.get("d").and_then(|e| e.first()).and_then(|v| v.as_str()), Some("foo bar"));
/// ```
pub fn parse(input: &str) -> ConfigNode<'_> {
    Parser::new().parse_with_recovery(input).config
}

/// Parse strictly, failing on the first malformed construct.
pub fn parse_strict(input: &str) -> Result<ConfigNode<'_>, ParseError> {
    Parser::new().with_recovery(false).parse(input)
}
