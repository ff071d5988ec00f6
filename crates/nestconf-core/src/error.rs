use crate::span::Span;
use thiserror::Error;

/// Error kinds for categorizing parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ParseErrorKind {
    /// A quoted value ran to end of input without its closing quote
    #[error("unterminated quoted string")]
    UnterminatedString,
    /// No directive name where a directive must start
    #[error("expected directive name")]
    EmptyDirectiveName,
    /// A block never closed, or a `}` closed nothing
    #[error("unbalanced braces")]
    UnbalancedBraces,
    /// Blocks nested deeper than the configured limit
    #[error("nesting depth exceeded")]
    DepthExceeded,
}

/// A parse error with location and recovery information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at bytes {}..{}", .span.start, .span.end)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Source location where the error occurred
    pub span: Span,
    /// Error categorization
    pub kind: ParseErrorKind,
    /// Whether the lenient parser kept going after this error
    pub recoverable: bool,
}

impl ParseError {
    /// Create a new parse error of the given kind.
    pub fn new(kind: ParseErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind,
            recoverable: true,
        }
    }

    /// Create an error for a quoted string missing its closing quote.
    pub fn unterminated_string(quote: char, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnterminatedString,
            format!("unterminated string, missing closing {}", quote),
            span,
        )
    }

    /// Create an error for text that does not start a directive.
    pub fn empty_directive_name(found: char, span: Span) -> Self {
        Self::new(
            ParseErrorKind::EmptyDirectiveName,
            format!("expected directive name, found {:?}", found),
            span,
        )
        .non_recoverable()
    }

    /// Create an error for a block that is never closed.
    pub fn unclosed_block(directive: &str, span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnbalancedBraces,
            format!("unclosed block '{}'", directive),
            span,
        )
    }

    /// Create an error for a `}` with no open block.
    pub fn unmatched_close_brace(span: Span) -> Self {
        Self::new(
            ParseErrorKind::UnbalancedBraces,
            "unmatched closing brace",
            span,
        )
        .non_recoverable()
    }

    /// Create an error for a block nested beyond `limit`.
    pub fn depth_exceeded(directive: &str, limit: usize, span: Span) -> Self {
        Self::new(
            ParseErrorKind::DepthExceeded,
            format!(
                "block '{}' exceeds maximum nesting depth of {}",
                directive, limit
            ),
            span,
        )
    }

    /// Mark this error as non-recoverable.
    pub fn non_recoverable(mut self) -> Self {
        self.recoverable = false;
        self
    }
}

/// A collection of parse errors encountered during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    /// Create an empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if any errors were collected.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// The first error in source order of discovery.
    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Check if any error caused input to be dropped from the tree.
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| !e.recoverable)
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
