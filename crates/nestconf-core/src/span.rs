//! Source location tracking for parsed blocks and errors.
//!
//! Blocks and errors carry a `Span` pointing back into the configuration
//! text, so callers can report problems against the original input.

use std::ops::Range;

/// A byte range in the source text.
///
/// Spans use byte offsets (not character offsets).
/// Both `start` and `end` are inclusive-exclusive: `[start, end)`.
///
/// # Example
///
/// ```rust
/// use nestconf_core::span::Span;
///
/// let span = Span::new(4, 10);
/// assert_eq!(span.len(), 6);
/// assert!(span.contains(4));
/// assert!(!span.contains(10));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: u32,
    /// Ending byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a span from `usize` offsets as produced by the cursor.
    ///
    /// Offsets past `u32::MAX` saturate, so spans in inputs of 4 GiB or
    /// more point at the end of the addressable range instead of wrapping.
    #[inline]
    pub fn from_offsets(start: usize, end: usize) -> Self {
        Self::new(saturate(start), saturate(end))
    }

    /// A zero-length span at `offset`.
    #[inline]
    pub fn point(offset: usize) -> Self {
        Self::from_offsets(offset, offset)
    }

    /// Get the length of this span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Check if this span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if this span contains a byte offset.
    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }
}

#[inline]
fn saturate(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX)
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start as usize..span.end as usize
    }
}
