//! Byte spans into a component document and their line/column positions.

use std::fmt;
use std::ops::Range;

/// Half-open byte range `[start, end)` in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// A zero-width span, used to point at a position rather than a range.
    pub const fn empty(at: u32) -> Self {
        Self { start: at, end: at }
    }

    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// The text under the span, or `None` when it does not fall on char
    /// boundaries inside `source`.
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.to_range())
    }
}

/// Maps byte offsets to lines and columns.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Offset of the first byte of every line.
    starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i as u32 + 1))
            .collect();
        Self {
            starts,
            len: text.len() as u32,
        }
    }

    /// Zero-based position of `offset`. Offsets past the end clamp to it.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self.starts.partition_point(|&s| s <= offset) - 1;
        LineCol {
            line: line as u32,
            col: offset - self.starts[line],
        }
    }
}

/// Zero-based line and byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineCol {
    pub line: u32,
    pub col: u32,
}

impl LineCol {
    /// One-based `(line, column)` as shown to users.
    pub const fn to_display(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (line, col) = self.to_display();
        write!(f, "{line}:{col}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_checks_bounds() {
        let source = "<script>x</script>";
        assert_eq!(Span::new(8, 9).slice(source), Some("x"));
        assert_eq!(Span::empty(8).slice(source), Some(""));
        assert_eq!(Span::new(8, 90).slice(source), None);
    }

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("ab\n\ncd");
        assert_eq!(index.line_col(0), LineCol { line: 0, col: 0 });
        assert_eq!(index.line_col(2), LineCol { line: 0, col: 2 });
        assert_eq!(index.line_col(3), LineCol { line: 1, col: 0 });
        assert_eq!(index.line_col(5), LineCol { line: 2, col: 1 });
        assert_eq!(index.line_col(99), LineCol { line: 2, col: 2 });
    }

    #[test]
    fn test_display_is_one_based() {
        assert_eq!(LineCol { line: 3, col: 0 }.to_string(), "4:1");
        assert_eq!(LineIndex::new("a\nb").line_col(2).to_display(), (2, 1));
    }
}
