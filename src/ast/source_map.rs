//! Line index over one source string.
//!
//! Spans store a 1-based line and a 0-based byte column. Diagnostics print
//! columns 1-based, so [`Snippet`] carries the display form.

use std::ops::Range;

use super::Span;

pub struct SourceMap<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

/// A span placed on its first line for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snippet<'src> {
    /// 1-based.
    pub line: usize,
    /// 1-based.
    pub column: usize,
    /// The line without its terminator.
    pub text: &'src str,
    /// Caret count: the span's length, cut off at the end of the line and
    /// never less than one.
    pub width: usize,
}

impl<'src> SourceMap<'src> {
    pub fn new(source: &'src str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { source, line_starts }
    }

    /// 0-based line holding `offset`. Offsets past the end land on the last
    /// line.
    fn line_index(&self, offset: usize) -> usize {
        self.line_starts.partition_point(|&start| start <= offset).saturating_sub(1)
    }

    /// The span of a token's byte range.
    pub fn span(&self, range: Range<usize>) -> Span {
        let line = self.line_index(range.start);
        Span {
            start: range.start,
            end: range.end,
            line: (line + 1) as u32,
            column: (range.start - self.line_starts[line]) as u32,
        }
    }

    /// Text of the 1-based `line` without `\n` or `\r\n`; empty when out of
    /// range.
    pub fn line(&self, line: usize) -> &'src str {
        let Some(&start) = line.checked_sub(1).and_then(|i| self.line_starts.get(i)) else {
            return "";
        };
        let end = self.line_starts.get(line).map_or(self.source.len(), |&next| next - 1);
        self.source[start..end].trim_end_matches('\r')
    }

    pub fn snippet(&self, start: usize, end: usize) -> Snippet<'src> {
        let index = self.line_index(start);
        let text = self.line(index + 1);
        let column = start.saturating_sub(self.line_starts[index]);
        let room = text.len().saturating_sub(column).max(1);
        Snippet {
            line: index + 1,
            column: column + 1,
            text,
            width: end.saturating_sub(start).clamp(1, room),
        }
    }
}
