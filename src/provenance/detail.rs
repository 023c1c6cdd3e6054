use std::ops::Range;

/// 1-based line number in the source buffer.
pub type SourceLine = u32;

/// One rendered item of a stage's output and the half-open range of source
/// lines `[start_line, end_line)` it was derived from.
///
/// A detail with `end_line == start_line` is not tied to any source line
/// (titles, table footers) and never takes part in highlighting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detail {
    pub text: String,
    pub start_line: SourceLine,
    pub end_line: SourceLine,
}

impl Detail {
    pub fn new(text: impl Into<String>, start_line: SourceLine, end_line: SourceLine) -> Self {
        Self {
            text: text.into(),
            start_line,
            end_line,
        }
    }

    /// Detail derived from exactly one source line.
    pub fn on_line(text: impl Into<String>, line: SourceLine) -> Self {
        Self::new(text, line, line.saturating_add(1))
    }

    pub fn untracked(text: impl Into<String>) -> Self {
        Self::new(text, 0, 0)
    }

    pub fn is_tracked(&self) -> bool {
        self.end_line > self.start_line
    }

    pub fn lines(&self) -> Range<SourceLine> {
        self.start_line..self.end_line
    }

    /// Number of display rows the detail occupies.
    pub fn row_height(&self) -> usize {
        self.text.lines().count().max(1)
    }
}
