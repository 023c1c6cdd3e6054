use std::ops::Range;

/// Byte range into the source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn join(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// Line/column position: 1-based line, 0-based column counted in chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}

/// Offsets of every line start, used to turn byte offsets into source lines.
#[derive(Clone, Debug)]
pub struct LineMap {
    starts: Vec<usize>,
    text_len: usize,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, byte)| *byte == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self {
            starts,
            text_len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    pub fn line_of(&self, offset: usize) -> u32 {
        let offset = offset.min(self.text_len);
        let idx = self.starts.partition_point(|start| *start <= offset);
        u32::try_from(idx).unwrap_or(u32::MAX)
    }

    /// Line holding the last byte of `span`. Empty spans report their start line.
    pub fn end_line_of(&self, span: Span) -> u32 {
        if span.is_empty() {
            self.line_of(span.start)
        } else {
            self.line_of(span.end - 1)
        }
    }

    pub fn position(&self, text: &str, offset: usize) -> Position {
        let line = self.line_of(offset);
        let line_start = self.starts[(line as usize).saturating_sub(1)];
        let offset = offset.min(text.len());
        let column = text
            .get(line_start..offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or(0);
        Position {
            line,
            column: u32::try_from(column).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_offsets_to_one_based_lines() {
        let text = "a\nbc\n\nd";
        let map = LineMap::new(text);
        assert_eq!(map.line_count(), 4);
        assert_eq!(map.line_of(0), 1);
        assert_eq!(map.line_of(1), 1);
        assert_eq!(map.line_of(2), 2);
        assert_eq!(map.line_of(5), 3);
        assert_eq!(map.line_of(6), 4);
        assert_eq!(map.line_of(100), 4);
    }

    #[test]
    fn end_line_uses_last_byte() {
        let text = "ab\ncd\n";
        let map = LineMap::new(text);
        assert_eq!(map.end_line_of(Span::new(0, 3)), 1);
        assert_eq!(map.end_line_of(Span::new(0, 4)), 2);
        assert_eq!(map.end_line_of(Span::new(3, 3)), 2);
    }

    #[test]
    fn positions_count_chars_not_bytes() {
        let text = "é = 1\nx";
        let map = LineMap::new(text);
        assert_eq!(map.position(text, 2), Position { line: 1, column: 1 });
        assert_eq!(map.position(text, 7), Position { line: 2, column: 0 });
    }
}
