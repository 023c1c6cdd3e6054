use crate::provenance::{
    detail::{Detail, SourceLine},
    error::InvalidRange,
    line_index::LineIndex,
};
use std::{cell::RefCell, collections::BTreeSet, fmt, ops::Range, rc::Rc};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(pub usize);

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel#{}", self.0)
    }
}

pub type SharedPanel = Rc<RefCell<StagePanel>>;

/// Window of display rows currently visible in a panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub top: usize,
    pub height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            top: 0,
            height: height.max(1),
        }
    }

    pub fn rows(&self) -> Range<usize> {
        self.top..self.top + self.height
    }

    /// Moves the window as little as possible so that `span` is visible.
    /// A span taller than the window is aligned to its first row.
    pub fn scroll_into_view(&mut self, span: Range<usize>) {
        let span_height = span.end.saturating_sub(span.start);
        if span_height > self.height || span.start < self.top {
            self.top = span.start;
        } else if span.end > self.top + self.height {
            self.top = span.end - self.height;
        }
    }

    fn clamp_to(&mut self, row_count: usize) {
        self.top = self.top.min(row_count.saturating_sub(self.height));
    }
}

/// On-screen presentation of one stage: its current detail sequence, the
/// index derived from it, and the highlight applied by the last hover.
#[derive(Debug)]
pub struct StagePanel {
    id: PanelId,
    title: String,
    index: LineIndex,
    highlighted: BTreeSet<usize>,
    viewport: Viewport,
    error: Option<String>,
}

impl StagePanel {
    pub fn new(id: PanelId, title: impl Into<String>, height: usize) -> Self {
        Self {
            id,
            title: title.into(),
            index: LineIndex::default(),
            highlighted: BTreeSet::new(),
            viewport: Viewport::new(height),
            error: None,
        }
    }

    pub fn shared(id: PanelId, title: impl Into<String>, height: usize) -> SharedPanel {
        Rc::new(RefCell::new(Self::new(id, title, height)))
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn index(&self) -> &LineIndex {
        &self.index
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces the content and its index in one step and drops the current
    /// highlight. On an invalid range the previous content stays untouched.
    pub fn render(&mut self, details: Vec<Detail>) -> Result<(), InvalidRange> {
        let index = LineIndex::build(details)?;
        self.index = index;
        self.highlighted.clear();
        self.error = None;
        self.viewport.clamp_to(self.index.row_count());
        Ok(())
    }

    /// Flags the panel as failed while it keeps showing its previous content.
    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Source line that produced the content at `row`. Rows past the content
    /// and rows of details with no line association resolve to nothing.
    pub fn resolve_hover_to_source_line(&self, row: usize) -> Option<SourceLine> {
        let idx = self.index.detail_at_row(row)?;
        let detail = self.index.detail(idx)?;
        detail.is_tracked().then_some(detail.start_line)
    }

    /// Highlights every detail derived from `line` and scrolls them into
    /// view. Returns the highlighted row span, or `None` when nothing on this
    /// panel comes from `line` (the old highlight is still cleared).
    pub fn apply_highlight(&mut self, line: SourceLine) -> Option<Range<usize>> {
        let matches = self.index.details_on_line(line);
        self.highlighted = matches.clone();

        let first = *matches.first()?;
        let last = *matches.last()?;
        let start = self.index.rows_of_detail(first)?.start;
        let end = self.index.rows_of_detail(last)?.end;
        self.viewport.scroll_into_view(start..end);
        Some(start..end)
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted.clear();
    }

    pub fn highlighted_details(&self) -> &BTreeSet<usize> {
        &self.highlighted
    }

    pub fn highlighted_rows(&self) -> BTreeSet<usize> {
        self.highlighted
            .iter()
            .filter_map(|idx| self.index.rows_of_detail(*idx))
            .flatten()
            .collect()
    }

    pub fn is_row_highlighted(&self, row: usize) -> bool {
        self.index
            .detail_at_row(row)
            .is_some_and(|idx| self.highlighted.contains(&idx))
    }
}

#[cfg(test)]
mod tests;
