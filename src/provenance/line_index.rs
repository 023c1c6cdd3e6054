use crate::provenance::{
    detail::{Detail, SourceLine},
    error::InvalidRange,
};
use std::{
    collections::{BTreeSet, HashMap},
    ops::Range,
};

static NO_DETAILS: BTreeSet<usize> = BTreeSet::new();

/// Inverted index over one stage's output: source line to the details
/// derived from it, and detail to the display rows it occupies.
///
/// An index is never patched. Each render builds a fresh one from the full
/// detail sequence, so entries from an older source snapshot cannot survive.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    details: Vec<Detail>,
    positions: Vec<usize>,
    row_count: usize,
    line_to_details: HashMap<SourceLine, BTreeSet<usize>>,
}

impl LineIndex {
    pub fn build(details: Vec<Detail>) -> Result<Self, InvalidRange> {
        let mut positions = Vec::with_capacity(details.len());
        let mut line_to_details: HashMap<SourceLine, BTreeSet<usize>> = HashMap::new();
        let mut row = 0usize;

        for (idx, detail) in details.iter().enumerate() {
            if detail.end_line < detail.start_line {
                return Err(InvalidRange {
                    index: idx,
                    start_line: detail.start_line,
                    end_line: detail.end_line,
                });
            }
            for line in detail.lines() {
                line_to_details.entry(line).or_default().insert(idx);
            }
            positions.push(row);
            row += detail.row_height();
        }

        tracing::debug!(
            details = details.len(),
            rows = row,
            lines = line_to_details.len(),
            "line index rebuilt"
        );

        Ok(Self {
            details,
            positions,
            row_count: row,
            line_to_details,
        })
    }

    pub fn details(&self) -> &[Detail] {
        &self.details
    }

    pub fn detail(&self, index: usize) -> Option<&Detail> {
        self.details.get(index)
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Indices of every detail whose line range contains `line`.
    pub fn details_on_line(&self, line: SourceLine) -> &BTreeSet<usize> {
        self.line_to_details.get(&line).unwrap_or(&NO_DETAILS)
    }

    /// First display row of the detail at `index`.
    pub fn display_row_of_detail(&self, index: usize) -> Option<usize> {
        self.positions.get(index).copied()
    }

    pub fn rows_of_detail(&self, index: usize) -> Option<Range<usize>> {
        let start = self.display_row_of_detail(index)?;
        let end = self
            .positions
            .get(index + 1)
            .copied()
            .unwrap_or(self.row_count);
        Some(start..end)
    }

    /// Detail rendered at display `row`, if the row holds any content.
    pub fn detail_at_row(&self, row: usize) -> Option<usize> {
        if row >= self.row_count {
            return None;
        }
        let after = self.positions.partition_point(|start| *start <= row);
        after.checked_sub(1)
    }

    /// Source lines that have at least one associated detail.
    pub fn indexed_lines(&self) -> BTreeSet<SourceLine> {
        self.line_to_details.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_details_on_line(details: &[Detail], line: SourceLine) -> BTreeSet<usize> {
        details
            .iter()
            .enumerate()
            .filter(|(_, detail)| detail.start_line <= line && line < detail.end_line)
            .map(|(idx, _)| idx)
            .collect()
    }

    #[test]
    fn records_every_line_of_a_range() {
        let index = LineIndex::build(vec![Detail::new("x", 5, 7)]).expect("index");
        assert_eq!(index.details_on_line(5), &BTreeSet::from([0]));
        assert_eq!(index.details_on_line(6), &BTreeSet::from([0]));
        assert!(index.details_on_line(7).is_empty());
        assert!(index.details_on_line(4).is_empty());
    }

    #[test]
    fn records_overlapping_ranges() {
        let index =
            LineIndex::build(vec![Detail::new("a", 3, 4), Detail::new("b", 3, 5)]).expect("index");
        assert_eq!(index.details_on_line(3), &BTreeSet::from([0, 1]));
        assert_eq!(index.details_on_line(4), &BTreeSet::from([1]));
    }

    #[test]
    fn untracked_details_are_not_indexed() {
        let index = LineIndex::build(vec![Detail::untracked("<title>"), Detail::on_line("x", 1)])
            .expect("index");
        assert_eq!(index.indexed_lines(), BTreeSet::from([1]));
        assert_eq!(index.display_row_of_detail(1), Some(1));
        assert!(index.details_on_line(0).is_empty());
    }

    #[test]
    fn rejects_inverted_range() {
        let err = LineIndex::build(vec![Detail::on_line("ok", 1), Detail::new("bad", 4, 2)])
            .expect_err("invalid");
        assert_eq!(
            err,
            InvalidRange {
                index: 1,
                start_line: 4,
                end_line: 2
            }
        );
    }

    #[test]
    fn multi_row_details_shift_positions() {
        let index = LineIndex::build(vec![
            Detail::on_line("one", 1),
            Detail::on_line("two\nrows", 2),
            Detail::on_line("three", 3),
        ])
        .expect("index");
        assert_eq!(index.row_count(), 4);
        assert_eq!(index.display_row_of_detail(2), Some(3));
        assert_eq!(index.rows_of_detail(1), Some(1..3));
        assert_eq!(index.detail_at_row(0), Some(0));
        assert_eq!(index.detail_at_row(1), Some(1));
        assert_eq!(index.detail_at_row(2), Some(1));
        assert_eq!(index.detail_at_row(3), Some(2));
        assert_eq!(index.detail_at_row(4), None);
    }

    #[test]
    fn empty_index_answers_every_query() {
        let index = LineIndex::default();
        assert!(index.is_empty());
        assert!(index.details_on_line(1).is_empty());
        assert_eq!(index.detail_at_row(0), None);
        assert_eq!(index.display_row_of_detail(0), None);
    }

    fn arb_details() -> impl Strategy<Value = Vec<Detail>> {
        prop::collection::vec((0u32..40, 0u32..6), 0..40).prop_map(|ranges| {
            ranges
                .into_iter()
                .enumerate()
                .map(|(idx, (start, span))| Detail::new(format!("d{idx}"), start, start + span))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn matches_naive_scan(details in arb_details()) {
            let index = LineIndex::build(details.clone()).expect("valid ranges");
            for line in 0..50 {
                prop_assert_eq!(
                    index.details_on_line(line),
                    &naive_details_on_line(&details, line)
                );
            }
        }

        #[test]
        fn rebuild_leaves_no_residue(first in arb_details(), second in arb_details()) {
            let _stale = LineIndex::build(first).expect("valid ranges");
            let index = LineIndex::build(second.clone()).expect("valid ranges");
            for line in index.indexed_lines() {
                for idx in index.details_on_line(line) {
                    prop_assert!(*idx < second.len());
                    prop_assert!(second[*idx].lines().contains(&line));
                }
            }
        }

        #[test]
        fn rows_round_trip_to_details(details in arb_details()) {
            let index = LineIndex::build(details.clone()).expect("valid ranges");
            for idx in 0..details.len() {
                let row = index.display_row_of_detail(idx).expect("row");
                prop_assert_eq!(index.detail_at_row(row), Some(idx));
            }
        }
    }
}
