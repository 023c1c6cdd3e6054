use super::*;

fn panel_with(details: Vec<Detail>, height: usize) -> StagePanel {
    let mut panel = StagePanel::new(PanelId(0), "test", height);
    panel.render(details).expect("render");
    panel
}

fn numbered(count: u32) -> Vec<Detail> {
    (1..=count)
        .map(|line| Detail::on_line(format!("row {line}"), line))
        .collect()
}

#[test]
fn hover_resolves_to_range_start() {
    let mut panel = panel_with(vec![Detail::new("x", 5, 7)], 10);
    assert_eq!(panel.resolve_hover_to_source_line(0), Some(5));

    assert_eq!(panel.apply_highlight(5), Some(0..1));
    assert_eq!(panel.highlighted_details(), &BTreeSet::from([0]));
    assert_eq!(panel.apply_highlight(6), Some(0..1));
    assert_eq!(panel.highlighted_details(), &BTreeSet::from([0]));
    assert_eq!(panel.apply_highlight(7), None);
    assert!(panel.highlighted_details().is_empty());
}

#[test]
fn highlights_all_matches_and_targets_their_span() {
    let mut details = vec![Detail::new("a", 3, 4)];
    details.extend((0..20).map(|n| Detail::on_line(format!("filler {n}"), 40)));
    details.push(Detail::new("b", 3, 5));
    let mut panel = panel_with(details, 5);

    let span = panel.apply_highlight(3).expect("matches");
    assert_eq!(span, 0..22);
    assert_eq!(panel.highlighted_rows(), BTreeSet::from([0, 21]));
    assert!(panel.is_row_highlighted(21));
    assert!(!panel.is_row_highlighted(1));
}

#[test]
fn adjacent_matches_share_one_scroll_target() {
    let mut panel = panel_with(vec![Detail::new("a", 3, 4), Detail::new("b", 3, 5)], 10);
    assert_eq!(panel.apply_highlight(3), Some(0..2));
    assert_eq!(panel.highlighted_rows(), BTreeSet::from([0, 1]));
}

#[test]
fn highlight_is_idempotent() {
    let mut panel = panel_with(numbered(30), 5);
    panel.apply_highlight(20);
    let rows = panel.highlighted_rows();
    let viewport = panel.viewport();
    panel.apply_highlight(20);
    assert_eq!(panel.highlighted_rows(), rows);
    assert_eq!(panel.viewport(), viewport);
}

#[test]
fn render_drops_stale_highlight() {
    let mut panel = panel_with(numbered(10), 5);
    panel.apply_highlight(8);
    assert_eq!(panel.highlighted_details(), &BTreeSet::from([7]));

    panel
        .render(vec![Detail::on_line("only", 1)])
        .expect("render");
    assert!(panel.highlighted_details().is_empty());
    assert!(panel.highlighted_rows().is_empty());
    assert!(!panel.is_row_highlighted(0));
    assert!(panel.index().details_on_line(8).is_empty());
}

#[test]
fn invalid_render_keeps_previous_content() {
    let mut panel = panel_with(numbered(3), 5);
    panel.apply_highlight(2);
    let err = panel
        .render(vec![Detail::new("bad", 9, 3)])
        .expect_err("invalid");
    assert_eq!(err.index, 0);
    assert_eq!(panel.index().len(), 3);
    assert_eq!(panel.highlighted_details(), &BTreeSet::from([1]));
}

#[test]
fn miss_clears_without_scrolling() {
    let mut panel = panel_with(numbered(30), 5);
    panel.apply_highlight(25);
    let viewport = panel.viewport();
    assert_eq!(panel.apply_highlight(99), None);
    assert!(panel.highlighted_details().is_empty());
    assert_eq!(panel.viewport(), viewport);
}

#[test]
fn scrolls_minimally() {
    let mut panel = panel_with(numbered(30), 5);
    panel.apply_highlight(3);
    assert_eq!(panel.viewport().top, 0);

    panel.apply_highlight(8);
    assert_eq!(panel.viewport().top, 3);

    panel.apply_highlight(6);
    assert_eq!(panel.viewport().top, 3);

    panel.apply_highlight(2);
    assert_eq!(panel.viewport().top, 1);
}

#[test]
fn untracked_and_out_of_bounds_rows_resolve_to_nothing() {
    let panel = panel_with(
        vec![Detail::untracked("<title>"), Detail::on_line("x", 4)],
        5,
    );
    assert_eq!(panel.resolve_hover_to_source_line(0), None);
    assert_eq!(panel.resolve_hover_to_source_line(1), Some(4));
    assert_eq!(panel.resolve_hover_to_source_line(2), None);
}

#[test]
fn highlight_on_empty_panel_is_a_no_op() {
    let mut panel = StagePanel::new(PanelId(3), "empty", 5);
    assert_eq!(panel.apply_highlight(1), None);
    assert!(panel.highlighted_rows().is_empty());
}

#[test]
fn render_clamps_viewport_and_clears_error() {
    let mut panel = panel_with(numbered(30), 5);
    panel.apply_highlight(30);
    assert_eq!(panel.viewport().top, 25);
    panel.mark_failed("boom");
    assert_eq!(panel.error(), Some("boom"));

    panel.render(numbered(3)).expect("render");
    assert_eq!(panel.viewport().top, 0);
    assert_eq!(panel.error(), None);
}

#[test]
fn tall_span_aligns_to_its_start() {
    let mut viewport = Viewport::new(3);
    viewport.top = 10;
    viewport.scroll_into_view(4..12);
    assert_eq!(viewport.top, 4);
    viewport.scroll_into_view(5..7);
    assert_eq!(viewport.top, 4);
    assert_eq!(viewport.rows(), 4..7);
}
