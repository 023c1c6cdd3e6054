use crate::provenance::StagePanel;
use std::fmt::Write;

/// Plain-text rendering of the visible part of a panel.
pub fn render_panel(panel: &StagePanel) -> String {
    let mut out = format!("== {} ==", panel.title());
    if let Some(error) = panel.error() {
        let _ = write!(out, " [error: {error}]");
    }
    out.push('\n');

    let index = panel.index();
    if index.is_empty() {
        out.push_str("<no output>\n");
        return out;
    }

    let visible = panel.viewport().rows();
    let mut row = 0usize;
    for (idx, detail) in index.details().iter().enumerate() {
        let highlighted = panel.highlighted_details().contains(&idx);
        for text in display_rows(&detail.text) {
            if visible.contains(&row) {
                let marker = if highlighted { '>' } else { ' ' };
                let _ = writeln!(out, "{marker}{text}");
            }
            row += 1;
        }
        if row >= visible.end {
            break;
        }
    }
    out
}

fn display_rows(text: &str) -> Vec<&str> {
    let rows: Vec<&str> = text.lines().collect();
    if rows.is_empty() {
        vec![""]
    } else {
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provenance::{Detail, PanelId};

    #[test]
    fn never_rendered_panel_has_placeholder() {
        let panel = StagePanel::new(PanelId(0), "Tokens", 4);
        assert_eq!(render_panel(&panel), "== Tokens ==\n<no output>\n");
    }

    #[test]
    fn marks_highlighted_rows_inside_viewport() {
        let mut panel = StagePanel::new(PanelId(0), "Source", 2);
        panel
            .render(vec![
                Detail::on_line("a", 1),
                Detail::on_line("b", 2),
                Detail::on_line("c", 3),
            ])
            .expect("render");
        panel.apply_highlight(3);
        assert_eq!(render_panel(&panel), "== Source ==\n b\n>c\n");
    }

    #[test]
    fn failed_panel_keeps_content_and_shows_error() {
        let mut panel = StagePanel::new(PanelId(0), "AST", 5);
        panel
            .render(vec![Detail::untracked("Module()"), Detail::new("x\ny", 1, 2)])
            .expect("render");
        panel.mark_failed("1 syntax error(s)");
        assert_eq!(
            render_panel(&panel),
            "== AST == [error: 1 syntax error(s)]\n Module()\n x\n y\n"
        );
    }
}
