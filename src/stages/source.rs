use crate::provenance::Detail;

/// Numbered source lines, one detail per line.
pub fn details(source: &str) -> Vec<Detail> {
    let width = source.lines().count().to_string().len().max(3);
    source
        .lines()
        .zip(1u32..)
        .map(|(text, line)| Detail::on_line(format!("{line:>width$} | {text}"), line))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_every_line() {
        let details = details("let x = 1;\n\nout(x);\n");
        assert_eq!(
            details,
            vec![
                Detail::on_line("  1 | let x = 1;", 1),
                Detail::on_line("  2 | ", 2),
                Detail::on_line("  3 | out(x);", 3),
            ]
        );
    }

    #[test]
    fn empty_source_has_no_rows() {
        assert!(details("").is_empty());
    }
}
