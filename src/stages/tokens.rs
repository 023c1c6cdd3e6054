use crate::{
    language::{lexer::tokenize, span::LineMap},
    provenance::Detail,
};

/// One detail per token. The line number is printed only when it changes,
/// multi-line tokens show their full line span.
pub fn details(source: &str, lines: &LineMap) -> Vec<Detail> {
    let mut current_line = 0;
    tokenize(source)
        .into_iter()
        .map(|token| {
            let start = lines.position(source, token.span.start);
            let end = lines.position(source, token.span.end);
            let end_line = lines.end_line_of(token.span);
            let marker = if end_line != start.line {
                format!("{:4}-{}: ", start.line, end_line)
            } else if start.line != current_line {
                format!("{:4}: ", start.line)
            } else {
                " ".repeat(6)
            };
            current_line = start.line;
            let text = source.get(token.span.start..token.span.end).unwrap_or("");
            Detail::new(
                format!(
                    "{marker}{:10} {:?} start={start} end={end}",
                    token.kind.name(),
                    text
                ),
                start.line,
                end_line + 1,
            )
        })
        .collect()
}
