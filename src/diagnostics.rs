use crate::{
    config::ConfigError,
    language::errors::SyntaxError,
    provenance::{PipelineReport, StageOutcome, StageTransformError},
};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(codoscope::language::syntax))]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(name: &str, source: &str, err: &SyntaxError) -> Self {
        Self {
            src: NamedSource::new(name, source.to_string()),
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
            label: err.label.clone(),
        }
    }
}

/// Renders a stage failure. Syntax errors are shown against the source text,
/// one report per error; anything else as a single report.
pub fn render_stage_failure(name: &str, source: &str, err: &StageTransformError) -> Vec<String> {
    match err.syntax_errors() {
        Some(errors) => errors
            .errors
            .iter()
            .map(|syntax| {
                let diagnostic = SyntaxDiagnostic::from_error(name, source, syntax);
                format!("[{}] {:?}", err.stage, Report::new(diagnostic))
            })
            .collect(),
        None => vec![format!("{:?}", Report::msg(format!("{err}: {}", err.summary())))],
    }
}

/// Prints every failed or rejected stage of `report` to stderr. Syntax
/// errors shared by several stages are printed once. Returns whether
/// anything was printed.
pub fn emit_pipeline_failures(name: &str, source: &str, report: &PipelineReport) -> bool {
    let mut emitted = false;
    let mut syntax_shown = false;
    for (stage, outcome) in &report.outcomes {
        match outcome {
            StageOutcome::Failed(err) if err.syntax_errors().is_some() => {
                if syntax_shown {
                    continue;
                }
                syntax_shown = true;
                for rendered in render_stage_failure(name, source, err) {
                    eprintln!("{rendered}");
                }
                emitted = true;
            }
            StageOutcome::Failed(err) => {
                for rendered in render_stage_failure(name, source, err) {
                    eprintln!("{rendered}");
                }
                emitted = true;
            }
            StageOutcome::Rejected(err) => {
                eprintln!("[{stage}] {:?}", Report::new(err.clone()));
                emitted = true;
            }
            _ => {}
        }
    }
    emitted
}

pub fn report_config_error(error: ConfigError) {
    eprintln!("{:?}", Report::new(error));
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{provenance::Stage, stages::StageKind};

    #[test]
    fn syntax_failures_render_one_report_per_error() {
        let source = "let = 1;\nout(2)\n";
        let err = StageKind::Ast.transform(source).expect_err("syntax error");
        let rendered = render_stage_failure("sample.cds", source, &err);
        assert_eq!(rendered.len(), 2);
        assert!(rendered[0].starts_with("[ast]"));
        assert!(rendered[0].contains("Expected identifier"));
        assert!(rendered[1].contains("Try: out(2);"));
    }

    #[test]
    fn other_failures_render_their_cause() {
        let err = StageTransformError::new("bytecode", "jump to undefined label L3");
        let rendered = render_stage_failure("sample.cds", "", &err);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("jump to undefined label L3"));
    }
}
