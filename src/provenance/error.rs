use crate::language::errors::SyntaxErrors;
use miette::Diagnostic;
use std::error::Error as StdError;
use thiserror::Error;

/// A stage produced a detail whose end line precedes its start line.
#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
#[error("detail {index} has an inverted line range {start_line}..{end_line}")]
#[diagnostic(
    code(codoscope::provenance::invalid_range),
    help("a detail's end line must not precede its start line")
)]
pub struct InvalidRange {
    pub index: usize,
    pub start_line: u32,
    pub end_line: u32,
}

/// A stage could not process the current source text.
#[derive(Debug, Error, Diagnostic)]
#[error("stage `{stage}` failed")]
#[diagnostic(code(codoscope::stage::transform))]
pub struct StageTransformError {
    pub stage: String,
    #[source]
    pub cause: Box<dyn StdError + Send + Sync>,
}

impl StageTransformError {
    pub fn new(stage: impl Into<String>, cause: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self {
            stage: stage.into(),
            cause: cause.into(),
        }
    }

    pub fn syntax_errors(&self) -> Option<&SyntaxErrors> {
        self.cause.downcast_ref::<SyntaxErrors>()
    }

    /// One-line summary shown as the panel's error indicator.
    pub fn summary(&self) -> String {
        self.cause.to_string()
    }
}
