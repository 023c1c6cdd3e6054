use crate::language::span::Span;
use miette::SourceSpan;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct SyntaxError {
    pub message: String,
    pub label: String,
    pub span: Span,
    pub help: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        let message = message.into();
        Self {
            label: message.clone(),
            message,
            span,
            help: None,
        }
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn to_source_span(&self) -> SourceSpan {
        (self.span.start, self.span.len()).into()
    }
}

/// Every error the parser collected for one source text.
#[derive(Clone, Debug, Error)]
#[error("{} syntax error(s), first: {}", .errors.len(), first_message(.errors))]
pub struct SyntaxErrors {
    pub errors: Vec<SyntaxError>,
}

impl SyntaxErrors {
    pub fn new(errors: Vec<SyntaxError>) -> Self {
        Self { errors }
    }
}

fn first_message(errors: &[SyntaxError]) -> &str {
    errors
        .first()
        .map(|err| err.message.as_str())
        .unwrap_or("<none>")
}
