//! The stages shipped with the inspector. Each one turns the source text
//! into an ordered detail sequence for its panel.

pub mod listing;
pub mod source;
pub mod tokens;
pub mod tree;

use crate::{
    ir::{assemble::assemble, codegen::generate, optimize::optimize, PseudoCode},
    language::{fold::fold_program, parser::parse_source, span::LineMap},
    provenance::{Detail, Stage, StageTransformError},
};
use std::{fmt, str::FromStr};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Source,
    Tokens,
    Ast,
    OptimizedAst,
    PseudoIr,
    OptimizedIr,
    Bytecode,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        StageKind::Source,
        StageKind::Tokens,
        StageKind::Ast,
        StageKind::OptimizedAst,
        StageKind::PseudoIr,
        StageKind::OptimizedIr,
        StageKind::Bytecode,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Source => "source",
            StageKind::Tokens => "tokens",
            StageKind::Ast => "ast",
            StageKind::OptimizedAst => "ast-opt",
            StageKind::PseudoIr => "pseudo-ir",
            StageKind::OptimizedIr => "ir-opt",
            StageKind::Bytecode => "bytecode",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StageKind::Source => "Source",
            StageKind::Tokens => "Tokens",
            StageKind::Ast => "AST",
            StageKind::OptimizedAst => "AST (folded)",
            StageKind::PseudoIr => "Pseudo IR",
            StageKind::OptimizedIr => "Optimized IR",
            StageKind::Bytecode => "Bytecode",
        }
    }

    fn pseudo_code(&self, source: &str) -> Result<PseudoCode, StageTransformError> {
        let program = parse_source(source).map_err(|err| StageTransformError::new(self.name(), err))?;
        Ok(generate(&program, &LineMap::new(source)))
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown stage `{0}`")]
pub struct UnknownStage(pub String);

impl FromStr for StageKind {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| UnknownStage(s.trim().to_string()))
    }
}

impl Stage for StageKind {
    fn name(&self) -> &str {
        StageKind::name(self)
    }

    fn transform(&self, source: &str) -> Result<Vec<Detail>, StageTransformError> {
        let lines = LineMap::new(source);
        match self {
            StageKind::Source => Ok(source::details(source)),
            StageKind::Tokens => Ok(tokens::details(source, &lines)),
            StageKind::Ast | StageKind::OptimizedAst => {
                let program =
                    parse_source(source).map_err(|err| StageTransformError::new(self.name(), err))?;
                let program = if *self == StageKind::OptimizedAst {
                    fold_program(&program)
                } else {
                    program
                };
                Ok(tree::details(&program, &lines))
            }
            StageKind::PseudoIr => Ok(listing::pseudo_details(&self.pseudo_code(source)?)),
            StageKind::OptimizedIr => Ok(listing::pseudo_details(&optimize(
                &self.pseudo_code(source)?,
            ))),
            StageKind::Bytecode => {
                let code = optimize(&self.pseudo_code(source)?);
                let object =
                    assemble(&code).map_err(|err| StageTransformError::new(self.name(), err))?;
                Ok(listing::bytecode_details(&object))
            }
        }
    }
}
