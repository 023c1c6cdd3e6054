//! The small imperative language shown in the inspector: lexer, parser,
//! tree and constant folder.

pub mod ast;
pub mod errors;
pub mod fold;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
