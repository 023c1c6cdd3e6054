//! Stack-machine intermediate representation produced from the tree, its
//! peephole optimizer and the assembler that resolves labels into offsets.

pub mod assemble;
pub mod codegen;
pub mod optimize;

use crate::language::{ast::BinaryOp, fold::Constant};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(pub u32);

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Opcode {
    LoadConst(Constant),
    LoadName(String),
    StoreName(String),
    BinaryOp(BinaryOp),
    CompareOp(BinaryOp),
    UnaryNegative,
    UnaryNot,
    Print,
    Jump(Label),
    PopJumpIfFalse(Label),
    Nop,
    ReturnNone,
}

impl Opcode {
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::LoadConst(_) => "LOAD_CONST",
            Opcode::LoadName(_) => "LOAD_NAME",
            Opcode::StoreName(_) => "STORE_NAME",
            Opcode::BinaryOp(_) => "BINARY_OP",
            Opcode::CompareOp(_) => "COMPARE_OP",
            Opcode::UnaryNegative => "UNARY_NEGATIVE",
            Opcode::UnaryNot => "UNARY_NOT",
            Opcode::Print => "PRINT",
            Opcode::Jump(_) => "JUMP",
            Opcode::PopJumpIfFalse(_) => "POP_JUMP_IF_FALSE",
            Opcode::Nop => "NOP",
            Opcode::ReturnNone => "RETURN_NONE",
        }
    }

    pub fn jump_target(&self) -> Option<Label> {
        match self {
            Opcode::Jump(label) | Opcode::PopJumpIfFalse(label) => Some(*label),
            _ => None,
        }
    }

    /// Control never falls through to the next instruction.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::Jump(_) | Opcode::ReturnNone)
    }

    /// Human readable argument, as shown in the pseudo listing.
    pub fn arg_repr(&self) -> Option<String> {
        match self {
            Opcode::LoadConst(constant) => Some(constant.to_string()),
            Opcode::LoadName(name) | Opcode::StoreName(name) => Some(name.clone()),
            Opcode::BinaryOp(op) | Opcode::CompareOp(op) => Some(op.symbol().to_string()),
            Opcode::Jump(label) | Opcode::PopJumpIfFalse(label) => Some(format!("to {label}")),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
    pub op: Opcode,
    /// Source line the instruction was generated from, if any.
    pub line: Option<u32>,
}

impl Instruction {
    pub fn new(op: Opcode, line: Option<u32>) -> Self {
        Self { op, line }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Label(Label),
    Instr(Instruction),
}

/// Linear pseudo instruction stream with symbolic jump targets.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PseudoCode {
    pub items: Vec<Item>,
}

impl PseudoCode {
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            Item::Instr(instr) => Some(instr),
            Item::Label(_) => None,
        })
    }

    pub fn opnames(&self) -> Vec<&'static str> {
        self.instructions().map(|instr| instr.op.name()).collect()
    }
}
