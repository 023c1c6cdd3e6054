use crate::{
    ir::{Item, Label, Opcode, PseudoCode},
    language::fold::Constant,
};
use std::collections::HashMap;
use thiserror::Error;

/// Every assembled instruction is two bytes: opcode and argument.
pub const INSTRUCTION_SIZE: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("jump to undefined label {0}")]
    UndefinedLabel(Label),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssembledInstruction {
    pub offset: usize,
    pub opname: &'static str,
    pub arg: Option<u32>,
    pub argrepr: String,
    pub line: Option<u32>,
    pub is_jump_target: bool,
}

/// Final form of a program: flat instructions plus constant and name tables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeObject {
    pub instructions: Vec<AssembledInstruction>,
    pub consts: Vec<Constant>,
    pub names: Vec<String>,
}

pub fn assemble(code: &PseudoCode) -> Result<CodeObject, AssembleError> {
    let mut offsets: HashMap<Label, usize> = HashMap::new();
    let mut offset = 0usize;
    for item in &code.items {
        match item {
            Item::Label(label) => {
                offsets.insert(*label, offset);
            }
            Item::Instr(_) => offset += INSTRUCTION_SIZE,
        }
    }

    let mut object = CodeObject::default();
    let targets: Vec<usize> = offsets.values().copied().collect();
    for instr in code.instructions() {
        let offset = object.instructions.len() * INSTRUCTION_SIZE;
        let (arg, argrepr) = match &instr.op {
            Opcode::LoadConst(constant) => {
                let idx = intern(&mut object.consts, *constant);
                (Some(idx), constant.to_string())
            }
            Opcode::LoadName(name) | Opcode::StoreName(name) => {
                let idx = intern(&mut object.names, name.clone());
                (Some(idx), name.clone())
            }
            Opcode::BinaryOp(op) | Opcode::CompareOp(op) => {
                (Some(*op as u32), op.symbol().to_string())
            }
            Opcode::Jump(label) | Opcode::PopJumpIfFalse(label) => {
                let target = offsets
                    .get(label)
                    .copied()
                    .ok_or(AssembleError::UndefinedLabel(*label))?;
                (
                    Some(u32::try_from(target).unwrap_or(u32::MAX)),
                    format!("to {target}"),
                )
            }
            Opcode::UnaryNegative
            | Opcode::UnaryNot
            | Opcode::Print
            | Opcode::Nop
            | Opcode::ReturnNone => (None, String::new()),
        };
        object.instructions.push(AssembledInstruction {
            offset,
            opname: instr.op.name(),
            arg,
            argrepr,
            line: instr.line,
            is_jump_target: targets.contains(&offset),
        });
    }
    Ok(object)
}

fn intern<T: PartialEq>(table: &mut Vec<T>, value: T) -> u32 {
    let idx = match table.iter().position(|existing| *existing == value) {
        Some(idx) => idx,
        None => {
            table.push(value);
            table.len() - 1
        }
    };
    u32::try_from(idx).unwrap_or(u32::MAX)
}
