use crate::{
    ir::{Instruction, Item, Label, Opcode, PseudoCode},
    language::{
        ast::UnaryOp,
        fold::{eval_constant_binary, eval_unary, Constant},
    },
};
use std::collections::HashSet;

const MAX_PASSES: usize = 16;

/// Runs the peephole passes until the stream stops changing.
pub fn optimize(code: &PseudoCode) -> PseudoCode {
    let mut items = code.items.clone();
    for pass in 0..MAX_PASSES {
        let before = items.clone();
        items = fold_constants(items);
        items = remove_nops(items);
        items = fold_constant_branches(items);
        items = remove_unreachable(items);
        items = remove_jumps_to_next(items);
        items = remove_unused_labels(items);
        if items == before {
            tracing::trace!(passes = pass + 1, "optimizer reached fixpoint");
            break;
        }
    }
    PseudoCode { items }
}

fn as_const(item: &Item) -> Option<Constant> {
    match item {
        Item::Instr(Instruction {
            op: Opcode::LoadConst(constant),
            ..
        }) => Some(*constant),
        _ => None,
    }
}

fn instr(item: &Item) -> Option<&Instruction> {
    match item {
        Item::Instr(instr) => Some(instr),
        Item::Label(_) => None,
    }
}

fn fold_constants(items: Vec<Item>) -> Vec<Item> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        let folded = instr(&item).and_then(|current| {
            let len = out.len();
            match &current.op {
                Opcode::BinaryOp(op) | Opcode::CompareOp(op) if len >= 2 => {
                    let lhs = as_const(&out[len - 2])?;
                    let rhs = as_const(&out[len - 1])?;
                    Some((2, eval_constant_binary(*op, lhs, rhs)?, current.line))
                }
                Opcode::UnaryNegative if len >= 1 => {
                    let value = eval_unary(UnaryOp::Neg, as_const(&out[len - 1])?)?;
                    Some((1, value, current.line))
                }
                Opcode::UnaryNot if len >= 1 => {
                    let value = eval_unary(UnaryOp::Not, as_const(&out[len - 1])?)?;
                    Some((1, value, current.line))
                }
                _ => None,
            }
        });
        match folded {
            Some((operands, constant, line)) => {
                out.truncate(out.len() - operands);
                out.push(Item::Instr(Instruction::new(
                    Opcode::LoadConst(constant),
                    line,
                )));
            }
            None => out.push(item),
        }
    }
    out
}

fn remove_nops(items: Vec<Item>) -> Vec<Item> {
    items
        .into_iter()
        .filter(|item| !matches!(instr(item), Some(Instruction { op: Opcode::Nop, .. })))
        .collect()
}

fn truthy(constant: Constant) -> bool {
    match constant {
        Constant::Integer(value) => value != 0,
        Constant::Bool(value) => value,
    }
}

fn fold_constant_branches(items: Vec<Item>) -> Vec<Item> {
    let mut out: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        let branch = match instr(&item) {
            Some(Instruction {
                op: Opcode::PopJumpIfFalse(label),
                line,
            }) => out
                .last()
                .and_then(as_const)
                .map(|constant| (truthy(constant), *label, *line)),
            _ => None,
        };
        match branch {
            Some((true, _, _)) => {
                out.pop();
            }
            Some((false, label, line)) => {
                out.pop();
                out.push(Item::Instr(Instruction::new(Opcode::Jump(label), line)));
            }
            None => out.push(item),
        }
    }
    out
}

fn remove_unreachable(items: Vec<Item>) -> Vec<Item> {
    let mut out = Vec::with_capacity(items.len());
    let mut reachable = true;
    for item in items {
        match &item {
            Item::Label(_) => {
                reachable = true;
                out.push(item);
            }
            Item::Instr(current) => {
                if reachable {
                    reachable = !current.op.is_terminator();
                    out.push(item);
                }
            }
        }
    }
    out
}

fn remove_jumps_to_next(items: Vec<Item>) -> Vec<Item> {
    let mut out = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        if let Some(Instruction {
            op: Opcode::Jump(target),
            ..
        }) = instr(item)
        {
            let falls_into_target = items[idx + 1..]
                .iter()
                .map_while(|next| match next {
                    Item::Label(label) => Some(*label),
                    Item::Instr(_) => None,
                })
                .any(|label| label == *target);
            if falls_into_target {
                continue;
            }
        }
        out.push(item.clone());
    }
    out
}

fn remove_unused_labels(items: Vec<Item>) -> Vec<Item> {
    let used: HashSet<Label> = items
        .iter()
        .filter_map(instr)
        .filter_map(|instr| instr.op.jump_target())
        .collect();
    items
        .into_iter()
        .filter(|item| match item {
            Item::Label(label) => used.contains(label),
            Item::Instr(_) => true,
        })
        .collect()
}
