use crate::{
    ir::{assemble::CodeObject, Item, PseudoCode},
    provenance::{Detail, SourceLine},
};

/// Tracks the source line of consecutive listing rows. Instructions without
/// a line of their own belong to the line before them.
#[derive(Default)]
struct LineTracker {
    current: Option<SourceLine>,
    shown: Option<SourceLine>,
}

impl LineTracker {
    fn advance(&mut self, line: Option<SourceLine>) -> Option<SourceLine> {
        if line.is_some() {
            self.current = line;
        }
        self.current
    }

    /// Line number column, filled only when the line changes.
    fn marker(&mut self, line: Option<SourceLine>) -> String {
        match line {
            Some(line) if self.shown != Some(line) => {
                self.shown = Some(line);
                format!("{line:>4}")
            }
            _ => " ".repeat(4),
        }
    }
}

fn row(text: String, line: Option<SourceLine>) -> Detail {
    match line {
        Some(line) => Detail::on_line(text, line),
        None => Detail::untracked(text),
    }
}

/// One row per label and instruction. A label sits on the line of the
/// instruction that follows it.
pub fn pseudo_details(code: &PseudoCode) -> Vec<Detail> {
    let mut tracker = LineTracker::default();
    let mut out = Vec::with_capacity(code.items.len());

    for (pos, item) in code.items.iter().enumerate() {
        match item {
            Item::Label(label) => {
                let next = code.items[pos + 1..].iter().find_map(|item| match item {
                    Item::Instr(instr) => Some(instr.line),
                    Item::Label(_) => None,
                });
                let line = next.flatten().or(tracker.current);
                let marker = tracker.marker(line);
                out.push(row(format!("{marker}  {label}:"), line));
            }
            Item::Instr(instr) => {
                let line = tracker.advance(instr.line);
                let marker = tracker.marker(line);
                let text = match instr.op.arg_repr() {
                    Some(arg) => format!("{marker}      {:<20} {arg}", instr.op.name()),
                    None => format!("{marker}      {}", instr.op.name()),
                };
                out.push(row(text, line));
            }
        }
    }
    out
}

/// Disassembly of the final code object. The header and the constant and
/// name tables do not come from any single line.
pub fn bytecode_details(object: &CodeObject) -> Vec<Detail> {
    let mut tracker = LineTracker::default();
    let mut out = Vec::with_capacity(object.instructions.len() + 3);
    out.push(Detail::untracked("<bytecode>"));

    for instr in &object.instructions {
        let line = tracker.advance(instr.line);
        let marker = tracker.marker(line);
        let target = if instr.is_jump_target { ">>" } else { "  " };
        let arg = instr
            .arg
            .map(|arg| format!(" {arg:>4} ({})", instr.argrepr))
            .unwrap_or_default();
        let text = format!("{marker} {target} {:>4} {:<20}{arg}", instr.offset, instr.opname);
        out.push(row(text.trim_end().to_string(), line));
    }

    let consts = object
        .consts
        .iter()
        .map(|constant| constant.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    out.push(Detail::untracked(format!("consts: ({consts})")));
    out.push(Detail::untracked(format!(
        "names: ({})",
        object.names.join(", ")
    )));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{assemble::assemble, Instruction, Label, Opcode},
        language::fold::Constant,
    };

    fn sample() -> PseudoCode {
        PseudoCode {
            items: vec![
                Item::Instr(Instruction::new(
                    Opcode::LoadConst(Constant::Integer(1)),
                    Some(1),
                )),
                Item::Instr(Instruction::new(Opcode::StoreName("x".into()), Some(1))),
                Item::Label(Label(0)),
                Item::Instr(Instruction::new(Opcode::LoadName("x".into()), Some(2))),
                Item::Instr(Instruction::new(Opcode::PopJumpIfFalse(Label(1)), Some(2))),
                Item::Instr(Instruction::new(Opcode::Jump(Label(0)), Some(3))),
                Item::Label(Label(1)),
                Item::Instr(Instruction::new(Opcode::ReturnNone, None)),
            ],
        }
    }

    #[test]
    fn pseudo_rows_follow_instruction_lines() {
        let rows = pseudo_details(&sample());
        let lines: Vec<_> = rows.iter().map(|row| row.start_line).collect();
        assert_eq!(lines, vec![1, 1, 2, 2, 2, 3, 3, 3]);
        assert!(rows.iter().all(Detail::is_tracked));
        assert_eq!(rows[0].text, "   1      LOAD_CONST           1");
        assert_eq!(rows[1].text, "          STORE_NAME           x");
        assert_eq!(rows[2].text, "   2  L0:");
        assert_eq!(rows[3].text, "          LOAD_NAME            x");
        assert_eq!(rows[7].text, "          RETURN_NONE");
    }

    #[test]
    fn leading_rows_without_line_are_untracked() {
        let code = PseudoCode {
            items: vec![Item::Instr(Instruction::new(Opcode::ReturnNone, None))],
        };
        let rows = pseudo_details(&code);
        assert_eq!(rows, vec![Detail::untracked("          RETURN_NONE")]);
    }

    #[test]
    fn bytecode_marks_jump_targets_and_tables() {
        let object = assemble(&sample()).expect("assemble");
        let rows = bytecode_details(&object);
        assert_eq!(rows.first(), Some(&Detail::untracked("<bytecode>")));
        assert_eq!(
            rows[3].text,
            "   2 >>    4 LOAD_NAME               0 (x)"
        );
        assert_eq!(rows[3].lines(), 2..3);
        assert_eq!(rows[6].text, "     >>   10 RETURN_NONE");
        assert_eq!(rows[6].lines(), 3..4);
        let footer = &rows[rows.len() - 2..];
        assert_eq!(footer[0], Detail::untracked("consts: (1)"));
        assert_eq!(footer[1], Detail::untracked("names: (x)"));
    }
}
