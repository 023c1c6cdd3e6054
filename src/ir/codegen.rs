use crate::{
    ir::{Instruction, Item, Label, Opcode, PseudoCode},
    language::{
        ast::{Block, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp},
        fold::Constant,
        span::{LineMap, Span},
    },
};

/// Lowers a parsed program into pseudo instructions. Every instruction
/// records the source line of the node it was emitted for.
pub fn generate(program: &Program, lines: &LineMap) -> PseudoCode {
    let mut codegen = CodeGen {
        lines,
        items: Vec::new(),
        next_label: 1,
    };
    for stmt in &program.statements {
        codegen.emit_stmt(stmt);
    }
    codegen.emit(Opcode::ReturnNone, None);
    PseudoCode {
        items: codegen.items,
    }
}

struct CodeGen<'a> {
    lines: &'a LineMap,
    items: Vec<Item>,
    next_label: u32,
}

impl<'a> CodeGen<'a> {
    fn line(&self, span: Span) -> Option<u32> {
        Some(self.lines.line_of(span.start))
    }

    fn emit(&mut self, op: Opcode, line: Option<u32>) {
        self.items.push(Item::Instr(Instruction::new(op, line)));
    }

    fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    fn place(&mut self, label: Label) {
        self.items.push(Item::Label(label));
    }

    fn emit_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.emit_stmt(stmt);
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        let line = self.line(stmt.span);
        match &stmt.kind {
            StmtKind::Let { name, value } | StmtKind::Assign { name, value } => {
                self.emit_expr(value);
                self.emit(Opcode::StoreName(name.name.clone()), line);
            }
            StmtKind::Output(expr) => {
                self.emit_expr(expr);
                self.emit(Opcode::Print, line);
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.emit(Opcode::Nop, line);
                self.emit_expr(condition);
                let end = self.new_label();
                match else_branch {
                    Some(else_branch) => {
                        let otherwise = self.new_label();
                        self.emit(Opcode::PopJumpIfFalse(otherwise), line);
                        self.emit_block(then_branch);
                        self.emit(Opcode::Jump(end), line);
                        self.place(otherwise);
                        self.emit_block(else_branch);
                    }
                    None => {
                        self.emit(Opcode::PopJumpIfFalse(end), line);
                        self.emit_block(then_branch);
                    }
                }
                self.place(end);
            }
            StmtKind::While { condition, body } => {
                let start = self.new_label();
                let end = self.new_label();
                self.place(start);
                self.emit(Opcode::Nop, line);
                self.emit_expr(condition);
                self.emit(Opcode::PopJumpIfFalse(end), line);
                self.emit_block(body);
                self.emit(Opcode::Jump(start), line);
                self.place(end);
            }
        }
    }

    fn emit_expr(&mut self, expr: &Expr) {
        let line = self.line(expr.span);
        match &expr.kind {
            ExprKind::Integer(value) => self.emit(Opcode::LoadConst(Constant::Integer(*value)), line),
            ExprKind::Bool(value) => self.emit(Opcode::LoadConst(Constant::Bool(*value)), line),
            ExprKind::Name(name) => self.emit(Opcode::LoadName(name.clone()), line),
            ExprKind::Unary { op, operand } => {
                self.emit_expr(operand);
                let op = match op {
                    UnaryOp::Neg => Opcode::UnaryNegative,
                    UnaryOp::Not => Opcode::UnaryNot,
                };
                self.emit(op, line);
            }
            ExprKind::Binary { left, op, right } => {
                self.emit_expr(left);
                self.emit_expr(right);
                if op.is_comparison() {
                    self.emit(Opcode::CompareOp(*op), line);
                } else {
                    self.emit(Opcode::BinaryOp(*op), line);
                }
            }
        }
    }
}
