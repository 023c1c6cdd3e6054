use crate::language::ast::{BinaryOp, Block, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp};

/// Constant-folds every expression in the program. Statement structure and
/// spans are preserved; folded expressions keep the span of the expression
/// they replace.
pub fn fold_program(program: &Program) -> Program {
    Program {
        statements: program.statements.iter().map(fold_stmt).collect(),
    }
}

fn fold_block(block: &Block) -> Block {
    Block {
        statements: block.statements.iter().map(fold_stmt).collect(),
        span: block.span,
    }
}

fn fold_stmt(stmt: &Stmt) -> Stmt {
    let kind = match &stmt.kind {
        StmtKind::Let { name, value } => StmtKind::Let {
            name: name.clone(),
            value: fold_expr(value),
        },
        StmtKind::Assign { name, value } => StmtKind::Assign {
            name: name.clone(),
            value: fold_expr(value),
        },
        StmtKind::Output(expr) => StmtKind::Output(fold_expr(expr)),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition: fold_expr(condition),
            then_branch: fold_block(then_branch),
            else_branch: else_branch.as_ref().map(fold_block),
        },
        StmtKind::While { condition, body } => StmtKind::While {
            condition: fold_expr(condition),
            body: fold_block(body),
        },
    };
    Stmt {
        kind,
        span: stmt.span,
    }
}

pub fn fold_expr(expr: &Expr) -> Expr {
    let kind = match &expr.kind {
        ExprKind::Unary { op, operand } => {
            let operand = fold_expr(operand);
            match Constant::from_expr(&operand.kind).and_then(|value| eval_unary(*op, value)) {
                Some(value) => value.into(),
                None => ExprKind::Unary {
                    op: *op,
                    operand: Box::new(operand),
                },
            }
        }
        ExprKind::Binary { left, op, right } => {
            let left = fold_expr(left);
            let right = fold_expr(right);
            match eval_binary(*op, &left.kind, &right.kind) {
                Some(kind) => kind,
                None => ExprKind::Binary {
                    left: Box::new(left),
                    op: *op,
                    right: Box::new(right),
                },
            }
        }
        other => other.clone(),
    };
    Expr {
        kind,
        span: expr.span,
    }
}

/// Evaluates `op` over two literal operands. Division and modulo by zero are
/// left for run time.
pub fn eval_binary(op: BinaryOp, left: &ExprKind, right: &ExprKind) -> Option<ExprKind> {
    let lhs = Constant::from_expr(left)?;
    let rhs = Constant::from_expr(right)?;
    eval_constant_binary(op, lhs, rhs).map(ExprKind::from)
}

/// Literal value shared by the tree folder and the IR optimizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Constant {
    Integer(i64),
    Bool(bool),
}

impl Constant {
    pub fn from_expr(kind: &ExprKind) -> Option<Self> {
        match kind {
            ExprKind::Integer(value) => Some(Constant::Integer(*value)),
            ExprKind::Bool(value) => Some(Constant::Bool(*value)),
            _ => None,
        }
    }
}

impl From<Constant> for ExprKind {
    fn from(constant: Constant) -> Self {
        match constant {
            Constant::Integer(value) => ExprKind::Integer(value),
            Constant::Bool(value) => ExprKind::Bool(value),
        }
    }
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Integer(value) => write!(f, "{value}"),
            Constant::Bool(true) => f.write_str("true"),
            Constant::Bool(false) => f.write_str("false"),
        }
    }
}

/// Folding rules for both the tree and the IR. Mixed operand types are
/// left unfolded.
pub fn eval_constant_binary(op: BinaryOp, lhs: Constant, rhs: Constant) -> Option<Constant> {
    match (lhs, rhs) {
        (Constant::Integer(lhs), Constant::Integer(rhs)) => eval_integer_binary(op, lhs, rhs),
        (Constant::Bool(lhs), Constant::Bool(rhs)) => match op {
            BinaryOp::Eq => Some(Constant::Bool(lhs == rhs)),
            BinaryOp::NotEq => Some(Constant::Bool(lhs != rhs)),
            _ => None,
        },
        _ => None,
    }
}

pub fn eval_unary(op: UnaryOp, operand: Constant) -> Option<Constant> {
    match (op, operand) {
        (UnaryOp::Neg, Constant::Integer(value)) => Some(Constant::Integer(value.wrapping_neg())),
        (UnaryOp::Not, Constant::Bool(value)) => Some(Constant::Bool(!value)),
        _ => None,
    }
}

fn eval_integer_binary(op: BinaryOp, lhs: i64, rhs: i64) -> Option<Constant> {
    let value = match op {
        BinaryOp::Add => Constant::Integer(lhs.wrapping_add(rhs)),
        BinaryOp::Sub => Constant::Integer(lhs.wrapping_sub(rhs)),
        BinaryOp::Mul => Constant::Integer(lhs.wrapping_mul(rhs)),
        BinaryOp::Div => Constant::Integer(lhs.checked_div(rhs)?),
        BinaryOp::Mod => Constant::Integer(lhs.checked_rem(rhs)?),
        BinaryOp::Eq => Constant::Bool(lhs == rhs),
        BinaryOp::NotEq => Constant::Bool(lhs != rhs),
        BinaryOp::Lt => Constant::Bool(lhs < rhs),
        BinaryOp::LtEq => Constant::Bool(lhs <= rhs),
        BinaryOp::Gt => Constant::Bool(lhs > rhs),
        BinaryOp::GtEq => Constant::Bool(lhs >= rhs),
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse_source;

    fn folded_output(source: &str) -> ExprKind {
        let program = fold_program(&parse_source(source).expect("parse"));
        match &program.statements[0].kind {
            StmtKind::Output(expr) => expr.kind.clone(),
            other => panic!("expected output, got {other:?}"),
        }
    }

    #[test]
    fn folds_nested_arithmetic() {
        assert_eq!(folded_output("out((1 + 2) * -3);"), ExprKind::Integer(-9));
    }

    #[test]
    fn folds_comparisons_to_booleans() {
        assert_eq!(folded_output("out(2 * 3 >= 6);"), ExprKind::Bool(true));
        assert_eq!(folded_output("out(!(1 == 2));"), ExprKind::Bool(true));
    }

    #[test]
    fn leaves_division_by_zero() {
        assert!(matches!(
            folded_output("out(1 / 0);"),
            ExprKind::Binary {
                op: BinaryOp::Div,
                ..
            }
        ));
    }

    #[test]
    fn folds_boolean_equality_only() {
        assert_eq!(folded_output("out(true == false);"), ExprKind::Bool(false));
        assert_eq!(folded_output("out(!true != false);"), ExprKind::Bool(false));
        assert!(matches!(
            folded_output("out(true < false);"),
            ExprKind::Binary { op: BinaryOp::Lt, .. }
        ));
        assert!(matches!(
            folded_output("out(1 == true);"),
            ExprKind::Binary { op: BinaryOp::Eq, .. }
        ));
    }

    #[test]
    fn keeps_names_unfolded() {
        let kind = folded_output("out(x + 2 * 2);");
        let ExprKind::Binary { right, .. } = kind else {
            panic!("expected binary");
        };
        assert_eq!(right.kind, ExprKind::Integer(4));
    }
}
