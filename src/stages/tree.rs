use crate::{
    language::{
        ast::{BinaryOp, Expr, ExprKind, Ident, Program, Stmt, StmtKind, UnaryOp},
        span::{LineMap, Span},
    },
    provenance::{Detail, SourceLine},
};

const INDENT: &str = "    ";

enum Field<'a> {
    Node(&'a dyn TreeNode),
    List(Vec<&'a dyn TreeNode>),
    Value(String),
}

/// Uniform view of tree nodes for the dump.
trait TreeNode {
    fn class(&self) -> &'static str;

    fn span(&self) -> Option<Span>;

    fn fields(&self) -> Vec<(&'static str, Field<'_>)>;
}

impl TreeNode for Program {
    fn class(&self) -> &'static str {
        "Module"
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![("body", statements(&self.statements))]
    }
}

fn statements(stmts: &[Stmt]) -> Field<'_> {
    Field::List(stmts.iter().map(|stmt| stmt as &dyn TreeNode).collect())
}

impl TreeNode for Stmt {
    fn class(&self) -> &'static str {
        match &self.kind {
            StmtKind::Let { .. } => "Let",
            StmtKind::Assign { .. } => "Assign",
            StmtKind::Output(_) => "Out",
            StmtKind::If { .. } => "If",
            StmtKind::While { .. } => "While",
        }
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        match &self.kind {
            StmtKind::Let { name, value } | StmtKind::Assign { name, value } => vec![
                ("target", Field::Node(name)),
                ("value", Field::Node(value)),
            ],
            StmtKind::Output(value) => vec![("value", Field::Node(value))],
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => vec![
                ("test", Field::Node(condition)),
                ("body", statements(&then_branch.statements)),
                (
                    "orelse",
                    statements(
                        else_branch
                            .as_ref()
                            .map(|block| block.statements.as_slice())
                            .unwrap_or(&[]),
                    ),
                ),
            ],
            StmtKind::While { condition, body } => vec![
                ("test", Field::Node(condition)),
                ("body", statements(&body.statements)),
            ],
        }
    }
}

impl TreeNode for Ident {
    fn class(&self) -> &'static str {
        "Name"
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        vec![("id", Field::Value(format!("{:?}", self.name)))]
    }
}

impl TreeNode for Expr {
    fn class(&self) -> &'static str {
        match &self.kind {
            ExprKind::Integer(_) | ExprKind::Bool(_) => "Constant",
            ExprKind::Name(_) => "Name",
            ExprKind::Unary { .. } => "UnaryOp",
            ExprKind::Binary { op, .. } if op.is_comparison() => "Compare",
            ExprKind::Binary { .. } => "BinOp",
        }
    }

    fn span(&self) -> Option<Span> {
        Some(self.span)
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        match &self.kind {
            ExprKind::Integer(value) => vec![("value", Field::Value(value.to_string()))],
            ExprKind::Bool(value) => vec![("value", Field::Value(value.to_string()))],
            ExprKind::Name(name) => vec![("id", Field::Value(format!("{name:?}")))],
            ExprKind::Unary { op, operand } => vec![
                ("op", Field::Node(op)),
                ("operand", Field::Node(&**operand)),
            ],
            ExprKind::Binary { left, op, right } => vec![
                ("left", Field::Node(&**left)),
                ("op", Field::Node(op)),
                ("right", Field::Node(&**right)),
            ],
        }
    }
}

impl TreeNode for BinaryOp {
    fn class(&self) -> &'static str {
        self.node_name()
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        Vec::new()
    }
}

impl TreeNode for UnaryOp {
    fn class(&self) -> &'static str {
        self.node_name()
    }

    fn span(&self) -> Option<Span> {
        None
    }

    fn fields(&self) -> Vec<(&'static str, Field<'_>)> {
        Vec::new()
    }
}

/// Indented dump of the tree, one detail per row. Nodes cover every line
/// of their span; lists, operators and scalar fields sit on the line of the
/// node that owns them. Rows with no known line are left untracked.
pub fn details(program: &Program, lines: &LineMap) -> Vec<Detail> {
    let mut dumper = Dumper {
        lines,
        out: Vec::new(),
    };
    dumper.node(program, 0, 0, "");
    dumper.out
}

struct Dumper<'a> {
    lines: &'a LineMap,
    out: Vec<Detail>,
}

impl<'a> Dumper<'a> {
    fn push(&mut self, text: String, start: SourceLine, end: SourceLine) {
        if start == 0 {
            self.out.push(Detail::untracked(text));
        } else {
            self.out.push(Detail::new(text, start, end));
        }
    }

    fn node(&mut self, node: &dyn TreeNode, level: usize, last_line: SourceLine, prepend: &str) {
        let prefix = format!("{}{prepend}", INDENT.repeat(level));
        let (start, end) = match node.span() {
            Some(span) => (
                self.lines.line_of(span.start),
                self.lines.end_line_of(span) + 1,
            ),
            None => (last_line, last_line + 1),
        };
        let fields = node.fields();
        let has_children = fields
            .iter()
            .any(|(_, field)| matches!(field, Field::Node(_) | Field::List(_)));

        if !has_children {
            let args = fields
                .iter()
                .filter_map(|(name, field)| match field {
                    Field::Value(value) => Some(format!("{name}={value}")),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(", ");
            self.push(format!("{prefix}{}({args})", node.class()), start, end);
            return;
        }

        self.push(format!("{prefix}{}()", node.class()), start, end);
        for (name, field) in fields {
            let prepend = format!("{name}=");
            match field {
                Field::Node(child) => self.node(child, level + 1, start, &prepend),
                Field::List(items) => {
                    let prefix = format!("{}{prepend}", INDENT.repeat(level + 1));
                    self.push(format!("{prefix}[]"), start, start + 1);
                    for item in items {
                        self.node(item, level + 2, start, "");
                    }
                }
                Field::Value(value) => {
                    let prefix = format!("{}{prepend}", INDENT.repeat(level + 1));
                    self.push(format!("{prefix}{value}"), start, start + 1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parser::parse_source;

    fn dump(source: &str) -> Vec<Detail> {
        let program = parse_source(source).expect("parse");
        details(&program, &LineMap::new(source))
    }

    #[test]
    fn dumps_nested_nodes_with_lines() {
        let rows = dump("let x = 1 +\n  2;");
        let texts: Vec<_> = rows.iter().map(|row| row.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Module()",
                "    body=[]",
                "        Let()",
                "            target=Name(id=\"x\")",
                "            value=BinOp()",
                "                left=Constant(value=1)",
                "                op=Add()",
                "                right=Constant(value=2)",
            ]
        );
        assert!(!rows[0].is_tracked());
        assert!(!rows[1].is_tracked());
        assert_eq!(rows[2].lines(), 1..3);
        assert_eq!(rows[4].lines(), 1..3);
        assert_eq!(rows[6].lines(), 1..2);
        assert_eq!(rows[7].lines(), 2..3);
    }

    #[test]
    fn compound_statements_span_their_body() {
        let rows = dump("while x {\n  out(x);\n}\n");
        let header = rows
            .iter()
            .find(|row| row.text.trim() == "While()")
            .expect("while row");
        assert_eq!(header.lines(), 1..4);
        let body = rows
            .iter()
            .find(|row| row.text.trim() == "Out()")
            .expect("out row");
        assert_eq!(body.lines(), 2..3);
    }

    #[test]
    fn empty_else_is_an_empty_list() {
        let rows = dump("if x { out(1); }");
        assert!(rows.iter().any(|row| row.text.trim() == "orelse=[]"));
    }
}
