use crate::language::{
    ast::{BinaryOp, Block, Expr, ExprKind, Ident, Program, Stmt, StmtKind, UnaryOp},
    errors::{SyntaxError, SyntaxErrors},
    lexer::tokenize,
    span::Span,
    token::{Token, TokenKind},
};

/// Deepest nesting of parentheses, unary operators, operator chains and
/// blocks the parser accepts. Every later stage walks the tree recursively.
pub const MAX_NESTING: usize = 100;

pub fn parse_source(source: &str) -> Result<Program, SyntaxErrors> {
    let tokens: Vec<Token> = tokenize(source)
        .into_iter()
        .filter(|token| !token.kind.is_trivia())
        .collect();
    parse(&tokens)
}

pub fn parse(tokens: &[Token]) -> Result<Program, SyntaxErrors> {
    let mut parser = AstParser::new(tokens);
    let program = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(SyntaxErrors::new(parser.errors))
    }
}

struct AstParser<'a> {
    tokens: &'a [Token],
    position: usize,
    last_span: Option<Span>,
    errors: Vec<SyntaxError>,
    depth: usize,
}

impl<'a> AstParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
            last_span: None,
            errors: Vec::new(),
            depth: 0,
        }
    }

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if self.check(&TokenKind::RBrace) {
                let span = self.peek_span();
                self.report_error(SyntaxError::new("Unmatched '}'", span));
                self.advance();
                continue;
            }
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.report_error(err);
                    self.synchronize();
                }
            }
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        match self.peek_kind() {
            Some(TokenKind::Let) => self.parse_let_statement(),
            Some(TokenKind::Out) => self.parse_output_statement(),
            Some(TokenKind::If) => self.parse_if_statement(),
            Some(TokenKind::While) => self.parse_while_statement(),
            Some(TokenKind::Identifier(_)) => self.parse_assign_statement(),
            Some(TokenKind::Unknown(text)) => Err(SyntaxError::new(
                format!("Unrecognised input {:?}", text),
                self.peek_span(),
            )),
            Some(kind) => Err(SyntaxError::new(
                format!("Unexpected token {} in statement", kind.name()),
                self.peek_span(),
            )),
            None => Err(SyntaxError::new(
                "Unexpected end of input while reading statement",
                self.eof_span(),
            )),
        }
    }

    fn parse_let_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.expect(&TokenKind::Let, "Expected 'let'")?;
        let name = self.parse_ident("Expected identifier after 'let'")?;
        self.expect(&TokenKind::Eq, "Expected '=' after identifier")
            .map_err(|err| err.with_help(format!("Try: let {} = <value>;", name.name)))?;
        let value = self.parse_expression()?;
        let help = format!("Try: let {} = {};", name.name, value.as_source());
        let end = self.expect_semicolon(help)?;
        Ok(Stmt {
            kind: StmtKind::Let { name, value },
            span: start.join(end),
        })
    }

    fn parse_assign_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let name = self.parse_ident("Expected identifier")?;
        self.expect(&TokenKind::Eq, "Expected '=' after identifier")
            .map_err(|err| err.with_help(format!("Try: {} = <value>;", name.name)))?;
        let value = self.parse_expression()?;
        let help = format!("Try: {} = {};", name.name, value.as_source());
        let end = self.expect_semicolon(help)?;
        Ok(Stmt {
            span: name.span.join(end),
            kind: StmtKind::Assign { name, value },
        })
    }

    fn parse_output_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.expect(&TokenKind::Out, "Expected 'out'")?;
        self.expect(&TokenKind::LParen, "Expected '(' after 'out'")?;
        let expr = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "Expected ')' after expression")?;
        let help = format!("Try: out({});", expr.as_source());
        let end = self.expect_semicolon(help)?;
        Ok(Stmt {
            kind: StmtKind::Output(expr),
            span: start.join(end),
        })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.expect(&TokenKind::If, "Expected 'if'")?;
        let condition = self.parse_expression()?;
        let then_branch = self.parse_block()?;
        let mut span = start.join(then_branch.span);
        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            let block = if self.check(&TokenKind::If) {
                let nested = self.nested(self.peek_span(), Self::parse_if_statement)?;
                Block {
                    span: nested.span,
                    statements: vec![nested],
                }
            } else {
                self.parse_block()?
            };
            span = span.join(block.span);
            Some(block)
        } else {
            None
        };
        Ok(Stmt {
            kind: StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
            span,
        })
    }

    fn parse_while_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let start = self.expect(&TokenKind::While, "Expected 'while'")?;
        let condition = self.parse_expression()?;
        let body = self.parse_block()?;
        Ok(Stmt {
            span: start.join(body.span),
            kind: StmtKind::While { condition, body },
        })
    }

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        let start = self.expect(&TokenKind::LBrace, "Expected '{' to start a block")?;
        self.nested(start, |parser| parser.parse_block_body(start))
    }

    fn parse_block_body(&mut self, start: Span) -> Result<Block, SyntaxError> {
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.report_error(err);
                    self.synchronize();
                }
            }
        }
        let end = self.expect(&TokenKind::RBrace, "Expected '}' to close the block")?;
        Ok(Block {
            statements,
            span: start.join(end),
        })
    }

    fn parse_ident(&mut self, message: &str) -> Result<Ident, SyntaxError> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Identifier(name),
                span,
            }) => {
                let ident = Ident {
                    name: name.clone(),
                    span: *span,
                };
                self.advance();
                Ok(ident)
            }
            Some(token) => Err(SyntaxError::new(
                format!("{}: found {}", message, token.kind.name()),
                token.span,
            )),
            None => Err(SyntaxError::new(message, self.eof_span())),
        }
    }

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        let left = self.parse_additive()?;
        let op = match self.peek_kind() {
            Some(TokenKind::EqEq) => BinaryOp::Eq,
            Some(TokenKind::BangEq) => BinaryOp::NotEq,
            Some(TokenKind::Lt) => BinaryOp::Lt,
            Some(TokenKind::LtEq) => BinaryOp::LtEq,
            Some(TokenKind::Gt) => BinaryOp::Gt,
            Some(TokenKind::GtEq) => BinaryOp::GtEq,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive()?;
        Ok(binary(left, op, right))
    }

    fn parse_additive(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_chain(Self::parse_term, additive_op)
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_chain(Self::parse_unary, multiplicative_op)
    }

    /// Left-associative operator chain. Each operator deepens the tree by
    /// one level, so it counts against the nesting limit.
    fn parse_chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, SyntaxError>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr, SyntaxError> {
        let saved = self.depth;
        let result = self.parse_chain_from(operand, operator);
        self.depth = saved;
        result
    }

    fn parse_chain_from(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr, SyntaxError>,
        operator: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr, SyntaxError> {
        let mut expr = operand(self)?;
        while let Some(op) = self.peek_kind().and_then(operator) {
            let span = self.peek_span();
            self.advance();
            self.deepen(span)?;
            let right = operand(self)?;
            expr = binary(expr, op, right);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let op = match self.peek_kind() {
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Bang) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        let start = self.peek_span();
        self.advance();
        let operand = self.nested(start, Self::parse_unary)?;
        Ok(Expr {
            span: start.join(operand.span),
            kind: ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let Some(token) = self.advance() else {
            return Err(SyntaxError::new(
                "Unexpected end of input while reading expression",
                self.eof_span(),
            ));
        };
        let kind = match &token.kind {
            TokenKind::Integer(value) => ExprKind::Integer(*value),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Identifier(name) => ExprKind::Name(name.clone()),
            TokenKind::LParen => {
                let start = token.span;
                let inner = self.nested(start, Self::parse_expression)?;
                let end = self.expect(&TokenKind::RParen, "Expected ')' after expression")?;
                return Ok(Expr {
                    kind: inner.kind,
                    span: start.join(end),
                });
            }
            kind => {
                return Err(SyntaxError::new(
                    format!("Unexpected token {} in expression", kind.name()),
                    token.span,
                ))
            }
        };
        Ok(Expr {
            kind,
            span: token.span,
        })
    }

    fn expect(&mut self, expected: &TokenKind, message: &str) -> Result<Span, SyntaxError> {
        match self.peek() {
            Some(token) if &token.kind == expected => {
                let span = token.span;
                self.advance();
                Ok(span)
            }
            Some(token) if token.kind != TokenKind::Eof => Err(SyntaxError::new(
                format!("{}: found {}", message, token.kind.name()),
                token.span,
            )),
            _ => Err(SyntaxError::new(
                format!("{}: reached end of input", message),
                self.eof_span(),
            )),
        }
    }

    fn expect_semicolon(&mut self, help: String) -> Result<Span, SyntaxError> {
        let after_last = self.span_after_last();
        self.expect(&TokenKind::Semi, "Expected ';' after statement")
            .map_err(|mut err| {
                err.span = after_last;
                err.with_help(help)
            })
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<&'a TokenKind> {
        self.peek()
            .map(|token| &token.kind)
            .filter(|kind| **kind != TokenKind::Eof)
    }

    fn peek_span(&self) -> Span {
        self.peek()
            .map(|token| token.span)
            .unwrap_or_else(|| self.eof_span())
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self
            .tokens
            .get(self.position)
            .filter(|token| token.kind != TokenKind::Eof);
        if let Some(token) = token {
            self.position += 1;
            self.last_span = Some(token.span);
        }
        token
    }

    fn check(&self, expected: &TokenKind) -> bool {
        matches!(self.peek_kind(), Some(kind) if kind == expected)
    }

    fn is_at_end(&self) -> bool {
        self.peek_kind().is_none()
    }

    fn eof_span(&self) -> Span {
        self.last_span
            .or_else(|| self.tokens.last().map(|token| token.span))
            .map(|span| Span::new(span.end, span.end))
            .unwrap_or_default()
    }

    fn span_after_last(&self) -> Span {
        self.last_span
            .map(|span| Span::new(span.end, span.end))
            .unwrap_or_default()
    }

    fn deepen(&mut self, span: Span) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::new("Code nested too deeply", span).with_help(format!(
                "Nesting is limited to {MAX_NESTING} levels; split it into several statements"
            )));
        }
        self.depth += 1;
        Ok(())
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        span: Span,
        parse: impl FnOnce(&mut Self) -> Result<T, SyntaxError>,
    ) -> Result<T, SyntaxError> {
        let saved = self.depth;
        let result = self.deepen(span).and_then(|()| parse(self));
        self.depth = saved;
        result
    }

    fn report_error(&mut self, err: SyntaxError) {
        self.errors.push(err);
    }

    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.check(&TokenKind::Semi) {
                self.advance();
                break;
            }
            if self.check(&TokenKind::RBrace) {
                break;
            }
            self.advance();
        }
    }
}

fn additive_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn multiplicative_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        _ => None,
    }
}

fn binary(left: Expr, op: BinaryOp, right: Expr) -> Expr {
    Expr {
        span: left.span.join(right.span),
        kind: ExprKind::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_control_flow() {
        let program = parse_source(
            "let x = 1;\nif x < 2 {\n  out(x);\n} else if x == 3 {\n  x = 4;\n}\nwhile x { x = x - 1; }\n",
        )
        .expect("parse");
        assert_eq!(program.statements.len(), 3);
        match &program.statements[1].kind {
            StmtKind::If { else_branch, .. } => {
                let else_branch = else_branch.as_ref().expect("else");
                assert!(matches!(
                    else_branch.statements[0].kind,
                    StmtKind::If { .. }
                ));
            }
            other => panic!("expected if, got {other:?}"),
        }
        assert!(matches!(
            program.statements[2].kind,
            StmtKind::While { .. }
        ));
    }

    #[test]
    fn respects_operator_precedence() {
        let program = parse_source("out(1 + 2 * 3);").expect("parse");
        let StmtKind::Output(expr) = &program.statements[0].kind else {
            panic!("expected output");
        };
        assert_eq!(expr.as_source(), "1 + 2 * 3");
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn statement_span_covers_whole_statement() {
        let source = "let total = 1 +\n  2;";
        let program = parse_source(source).expect("parse");
        assert_eq!(program.statements[0].span, Span::new(0, source.len()));
    }

    #[test]
    fn collects_multiple_errors() {
        let err = parse_source("let = 1;\nout(2)\nlet y = 3;\n$").expect_err("errors");
        assert_eq!(err.errors.len(), 3);
        assert!(err.errors[0].message.contains("Expected identifier"));
        assert!(err.errors[1].message.contains("Expected ';'"));
        assert_eq!(err.errors[1].help.as_deref(), Some("Try: out(2);"));
        assert!(err.errors[2].message.contains("Unrecognised input"));
    }

    #[test]
    fn reports_unclosed_block() {
        let err = parse_source("if true {\n out(1);\n").expect_err("error");
        assert!(err.errors[0].message.contains("Expected '}'"));
    }

    #[test]
    fn skips_comments() {
        let program = parse_source("// header\nout(1); // trailing\n").expect("parse");
        assert_eq!(program.statements.len(), 1);
    }

    fn nested_parens(depth: usize) -> String {
        format!("out({}1{});", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn accepts_nesting_up_to_the_limit() {
        parse_source(&nested_parens(MAX_NESTING - 1)).expect("parse");
        let chain = format!("out(1{});", " + 1".repeat(MAX_NESTING / 2));
        parse_source(&chain).expect("parse");
    }

    #[test]
    fn rejects_deep_parentheses() {
        let err = parse_source(&nested_parens(5_000)).expect_err("too deep");
        assert_eq!(err.errors.len(), 1);
        assert!(err.errors[0].message.contains("nested too deeply"));
    }

    #[test]
    fn rejects_long_operator_chains_and_deep_blocks() {
        let chain = format!("out(1{});", " + 1".repeat(5_000));
        let err = parse_source(&chain).expect_err("too deep");
        assert!(err.errors[0].message.contains("nested too deeply"));

        let blocks = format!("{}out(1);{}", "if x {\n".repeat(1_000), "}\n".repeat(1_000));
        let err = parse_source(&blocks).expect_err("too deep");
        assert!(err.errors[0].message.contains("nested too deeply"));

        let unary = format!("out({}1);", "-".repeat(5_000));
        assert!(parse_source(&unary).is_err());
    }

    #[test]
    fn depth_is_restored_after_siblings() {
        let siblings = vec![nested_parens(MAX_NESTING - 1); 50].join("\n");
        let program = parse_source(&siblings).expect("parse");
        assert_eq!(program.statements.len(), 50);
    }
}
