use crate::language::span::Span;

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(String),
    Integer(i64),
    Comment(String),
    Unknown(String),

    Let,
    Out,
    If,
    Else,
    While,
    True,
    False,

    Eq,
    EqEq,
    Bang,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Semi,

    LParen,
    RParen,
    LBrace,
    RBrace,

    Eof,
}

impl TokenKind {
    /// Category shown in the token panel.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Identifier(_) => "NAME",
            TokenKind::Integer(_) => "NUMBER",
            TokenKind::Comment(_) => "COMMENT",
            TokenKind::Unknown(_) => "ERRORTOKEN",
            TokenKind::Let
            | TokenKind::Out
            | TokenKind::If
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::True
            | TokenKind::False => "KEYWORD",
            TokenKind::Eq => "EQUAL",
            TokenKind::EqEq => "EQEQUAL",
            TokenKind::Bang => "EXCLAMATION",
            TokenKind::BangEq => "NOTEQUAL",
            TokenKind::Lt => "LESS",
            TokenKind::LtEq => "LESSEQUAL",
            TokenKind::Gt => "GREATER",
            TokenKind::GtEq => "GREATEREQUAL",
            TokenKind::Plus => "PLUS",
            TokenKind::Minus => "MINUS",
            TokenKind::Star => "STAR",
            TokenKind::Slash => "SLASH",
            TokenKind::Percent => "PERCENT",
            TokenKind::Semi => "SEMI",
            TokenKind::LParen => "LPAR",
            TokenKind::RParen => "RPAR",
            TokenKind::LBrace => "LBRACE",
            TokenKind::RBrace => "RBRACE",
            TokenKind::Eof => "ENDMARKER",
        }
    }

    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "let" => TokenKind::Let,
            "out" => TokenKind::Out,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenKind::Comment(_))
    }
}
