use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{anychar, digit1},
    combinator::{map, recognize, value},
    sequence::pair,
    IResult, Parser as NomParser,
};

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_ident_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn parse_comment(input: &str) -> IResult<&str, TokenKind> {
    map(
        recognize(pair(tag("//"), take_till(|ch: char| ch == '\n'))),
        |text: &str| TokenKind::Comment(text.to_string()),
    )
    .parse(input)
}

fn parse_integer(input: &str) -> IResult<&str, TokenKind> {
    map(digit1, |digits: &str| match digits.parse::<i64>() {
        Ok(value) => TokenKind::Integer(value),
        Err(_) => TokenKind::Unknown(digits.to_string()),
    })
    .parse(input)
}

fn parse_word(input: &str) -> IResult<&str, TokenKind> {
    map(
        recognize(pair(take_while1(is_ident_start), take_while(is_ident_continue))),
        |word: &str| {
            TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Identifier(word.to_string()))
        },
    )
    .parse(input)
}

fn parse_operator(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::EqEq, tag("==")),
        value(TokenKind::BangEq, tag("!=")),
        value(TokenKind::LtEq, tag("<=")),
        value(TokenKind::GtEq, tag(">=")),
        value(TokenKind::Eq, tag("=")),
        value(TokenKind::Bang, tag("!")),
        value(TokenKind::Lt, tag("<")),
        value(TokenKind::Gt, tag(">")),
        value(TokenKind::Plus, tag("+")),
        value(TokenKind::Minus, tag("-")),
        value(TokenKind::Star, tag("*")),
        value(TokenKind::Slash, tag("/")),
        value(TokenKind::Percent, tag("%")),
        value(TokenKind::Semi, tag(";")),
        value(TokenKind::LParen, tag("(")),
        value(TokenKind::RParen, tag(")")),
        value(TokenKind::LBrace, tag("{")),
        value(TokenKind::RBrace, tag("}")),
    ))
    .parse(input)
}

fn parse_any(input: &str) -> IResult<&str, TokenKind> {
    map(anychar, |ch| TokenKind::Unknown(ch.to_string())).parse(input)
}

fn parse_token(input: &str) -> IResult<&str, TokenKind> {
    alt((
        parse_comment,
        parse_integer,
        parse_word,
        parse_operator,
        parse_any,
    ))
    .parse(input)
}

/// Splits `input` into tokens. Never fails: unrecognised characters become
/// `Unknown` tokens and are left for the parser to report.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut remaining_input = input;
    let mut offset = 0usize;

    loop {
        let trimmed = remaining_input.trim_start();
        offset += remaining_input.len() - trimmed.len();
        remaining_input = trimmed;

        if remaining_input.is_empty() {
            break;
        }

        match parse_token(remaining_input) {
            Ok((remaining, kind)) => {
                let consumed = remaining_input.len() - remaining.len();
                tokens.push(Token {
                    kind,
                    span: Span::new(offset, offset + consumed),
                });
                remaining_input = remaining;
                offset += consumed;
            }
            Err(err) => {
                tracing::warn!(offset, error = %err, "tokenizer stopped early");
                break;
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(input.len(), input.len()),
    });
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|token| token.kind).collect()
    }

    #[test]
    fn lexes_let_statement() {
        assert_eq!(
            kinds("let x = 12;"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier("x".into()),
                TokenKind::Eq,
                TokenKind::Integer(12),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn prefers_two_character_operators() {
        assert_eq!(
            kinds("a<=b != c"),
            vec![
                TokenKind::Identifier("a".into()),
                TokenKind::LtEq,
                TokenKind::Identifier("b".into()),
                TokenKind::BangEq,
                TokenKind::Identifier("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keeps_comments_and_unknown_characters() {
        let tokens = tokenize("x = 1; // note\n$");
        assert_eq!(tokens[4].kind, TokenKind::Comment("// note".into()));
        assert_eq!(tokens[4].span, Span::new(7, 14));
        assert_eq!(tokens[5].kind, TokenKind::Unknown("$".into()));
        assert_eq!(tokens[5].span, Span::new(15, 16));
    }

    #[test]
    fn identifiers_may_start_with_keywords() {
        assert_eq!(
            kinds("letter outer"),
            vec![
                TokenKind::Identifier("letter".into()),
                TokenKind::Identifier("outer".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn oversized_integer_is_unknown() {
        let tokens = tokenize("99999999999999999999");
        assert_eq!(
            tokens[0].kind,
            TokenKind::Unknown("99999999999999999999".into())
        );
    }

    #[test]
    fn eof_sits_at_end_of_input() {
        let tokens = tokenize("x\n");
        let eof = tokens.last().expect("eof");
        assert_eq!(eof.kind, TokenKind::Eof);
        assert_eq!(eof.span, Span::new(2, 2));
    }
}
