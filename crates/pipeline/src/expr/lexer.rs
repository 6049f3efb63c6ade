//! Tokenizer for predicate text.

use crate::error::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    /// Identifiers and keywords (`and`, `or`, `not`, `in`, `True`, `False`)
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Bang,
    AndAnd,
    OrOr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub position: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let is_float = i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit();
            if is_float {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let value = source[start..i]
                    .parse()
                    .map_err(|_| ParseError::new(start, "invalid number"))?;
                tokens.push(Token { kind: TokenKind::Float(value), position: start });
            } else {
                let value = source[start..i]
                    .parse()
                    .map_err(|_| ParseError::new(start, "integer literal too large"))?;
                tokens.push(Token { kind: TokenKind::Int(value), position: start });
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Ident(source[start..i].to_string()),
                position: start,
            });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (kind, width) = match (c, next) {
            (b'=', Some(b'=')) => (TokenKind::EqEq, 2),
            (b'!', Some(b'=')) => (TokenKind::NotEq, 2),
            (b'<', Some(b'=')) => (TokenKind::Le, 2),
            (b'>', Some(b'=')) => (TokenKind::Ge, 2),
            (b'/', Some(b'/')) => (TokenKind::DoubleSlash, 2),
            (b'&', Some(b'&')) => (TokenKind::AndAnd, 2),
            (b'|', Some(b'|')) => (TokenKind::OrOr, 2),
            (b'<', _) => (TokenKind::Lt, 1),
            (b'>', _) => (TokenKind::Gt, 1),
            (b'!', _) => (TokenKind::Bang, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b'[', _) => (TokenKind::LBracket, 1),
            (b']', _) => (TokenKind::RBracket, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'=', _) => {
                return Err(ParseError::new(start, "assignment is not allowed, use '=='"));
            }
            _ => {
                let ch = source[start..].chars().next().unwrap_or('?');
                return Err(ParseError::new(start, format!("unexpected character '{}'", ch)));
            }
        };
        tokens.push(Token { kind, position: start });
        i += width;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_comparison() {
        assert_eq!(
            kinds("final_sum >= 120"),
            vec![
                TokenKind::Ident("final_sum".to_string()),
                TokenKind::Ge,
                TokenKind::Int(120),
            ]
        );
    }

    #[test]
    fn test_tokenize_operators() {
        assert_eq!(
            kinds("a//2 != 1.5 && !b"),
            vec![
                TokenKind::Ident("a".to_string()),
                TokenKind::DoubleSlash,
                TokenKind::Int(2),
                TokenKind::NotEq,
                TokenKind::Float(1.5),
                TokenKind::AndAnd,
                TokenKind::Bang,
                TokenKind::Ident("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_rejects_assignment() {
        let err = tokenize("final_sum = 3").unwrap_err();
        assert_eq!(err.position, 10);
    }

    #[test]
    fn test_tokenize_rejects_unknown_character() {
        let err = tokenize("final_sum > 3 ; import").unwrap_err();
        assert_eq!(err.position, 14);
        assert!(err.message.contains(';'));
    }
}
