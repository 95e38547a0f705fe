// src/filter/lexer.rs

//! Tokenizer for filter expressions.

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(serde_json::Number),
    Str(String),
    Ident(String),
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Bang,
    Minus,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

/// A token and the byte offset it starts at.
pub type Spanned = (Token, usize);

pub fn tokenize(input: &str) -> Result<Vec<Spanned>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        let start = pos;

        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let (number, end) = lex_number(input, start)?;
            tokens.push((Token::Number(number), start));
            pos = end;
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' {
            while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                pos += 1;
            }
            tokens.push((Token::Ident(input[start..pos].to_string()), start));
            continue;
        }

        if c == b'"' || c == b'\'' {
            let (text, end) = lex_string(input, start)?;
            tokens.push((Token::Str(text), start));
            pos = end;
            continue;
        }

        let two = bytes.get(pos + 1).copied();
        let (token, width) = match (c, two) {
            (b'=', Some(b'=')) => (Token::Eq, 2),
            (b'!', Some(b'=')) => (Token::Ne, 2),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'&', Some(b'&')) => (Token::And, 2),
            (b'|', Some(b'|')) => (Token::Or, 2),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'.', _) => (Token::Dot, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b'[', _) => (Token::LBracket, 1),
            (b']', _) => (Token::RBracket, 1),
            _ => {
                let found = input[start..].chars().next().unwrap_or_default();
                return Err(AppError::filter(start, format!("unexpected character '{found}'")));
            }
        };
        tokens.push((token, start));
        pos += width;
    }

    Ok(tokens)
}

fn lex_number(input: &str, start: usize) -> Result<(serde_json::Number, usize)> {
    let bytes = input.as_bytes();
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    let is_float = end + 1 < bytes.len() && bytes[end] == b'.' && bytes[end + 1].is_ascii_digit();
    if is_float {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }

    let text = &input[start..end];
    let number = if is_float {
        text.parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
    } else {
        text.parse::<i64>().ok().map(serde_json::Number::from)
    };
    number
        .map(|n| (n, end))
        .ok_or_else(|| AppError::filter(start, format!("invalid number '{text}'")))
}

fn lex_string(input: &str, start: usize) -> Result<(String, usize)> {
    let mut chars = input[start..].char_indices();
    let quote = chars.next().map(|(_, c)| c).unwrap_or('"');
    let mut text = String::new();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            c if c == quote => return Ok((text, start + offset + c.len_utf8())),
            c => text.push(c),
        }
    }

    Err(AppError::filter(start, "unterminated string"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<Token> {
        tokenize(input).unwrap().into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("a >= 1 && !b"),
            vec![
                Token::Ident("a".into()),
                Token::Ge,
                Token::Number(1.into()),
                Token::And,
                Token::Bang,
                Token::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn test_strings_and_floats() {
        assert_eq!(
            kinds(r#"'it\'s' "x" 2.5"#),
            vec![
                Token::Str("it's".into()),
                Token::Str("x".into()),
                Token::Number(serde_json::Number::from_f64(2.5).unwrap()),
            ]
        );
    }

    #[test]
    fn test_member_access_is_not_a_float() {
        assert_eq!(
            kinds("owner.login"),
            vec![
                Token::Ident("owner".into()),
                Token::Dot,
                Token::Ident("login".into()),
            ]
        );
    }

    #[test]
    fn test_errors_carry_position() {
        assert!(matches!(
            tokenize("name == \"open"),
            Err(AppError::Filter { position: 8, .. })
        ));
        assert!(matches!(
            tokenize("a # b"),
            Err(AppError::Filter { position: 2, .. })
        ));
    }
}
