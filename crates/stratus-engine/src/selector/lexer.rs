//! Tokenizer for the query language.

use serde_json::Value;
use stratus_core::errors::SelectorError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Identifier(String),
    QuotedIdentifier(String),
    Number(i64),
    Literal(Value),
    Dot,
    Star,
    Flatten, // []
    Filter,  // [?
    Lbracket,
    Rbracket,
    Lbrace,
    Rbrace,
    Lparen,
    Rparen,
    Comma,
    Colon,
    Pipe,
    Or,
    And,
    Not,
    Ampersand,
    At,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Eof,
}

/// Projections keep absorbing tokens that bind at least this tightly.
pub(crate) const PROJECTION_STOP: usize = 10;

impl Token {
    /// Left binding power.
    pub(crate) fn lbp(&self) -> usize {
        match self {
            Self::Pipe => 1,
            Self::Or => 2,
            Self::And => 3,
            Self::Eq | Self::Ne | Self::Lt | Self::Lte | Self::Gt | Self::Gte => 5,
            Self::Flatten => 9,
            Self::Star => 20,
            Self::Filter => 21,
            Self::Dot => 40,
            Self::Not => 45,
            Self::Lbrace => 50,
            Self::Lbracket => 55,
            Self::Lparen => 60,
            _ => 0,
        }
    }
}

/// Tokenize a query into `(offset, token)` pairs, terminated by `Eof`.
pub(crate) fn tokenize(query: &str) -> Result<Vec<(usize, Token)>, SelectorError> {
    let chars: Vec<(usize, char)> = query.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let err = |offset: usize, message: String| SelectorError::Syntax {
        query: query.to_string(),
        offset,
        message,
    };
    let peek = |i: usize| chars.get(i).map(|(_, c)| *c);

    while i < chars.len() {
        let (offset, c) = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '.' => {
                tokens.push((offset, Token::Dot));
                i += 1;
            }
            '*' => {
                tokens.push((offset, Token::Star));
                i += 1;
            }
            '@' => {
                tokens.push((offset, Token::At));
                i += 1;
            }
            ',' => {
                tokens.push((offset, Token::Comma));
                i += 1;
            }
            ':' => {
                tokens.push((offset, Token::Colon));
                i += 1;
            }
            '(' => {
                tokens.push((offset, Token::Lparen));
                i += 1;
            }
            ')' => {
                tokens.push((offset, Token::Rparen));
                i += 1;
            }
            '{' => {
                tokens.push((offset, Token::Lbrace));
                i += 1;
            }
            '}' => {
                tokens.push((offset, Token::Rbrace));
                i += 1;
            }
            ']' => {
                tokens.push((offset, Token::Rbracket));
                i += 1;
            }
            '[' => match peek(i + 1) {
                Some(']') => {
                    tokens.push((offset, Token::Flatten));
                    i += 2;
                }
                Some('?') => {
                    tokens.push((offset, Token::Filter));
                    i += 2;
                }
                _ => {
                    tokens.push((offset, Token::Lbracket));
                    i += 1;
                }
            },
            '|' if peek(i + 1) == Some('|') => {
                tokens.push((offset, Token::Or));
                i += 2;
            }
            '|' => {
                tokens.push((offset, Token::Pipe));
                i += 1;
            }
            '&' if peek(i + 1) == Some('&') => {
                tokens.push((offset, Token::And));
                i += 2;
            }
            '&' => {
                tokens.push((offset, Token::Ampersand));
                i += 1;
            }
            '!' if peek(i + 1) == Some('=') => {
                tokens.push((offset, Token::Ne));
                i += 2;
            }
            '!' => {
                tokens.push((offset, Token::Not));
                i += 1;
            }
            '=' if peek(i + 1) == Some('=') => {
                tokens.push((offset, Token::Eq));
                i += 2;
            }
            '<' if peek(i + 1) == Some('=') => {
                tokens.push((offset, Token::Lte));
                i += 2;
            }
            '<' => {
                tokens.push((offset, Token::Lt));
                i += 1;
            }
            '>' if peek(i + 1) == Some('=') => {
                tokens.push((offset, Token::Gte));
                i += 2;
            }
            '>' => {
                tokens.push((offset, Token::Gt));
                i += 1;
            }
            '\'' => {
                let (raw, next) = delimited(&chars, i + 1, '\'')
                    .ok_or_else(|| err(offset, "unterminated raw string".into()))?;
                let text = raw.replace("\\'", "'").replace("\\\\", "\\");
                tokens.push((offset, Token::Literal(Value::String(text))));
                i = next;
            }
            '`' => {
                let (raw, next) = delimited(&chars, i + 1, '`')
                    .ok_or_else(|| err(offset, "unterminated JSON literal".into()))?;
                let text = raw.replace("\\`", "`");
                let value: Value = serde_json::from_str(text.trim())
                    .map_err(|e| err(offset, format!("invalid JSON literal: {e}")))?;
                tokens.push((offset, Token::Literal(value)));
                i = next;
            }
            '"' => {
                let (raw, next) = delimited(&chars, i + 1, '"')
                    .ok_or_else(|| err(offset, "unterminated quoted identifier".into()))?;
                let name: String = serde_json::from_str(&format!("\"{raw}\""))
                    .map_err(|e| err(offset, format!("invalid quoted identifier: {e}")))?;
                tokens.push((offset, Token::QuotedIdentifier(name)));
                i = next;
            }
            c if c.is_ascii_digit() || (c == '-' && peek(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while peek(i).is_some_and(|n| n.is_ascii_digit()) {
                    i += 1;
                }
                let text: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let n: i64 = text
                    .parse()
                    .map_err(|_| err(offset, format!("invalid number `{text}`")))?;
                tokens.push((offset, Token::Number(n)));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while peek(i).is_some_and(|n| n.is_ascii_alphanumeric() || n == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push((offset, Token::Identifier(word)));
            }
            other => return Err(err(offset, format!("unexpected character `{other}`"))),
        }
    }

    tokens.push((query.len(), Token::Eof));
    Ok(tokens)
}

/// Collect characters up to an unescaped `close`. Escapes are kept verbatim
/// for the caller to interpret. Returns the text and the index after `close`.
fn delimited(chars: &[(usize, char)], mut i: usize, close: char) -> Option<(String, usize)> {
    let mut out = String::new();
    while i < chars.len() {
        let c = chars[i].1;
        if c == '\\' && i + 1 < chars.len() {
            out.push(c);
            out.push(chars[i + 1].1);
            i += 2;
            continue;
        }
        if c == close {
            return Some((out, i + 1));
        }
        out.push(c);
        i += 1;
    }
    None
}
