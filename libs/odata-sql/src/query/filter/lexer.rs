// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use edm_binding::{EdmSimpleType, EdmValue, parse_calendar, parse_time};
use pg_bigdecimal::BigDecimal;
use uuid::Uuid;

use super::FilterParseError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    /// Property names, method names and operator keywords
    Identifier(String),
    Literal(EdmValue, EdmSimpleType),
    OpenParen,
    CloseParen,
    Comma,
    Slash,
    Minus,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
    pub token: Token,
    pub position: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Identifier(identifier) => write!(f, "'{identifier}'"),
            Token::Literal(value, _) => write!(f, "literal {value}"),
            Token::OpenParen => f.write_str("'('"),
            Token::CloseParen => f.write_str("')'"),
            Token::Comma => f.write_str("','"),
            Token::Slash => f.write_str("'/'"),
            Token::Minus => f.write_str("'-'"),
        }
    }
}

pub(super) fn tokenize(input: &str) -> Result<Vec<Spanned>, FilterParseError> {
    let mut tokens = vec![];
    let mut chars = input.char_indices().peekable();

    while let Some(&(position, c)) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '(' | ')' | ',' | '/' | '-' => {
                chars.next();
                match c {
                    '(' => Token::OpenParen,
                    ')' => Token::CloseParen,
                    ',' => Token::Comma,
                    '/' => Token::Slash,
                    _ => Token::Minus,
                }
            }
            '\'' => {
                let string = read_quoted(&mut chars)?;
                Token::Literal(EdmValue::String(string), EdmSimpleType::String)
            }
            c if c.is_ascii_digit() => read_number(&mut chars)?,
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_alphanumeric() || c == '_' || c == '.' {
                        word.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }

                match chars.peek() {
                    Some((_, '\'')) => {
                        let content = read_quoted(&mut chars)?;
                        typed_literal(&word, &content)?
                    }
                    _ => match word.as_str() {
                        "true" => Token::Literal(EdmValue::Boolean(true), EdmSimpleType::Boolean),
                        "false" => {
                            Token::Literal(EdmValue::Boolean(false), EdmSimpleType::Boolean)
                        }
                        "null" => Token::Literal(EdmValue::Null, EdmSimpleType::Null),
                        _ => Token::Identifier(word),
                    },
                }
            }
            _ => {
                return Err(FilterParseError::UnexpectedToken {
                    token: format!("'{c}'"),
                    position,
                });
            }
        };

        tokens.push(Spanned { token, position });
    }

    Ok(tokens)
}

fn take_digits(chars: &mut Peekable<CharIndices<'_>>, text: &mut String) {
    while let Some(&(_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        text.push(c);
        chars.next();
    }
}

/// Read a single-quoted string starting at the opening quote. A doubled quote stands for one.
fn read_quoted(chars: &mut Peekable<CharIndices<'_>>) -> Result<String, FilterParseError> {
    let start = match chars.next() {
        Some((position, _)) => position,
        None => return Err(FilterParseError::UnexpectedEnd),
    };

    let mut string = String::new();
    loop {
        match chars.next() {
            Some((_, '\'')) => {
                if let Some((_, '\'')) = chars.peek() {
                    chars.next();
                    string.push('\'');
                } else {
                    return Ok(string);
                }
            }
            Some((_, c)) => string.push(c),
            None => return Err(FilterParseError::UnterminatedString(start)),
        }
    }
}

fn read_number(chars: &mut Peekable<CharIndices<'_>>) -> Result<Token, FilterParseError> {
    let mut text = String::new();
    let mut fractional = false;
    let mut exponent = false;

    take_digits(chars, &mut text);
    if let Some((_, '.')) = chars.peek() {
        fractional = true;
        text.push('.');
        chars.next();
        take_digits(chars, &mut text);
    }
    if let Some((_, 'e' | 'E')) = chars.peek() {
        exponent = true;
        text.push('E');
        chars.next();
        if let Some(&(_, sign @ ('+' | '-'))) = chars.peek() {
            text.push(sign);
            chars.next();
        }
        take_digits(chars, &mut text);
    }

    let suffix = match chars.peek() {
        Some(&(_, c)) if matches!(c, 'L' | 'l' | 'M' | 'm' | 'D' | 'd' | 'F' | 'f') => {
            chars.next();
            Some(c.to_ascii_uppercase())
        }
        _ => None,
    };

    let invalid = |message: &str| FilterParseError::InvalidLiteral {
        literal: text.clone(),
        message: message.to_string(),
    };

    let (value, edm_type) = match suffix {
        Some('L') if fractional || exponent => return Err(invalid("Not an integer")),
        Some('L') => (
            EdmValue::Int64(i64::from_str(&text).map_err(|_| invalid("Out of range"))?),
            EdmSimpleType::Int64,
        ),
        Some('M') => (
            EdmValue::Decimal(BigDecimal::from_str(&text).map_err(|_| invalid("Not a decimal"))?),
            EdmSimpleType::Decimal,
        ),
        Some('D') => (
            EdmValue::Double(f64::from_str(&text).map_err(|_| invalid("Not a number"))?),
            EdmSimpleType::Double,
        ),
        Some(_) => (
            EdmValue::Single(f32::from_str(&text).map_err(|_| invalid("Not a number"))?),
            EdmSimpleType::Single,
        ),
        None if exponent => (
            EdmValue::Double(f64::from_str(&text).map_err(|_| invalid("Not a number"))?),
            EdmSimpleType::Double,
        ),
        None if fractional => (
            EdmValue::Decimal(BigDecimal::from_str(&text).map_err(|_| invalid("Not a decimal"))?),
            EdmSimpleType::Decimal,
        ),
        None => match i32::from_str(&text) {
            Ok(value) => (EdmValue::Int32(value), EdmSimpleType::Int32),
            Err(_) => (
                EdmValue::Int64(i64::from_str(&text).map_err(|_| invalid("Out of range"))?),
                EdmSimpleType::Int64,
            ),
        },
    };

    Ok(Token::Literal(value, edm_type))
}

fn typed_literal(prefix: &str, content: &str) -> Result<Token, FilterParseError> {
    let invalid = |message: String| FilterParseError::InvalidLiteral {
        literal: format!("{prefix}'{content}'"),
        message,
    };

    let (value, edm_type) = match prefix {
        "datetime" => (
            EdmValue::Calendar(parse_calendar(content).map_err(|e| invalid(e.to_string()))?),
            EdmSimpleType::DateTime,
        ),
        "datetimeoffset" => (
            EdmValue::Calendar(parse_calendar(content).map_err(|e| invalid(e.to_string()))?),
            EdmSimpleType::DateTimeOffset,
        ),
        "time" => (
            EdmValue::Calendar(parse_time(content).map_err(|e| invalid(e.to_string()))?),
            EdmSimpleType::Time,
        ),
        "guid" => (
            EdmValue::Guid(Uuid::parse_str(content).map_err(|e| invalid(e.to_string()))?),
            EdmSimpleType::Guid,
        ),
        "binary" | "X" | "x" => (
            EdmValue::Binary(decode_hex(content).ok_or_else(|| invalid("Not hexadecimal".into()))?),
            EdmSimpleType::Binary,
        ),
        _ => return Err(invalid(format!("Unknown literal prefix {prefix}"))),
    };

    Ok(Token::Literal(value, edm_type))
}

fn decode_hex(content: &str) -> Option<Vec<u8>> {
    if content.len() % 2 != 0 || !content.is_ascii() {
        return None;
    }

    (0..content.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&content[i..i + 2], 16).ok())
        .collect()
}
