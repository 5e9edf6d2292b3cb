// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::EdmValue;

use super::{
    BinaryOperator, FilterExpression, FilterParseError, MethodOperator, UnaryOperator,
    lexer::{Spanned, Token, tokenize},
};

/// Parse a `$filter` value into an expression tree.
///
/// Binary operators are parsed by precedence climbing, left-associative within one priority
/// level. `not` and unary `-` apply to the immediately following operand, so `not (a eq b)` needs
/// its parentheses.
pub fn parse_filter(input: &str) -> Result<FilterExpression, FilterParseError> {
    let mut parser = Parser::new(tokenize(input)?);
    let expression = parser.parse_expression(0)?;
    parser.expect_end()?;
    Ok(expression)
}

/// Parse a single literal, as found in a key predicate (`11`, `'Ben'`, `-1.5d`, `guid'...'`).
pub fn parse_literal(input: &str) -> Result<FilterExpression, FilterParseError> {
    let mut parser = Parser::new(tokenize(input)?);
    let literal = match parser.parse_unary()? {
        literal @ FilterExpression::Literal { .. } => literal,
        _ => {
            return Err(FilterParseError::InvalidLiteral {
                literal: input.to_string(),
                message: "Not a literal".to_string(),
            });
        }
    };
    parser.expect_end()?;
    Ok(literal)
}

struct Parser {
    tokens: Vec<Spanned>,
    position: usize,
}

impl Parser {
    fn new(tokens: Vec<Spanned>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position).map(|spanned| &spanned.token)
    }

    fn next(&mut self) -> Result<Spanned, FilterParseError> {
        let spanned = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(FilterParseError::UnexpectedEnd)?;
        self.position += 1;
        Ok(spanned)
    }

    fn expect(&mut self, expected: Token) -> Result<(), FilterParseError> {
        let spanned = self.next()?;
        if spanned.token == expected {
            Ok(())
        } else {
            Err(unexpected(spanned))
        }
    }

    fn expect_end(&self) -> Result<(), FilterParseError> {
        match self.tokens.get(self.position) {
            Some(spanned) => Err(unexpected(spanned.clone())),
            None => Ok(()),
        }
    }

    fn peek_binary_operator(&self) -> Option<BinaryOperator> {
        match self.peek() {
            Some(Token::Identifier(keyword)) => BinaryOperator::from_keyword(keyword),
            _ => None,
        }
    }

    fn parse_expression(&mut self, min_priority: u8) -> Result<FilterExpression, FilterParseError> {
        let mut left = self.parse_unary()?;

        while let Some(operator) = self.peek_binary_operator() {
            let priority = operator.priority();
            if priority < min_priority {
                break;
            }
            self.position += 1;

            let right = self.parse_expression(priority + 1)?;
            left = FilterExpression::binary(operator, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<FilterExpression, FilterParseError> {
        match self.peek() {
            Some(Token::Identifier(keyword)) if keyword == "not" => {
                self.position += 1;
                let operand = self.parse_unary()?;
                Ok(FilterExpression::unary(UnaryOperator::Not, operand))
            }
            Some(Token::Minus) => {
                self.position += 1;
                match self.parse_unary()? {
                    FilterExpression::Literal { value, edm_type } if edm_type.is_numeric() => {
                        Ok(FilterExpression::Literal {
                            value: negate(value)?,
                            edm_type,
                        })
                    }
                    operand => Ok(FilterExpression::unary(UnaryOperator::Minus, operand)),
                }
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<FilterExpression, FilterParseError> {
        let spanned = self.next()?;

        match spanned.token {
            Token::Literal(value, edm_type) => Ok(FilterExpression::Literal { value, edm_type }),
            Token::OpenParen => {
                let expression = self.parse_expression(0)?;
                self.expect(Token::CloseParen)?;
                Ok(expression)
            }
            Token::Identifier(name) if self.peek() == Some(&Token::OpenParen) => {
                self.position += 1;
                self.parse_method(name)
            }
            Token::Identifier(name) => {
                let mut path = vec![name];
                while self.peek() == Some(&Token::Slash) {
                    self.position += 1;
                    match self.next()? {
                        Spanned {
                            token: Token::Identifier(segment),
                            ..
                        } => path.push(segment),
                        other => return Err(unexpected(other)),
                    }
                }
                Ok(FilterExpression::Member(path))
            }
            _ => Err(unexpected(spanned)),
        }
    }

    /// Parse the arguments of a method call; the opening parenthesis is already consumed.
    fn parse_method(&mut self, name: String) -> Result<FilterExpression, FilterParseError> {
        let method = MethodOperator::from_name(&name)
            .ok_or_else(|| FilterParseError::UnknownMethod(name.clone()))?;

        let mut arguments = vec![];
        if self.peek() == Some(&Token::CloseParen) {
            self.position += 1;
        } else {
            loop {
                arguments.push(self.parse_expression(0)?);
                let spanned = self.next()?;
                match spanned.token {
                    Token::Comma => continue,
                    Token::CloseParen => break,
                    _ => return Err(unexpected(spanned)),
                }
            }
        }

        if arguments.len() != method.arity() {
            return Err(FilterParseError::WrongArity {
                method: method.name(),
                expected: method.arity(),
                found: arguments.len(),
            });
        }

        Ok(FilterExpression::Method { method, arguments })
    }
}

fn unexpected(spanned: Spanned) -> FilterParseError {
    FilterParseError::UnexpectedToken {
        token: spanned.token.to_string(),
        position: spanned.position,
    }
}

fn negate(value: EdmValue) -> Result<EdmValue, FilterParseError> {
    let negated = match &value {
        EdmValue::Byte(v) => Some(EdmValue::Int16(-(*v as i16))),
        EdmValue::SByte(v) => v.checked_neg().map(EdmValue::SByte),
        EdmValue::Int16(v) => v.checked_neg().map(EdmValue::Int16),
        EdmValue::Int32(v) => v.checked_neg().map(EdmValue::Int32),
        EdmValue::Int64(v) => v.checked_neg().map(EdmValue::Int64),
        EdmValue::Single(v) => Some(EdmValue::Single(-v)),
        EdmValue::Double(v) => Some(EdmValue::Double(-v)),
        EdmValue::Decimal(v) => Some(EdmValue::Decimal(-v.clone())),
        _ => Some(value.clone()),
    };

    negated.ok_or_else(|| FilterParseError::InvalidLiteral {
        literal: format!("-{value}"),
        message: "Out of range".to_string(),
    })
}
