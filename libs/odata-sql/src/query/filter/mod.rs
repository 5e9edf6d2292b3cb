// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The `$filter` expression language: a tokenizer and a precedence-climbing parser producing a
//! [`FilterExpression`] tree.

mod expression;
mod lexer;
mod parser;

use thiserror::Error;

pub use expression::{
    BinaryOperator, FilterExpression, MEMBER_PRIORITY, MethodOperator, UnaryOperator,
};
pub use parser::{parse_filter, parse_literal};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterParseError {
    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Unexpected {token} at position {position}")]
    UnexpectedToken { token: String, position: usize },

    #[error("Unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Invalid literal {literal}: {message}")]
    InvalidLiteral { literal: String, message: String },

    #[error("Unknown method {0}")]
    UnknownMethod(String),

    #[error("{method} expects {expected} argument(s), found {found}")]
    WrongArity {
        method: &'static str,
        expected: usize,
        found: usize,
    },
}
