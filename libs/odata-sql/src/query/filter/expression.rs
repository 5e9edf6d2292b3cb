// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::{EdmSimpleType, EdmValue};

/// A parsed `$filter` expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpression {
    Literal {
        value: EdmValue,
        edm_type: EdmSimpleType,
    },
    /// A property, possibly reached through navigation or complex properties (`Items/Name`)
    Member(Vec<String>),
    Binary {
        operator: BinaryOperator,
        left: Box<FilterExpression>,
        right: Box<FilterExpression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<FilterExpression>,
    },
    Method {
        method: MethodOperator,
        arguments: Vec<FilterExpression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOperator {
    StartsWith,
    EndsWith,
    SubstringOf,
    ToLower,
    ToUpper,
    Length,
    Concat,
    Trim,
}

/// Member access binds tighter than any operator.
pub const MEMBER_PRIORITY: u8 = 100;

impl BinaryOperator {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let operator = match keyword {
            "eq" => BinaryOperator::Eq,
            "ne" => BinaryOperator::Ne,
            "lt" => BinaryOperator::Lt,
            "le" => BinaryOperator::Le,
            "gt" => BinaryOperator::Gt,
            "ge" => BinaryOperator::Ge,
            "and" => BinaryOperator::And,
            "or" => BinaryOperator::Or,
            "add" => BinaryOperator::Add,
            "sub" => BinaryOperator::Sub,
            "mul" => BinaryOperator::Mul,
            "div" => BinaryOperator::Div,
            "mod" => BinaryOperator::Mod,
            _ => return None,
        };
        Some(operator)
    }

    pub fn priority(&self) -> u8 {
        match self {
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 60,
            BinaryOperator::Add | BinaryOperator::Sub => 50,
            BinaryOperator::Lt | BinaryOperator::Gt | BinaryOperator::Le | BinaryOperator::Ge => 40,
            BinaryOperator::Eq | BinaryOperator::Ne => 30,
            BinaryOperator::And => 20,
            BinaryOperator::Or => 10,
        }
    }

    /// `a op (b op c)` means the same as `a op b op c`
    pub fn is_associative(&self) -> bool {
        matches!(
            self,
            BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Add | BinaryOperator::Mul
        )
    }

    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Ne
                | BinaryOperator::Lt
                | BinaryOperator::Le
                | BinaryOperator::Gt
                | BinaryOperator::Ge
        )
    }
}

impl MethodOperator {
    pub fn from_name(name: &str) -> Option<Self> {
        let method = match name {
            "startswith" => MethodOperator::StartsWith,
            "endswith" => MethodOperator::EndsWith,
            "substringof" => MethodOperator::SubstringOf,
            "tolower" => MethodOperator::ToLower,
            "toupper" => MethodOperator::ToUpper,
            "length" => MethodOperator::Length,
            "concat" => MethodOperator::Concat,
            "trim" => MethodOperator::Trim,
            _ => return None,
        };
        Some(method)
    }

    pub fn name(&self) -> &'static str {
        match self {
            MethodOperator::StartsWith => "startswith",
            MethodOperator::EndsWith => "endswith",
            MethodOperator::SubstringOf => "substringof",
            MethodOperator::ToLower => "tolower",
            MethodOperator::ToUpper => "toupper",
            MethodOperator::Length => "length",
            MethodOperator::Concat => "concat",
            MethodOperator::Trim => "trim",
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            MethodOperator::StartsWith
            | MethodOperator::EndsWith
            | MethodOperator::SubstringOf
            | MethodOperator::Concat => 2,
            MethodOperator::ToLower
            | MethodOperator::ToUpper
            | MethodOperator::Length
            | MethodOperator::Trim => 1,
        }
    }

    /// Methods that evaluate to a boolean (and render as a `LIKE` predicate)
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            MethodOperator::StartsWith | MethodOperator::EndsWith | MethodOperator::SubstringOf
        )
    }
}

impl FilterExpression {
    pub fn literal(value: EdmValue) -> Self {
        let edm_type = value.natural_type();
        FilterExpression::Literal { value, edm_type }
    }

    pub fn member(path: &[&str]) -> Self {
        FilterExpression::Member(path.iter().map(|s| s.to_string()).collect())
    }

    pub fn binary(operator: BinaryOperator, left: FilterExpression, right: FilterExpression) -> Self {
        FilterExpression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(operator: UnaryOperator, operand: FilterExpression) -> Self {
        FilterExpression::Unary {
            operator,
            operand: Box::new(operand),
        }
    }
}
