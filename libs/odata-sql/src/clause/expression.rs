// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    SQLContext,
    query::filter::BinaryOperator,
    sql::{ExpressionBuilder, SQLBuilder, SQLParam},
};

/// An SQL scalar or boolean expression over aliased columns and parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum SQLExpression {
    Column {
        alias: String,
        column: String,
    },
    Param(SQLParam),
    Null,
    Binary {
        operator: BinaryOperator,
        left: Box<SQLExpression>,
        right: Box<SQLExpression>,
    },
    Not(Box<SQLExpression>),
    Negate(Box<SQLExpression>),
    Function {
        name: &'static str,
        arguments: Vec<SQLExpression>,
    },
    Like {
        operand: Box<SQLExpression>,
        pattern: SQLParam,
    },
    In {
        operand: Box<SQLExpression>,
        values: Vec<SQLParam>,
    },
}

impl SQLExpression {
    pub fn column(alias: impl Into<String>, column: impl Into<String>) -> Self {
        SQLExpression::Column {
            alias: alias.into(),
            column: column.into(),
        }
    }

    pub fn binary(operator: BinaryOperator, left: SQLExpression, right: SQLExpression) -> Self {
        SQLExpression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn eq(left: SQLExpression, right: SQLExpression) -> Self {
        Self::binary(BinaryOperator::Eq, left, right)
    }

    /// `left AND right`, where either side may be absent
    pub fn and(left: Option<SQLExpression>, right: SQLExpression) -> Self {
        match left {
            Some(left) => Self::binary(BinaryOperator::And, left, right),
            None => right,
        }
    }

    /// AND all conditions together, left to right
    pub fn conjunction(conditions: impl IntoIterator<Item = SQLExpression>) -> Option<Self> {
        conditions
            .into_iter()
            .fold(None, |acc, condition| Some(Self::and(acc, condition)))
    }

    fn is_compound(&self) -> bool {
        matches!(
            self,
            SQLExpression::Binary { .. }
                | SQLExpression::Not(_)
                | SQLExpression::Negate(_)
                | SQLExpression::Like { .. }
                | SQLExpression::In { .. }
        )
    }
}

fn operator_sql(operator: BinaryOperator) -> &'static str {
    match operator {
        BinaryOperator::Eq => "=",
        BinaryOperator::Ne => "<>",
        BinaryOperator::Lt => "<",
        BinaryOperator::Le => "<=",
        BinaryOperator::Gt => ">",
        BinaryOperator::Ge => ">=",
        BinaryOperator::And => "AND",
        BinaryOperator::Or => "OR",
        BinaryOperator::Add => "+",
        BinaryOperator::Sub => "-",
        BinaryOperator::Mul => "*",
        BinaryOperator::Div => "/",
        BinaryOperator::Mod => "%",
    }
}

impl ExpressionBuilder for SQLExpression {
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        match self {
            SQLExpression::Column { alias, column } => builder.push_column(alias, column),
            SQLExpression::Param(param) => builder.push_param(param.clone()),
            SQLExpression::Null => builder.push_str("NULL"),
            SQLExpression::Binary {
                operator: operator @ (BinaryOperator::Eq | BinaryOperator::Ne),
                left,
                right,
            } if **left == SQLExpression::Null || **right == SQLExpression::Null => {
                let operand = if **right == SQLExpression::Null {
                    left
                } else {
                    right
                };
                build_operand(operand, *operator, false, context, builder);
                if *operator == BinaryOperator::Eq {
                    builder.push_str(" IS NULL");
                } else {
                    builder.push_str(" IS NOT NULL");
                }
            }
            SQLExpression::Binary {
                operator,
                left,
                right,
            } => {
                build_operand(left, *operator, false, context, builder);
                builder.push_space();
                builder.push_str(operator_sql(*operator));
                builder.push_space();
                build_operand(right, *operator, true, context, builder);
            }
            SQLExpression::Not(operand) => {
                if operand.is_compound() {
                    builder.push_str("NOT(");
                    operand.build(context, builder);
                    builder.push(')');
                } else {
                    builder.push_str("NOT ");
                    operand.build(context, builder);
                }
            }
            SQLExpression::Negate(operand) => {
                builder.push('-');
                if operand.is_compound() {
                    builder.push('(');
                    operand.build(context, builder);
                    builder.push(')');
                } else {
                    operand.build(context, builder);
                }
            }
            SQLExpression::Function { name, arguments } => {
                builder.push_str(name);
                builder.push('(');
                builder.push_elems(context, arguments, ",");
                builder.push(')');
            }
            SQLExpression::Like { operand, pattern } => {
                operand.build(context, builder);
                builder.push_str(" LIKE ");
                builder.push_param(pattern.clone());
            }
            SQLExpression::In { operand, values } => {
                operand.build(context, builder);
                builder.push_str(" IN (");
                builder.push_iter(values.iter(), ",", |builder, value| {
                    builder.push_param(value.clone())
                });
                builder.push(')');
            }
        }
    }
}

/// Build an operand of `parent`, in parentheses when it binds weaker than `parent`. A right
/// operand of equal priority is parenthesized too, unless regrouping would not change its value
/// (`a AND (b AND c)`).
fn build_operand(
    operand: &SQLExpression,
    parent: BinaryOperator,
    right: bool,
    context: &SQLContext,
    builder: &mut SQLBuilder,
) {
    let parenthesize = match operand {
        SQLExpression::Binary { operator, .. } => {
            parent.priority() > operator.priority()
                || (right
                    && parent.priority() == operator.priority()
                    && !(parent == *operator && parent.is_associative()))
        }
        _ => false,
    };

    if parenthesize {
        builder.push('(');
        operand.build(context, builder);
        builder.push(')');
    } else {
        operand.build(context, builder);
    }
}
