// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::{EdmSimpleType, EdmValue, EntityTypeBinding};

use super::{JoinScope, SQLExpression};
use crate::{
    ODataSqlError, SQLContext,
    query::filter::{BinaryOperator, FilterExpression, MethodOperator, UnaryOperator},
    sql::{ExpressionBuilder, SQLBuilder, SQLParam},
};

/// The condition of a `WHERE` clause, built up by AND-ing conditions one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WhereClause {
    condition: Option<SQLExpression>,
}

impl WhereClause {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.condition.is_none()
    }

    pub fn condition(&self) -> Option<&SQLExpression> {
        self.condition.as_ref()
    }

    /// AND `condition` to what is there. An `OR` on either side ends up in parentheses.
    pub fn and(&mut self, condition: SQLExpression) {
        self.condition = Some(SQLExpression::and(self.condition.take(), condition));
    }
}

impl ExpressionBuilder for WhereClause {
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        if let Some(condition) = &self.condition {
            condition.build(context, builder);
        }
    }
}

/// A translated operand and what is known about its type
struct Typed {
    expression: SQLExpression,
    /// The type of a property (or a function over one); `None` for literals
    edm_type: Option<EdmSimpleType>,
}

impl Typed {
    fn untyped(expression: SQLExpression) -> Self {
        Self {
            expression,
            edm_type: None,
        }
    }

    /// Bind a literal parameter as `edm_type`, so that it matches the column it is compared with
    fn coerce(self, edm_type: Option<EdmSimpleType>) -> Result<Self, ODataSqlError> {
        match (self.expression, edm_type) {
            (SQLExpression::Param(param), Some(edm_type)) if self.edm_type.is_none() => Ok(Self {
                expression: SQLExpression::Param(SQLParam::coerced(&param.value, edm_type)?),
                edm_type: None,
            }),
            (expression, _) => Ok(Self {
                expression,
                edm_type: self.edm_type,
            }),
        }
    }
}

/// Translates a `$filter` tree into an [`SQLExpression`] over the aliases of `scope`, joining
/// whatever the member paths navigate to.
pub struct FilterTranslator<'s, 'a> {
    scope: &'s mut JoinScope<'a>,
    target: &'a EntityTypeBinding,
}

impl<'s, 'a> FilterTranslator<'s, 'a> {
    pub fn new(scope: &'s mut JoinScope<'a>, target: &'a EntityTypeBinding) -> Self {
        Self { scope, target }
    }

    pub fn translate(&mut self, filter: &FilterExpression) -> Result<SQLExpression, ODataSqlError> {
        Ok(self.translate_typed(filter)?.expression)
    }

    fn translate_typed(&mut self, filter: &FilterExpression) -> Result<Typed, ODataSqlError> {
        match filter {
            FilterExpression::Literal { value, edm_type } => Ok(Typed::untyped(match value {
                EdmValue::Null => SQLExpression::Null,
                _ => SQLExpression::Param(SQLParam::new(value.clone(), *edm_type)),
            })),
            FilterExpression::Member(path) => {
                let column = self.scope.resolve(self.target, path)?;
                Ok(Typed {
                    expression: SQLExpression::column(column.alias, column.column),
                    edm_type: Some(column.edm_type),
                })
            }
            FilterExpression::Binary {
                operator,
                left,
                right,
            } => self.translate_binary(*operator, left, right),
            FilterExpression::Unary { operator, operand } => {
                let operand = self.translate_typed(operand)?;
                Ok(match operator {
                    UnaryOperator::Not => Typed::untyped(SQLExpression::Not(Box::new(
                        operand.expression,
                    ))),
                    UnaryOperator::Minus => Typed {
                        expression: SQLExpression::Negate(Box::new(operand.expression)),
                        edm_type: operand.edm_type,
                    },
                })
            }
            FilterExpression::Method { method, arguments } => {
                self.translate_method(*method, arguments)
            }
        }
    }

    fn translate_binary(
        &mut self,
        operator: BinaryOperator,
        left: &FilterExpression,
        right: &FilterExpression,
    ) -> Result<Typed, ODataSqlError> {
        // `startswith(Name, 'a') eq true` is the predicate itself
        if let Some(predicate) = boolean_comparison(operator, left, right) {
            let (method_call, expected) = predicate;
            let expression = self.translate(method_call)?;
            return Ok(Typed::untyped(if expected {
                expression
            } else {
                SQLExpression::Not(Box::new(expression))
            }));
        }

        let left = self.translate_typed(left)?;
        let right = self.translate_typed(right)?;

        let (left, right) = if operator == BinaryOperator::And || operator == BinaryOperator::Or {
            (left, right)
        } else {
            let left_type = left.edm_type;
            let right = right.coerce(left_type)?;
            let left = left.coerce(right.edm_type)?;
            (left, right)
        };

        let edm_type = if operator.is_comparison() {
            None
        } else {
            left.edm_type.or(right.edm_type)
        };

        Ok(Typed {
            expression: SQLExpression::binary(operator, left.expression, right.expression),
            edm_type,
        })
    }

    fn translate_method(
        &mut self,
        method: MethodOperator,
        arguments: &[FilterExpression],
    ) -> Result<Typed, ODataSqlError> {
        let function = |name: &'static str, arguments: Vec<SQLExpression>, edm_type| Typed {
            expression: SQLExpression::Function { name, arguments },
            edm_type: Some(edm_type),
        };

        match (method, arguments) {
            (MethodOperator::StartsWith, [operand, pattern]) => {
                self.like(operand, pattern, "Invalid startswith usage", |v| format!("{v}%"))
            }
            (MethodOperator::EndsWith, [operand, pattern]) => {
                self.like(operand, pattern, "Invalid like syntax", |v| format!("%{v}"))
            }
            (MethodOperator::SubstringOf, [pattern, operand]) => {
                self.like(operand, pattern, "Invalid like syntax", |v| format!("%{v}%"))
            }
            (MethodOperator::ToLower, [operand]) => {
                let operand = self.translate(operand)?;
                Ok(function("LOWER", vec![operand], EdmSimpleType::String))
            }
            (MethodOperator::ToUpper, [operand]) => {
                let operand = self.translate(operand)?;
                Ok(function("UPPER", vec![operand], EdmSimpleType::String))
            }
            (MethodOperator::Trim, [operand]) => {
                let operand = self.translate(operand)?;
                Ok(function("TRIM", vec![operand], EdmSimpleType::String))
            }
            (MethodOperator::Length, [operand]) => {
                let operand = self.translate(operand)?;
                Ok(function("LENGTH", vec![operand], EdmSimpleType::Int32))
            }
            (MethodOperator::Concat, [first, second]) => {
                let first = self.translate(first)?;
                let second = self.translate(second)?;
                Ok(function("CONCAT", vec![first, second], EdmSimpleType::String))
            }
            _ => Err(ODataSqlError::InvalidFilter(format!(
                "Wrong number of arguments for {}",
                method.name()
            ))),
        }
    }

    /// `<operand> LIKE ?`, where the operand must be a property and the pattern a literal
    fn like(
        &mut self,
        operand: &FilterExpression,
        pattern: &FilterExpression,
        usage_error: &str,
        to_pattern: impl Fn(&str) -> String,
    ) -> Result<Typed, ODataSqlError> {
        let invalid = || ODataSqlError::InvalidFilter(usage_error.to_string());

        let operand = match operand {
            FilterExpression::Member(_) => self.translate(operand)?,
            _ => return Err(invalid()),
        };
        let pattern = match pattern {
            FilterExpression::Literal {
                value: EdmValue::String(value),
                ..
            } => to_pattern(value),
            FilterExpression::Literal { value, .. } if !value.is_null() => {
                to_pattern(&value.to_string())
            }
            _ => return Err(invalid()),
        };

        Ok(Typed::untyped(SQLExpression::Like {
            operand: Box::new(operand),
            pattern: SQLParam::new(EdmValue::String(pattern), EdmSimpleType::String),
        }))
    }
}

/// For `<predicate method> eq|ne <boolean literal>` (either way round), the method call and
/// whether the comparison holds when the method does
fn boolean_comparison<'f>(
    operator: BinaryOperator,
    left: &'f FilterExpression,
    right: &'f FilterExpression,
) -> Option<(&'f FilterExpression, bool)> {
    let is_predicate = |expression: &FilterExpression| {
        matches!(expression, FilterExpression::Method { method, .. } if method.is_predicate())
    };
    let boolean = |expression: &FilterExpression| match expression {
        FilterExpression::Literal {
            value: EdmValue::Boolean(value),
            ..
        } => Some(*value),
        _ => None,
    };

    let (method_call, value) = match (is_predicate(left), is_predicate(right)) {
        (true, _) => (left, boolean(right)?),
        (_, true) => (right, boolean(left)?),
        _ => return None,
    };

    match operator {
        BinaryOperator::Eq => Some((method_call, value)),
        BinaryOperator::Ne => Some((method_call, !value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseProduct, query::filter::parse_filter, test_util::TestSetup};
    use edm_binding::EdmTableBindingProvider;
    use multiplatform_test::multiplatform_test;

    fn translate(
        bindings: &dyn EdmTableBindingProvider,
        entity_set: &str,
        filter: &str,
    ) -> Result<(String, Vec<SQLParam>), ODataSqlError> {
        let target = bindings.entity_set(entity_set)?;
        let mut scope = JoinScope::new(bindings, target);
        let expression =
            FilterTranslator::new(&mut scope, target).translate(&parse_filter(filter)?)?;
        Ok(expression.to_sql(&SQLContext::new(DatabaseProduct::H2)))
    }

    #[multiplatform_test]
    fn parentheses_follow_operator_priority() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let mpl = "MessageProcessingLogs";

            assert_binding!(
                translate(
                    &bindings,
                    mpl,
                    "Status eq 'ERROR' and ( Sender eq 'From' and Receiver eq 'To' ) and Status eq 'RETRY'"
                )
                .unwrap(),
                "T0.STATUS = ? AND T0.SENDER = ? AND T0.RECEIVER = ? AND T0.STATUS = ?",
                "ERROR",
                "From",
                "To",
                "RETRY"
            );
            assert_binding!(
                translate(
                    &bindings,
                    mpl,
                    "Status eq 'ERROR' or ( Sender eq 'From' and Receiver eq 'To' ) or Status eq 'RETRY'"
                )
                .unwrap(),
                "T0.STATUS = ? OR T0.SENDER = ? AND T0.RECEIVER = ? OR T0.STATUS = ?",
                "ERROR",
                "From",
                "To",
                "RETRY"
            );
            assert_binding!(
                translate(
                    &bindings,
                    mpl,
                    "(Status eq 'ERROR' or Sender eq 'From') and (Receiver eq 'To' or Status eq 'RETRY')"
                )
                .unwrap(),
                "(T0.STATUS = ? OR T0.SENDER = ?) AND (T0.RECEIVER = ? OR T0.STATUS = ?)",
                "ERROR",
                "From",
                "To",
                "RETRY"
            );
        });
    }

    #[multiplatform_test]
    fn not_wraps_compound_operands() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let mpl = "MessageProcessingLogs";

            assert_binding!(
                translate(
                    &bindings,
                    mpl,
                    "(not (Status eq 'ERROR') or Sender eq 'From') and not (Receiver eq 'To') or Status eq 'RETRY'"
                )
                .unwrap(),
                "(NOT(T0.STATUS = ?) OR T0.SENDER = ?) AND NOT(T0.RECEIVER = ?) OR T0.STATUS = ?",
                "ERROR",
                "From",
                "To",
                "RETRY"
            );
            assert_binding!(
                translate(
                    &bindings,
                    mpl,
                    "(Status eq 'ERROR' or not (Sender eq 'From')) and not (Receiver eq 'To' or Status eq 'RETRY')"
                )
                .unwrap(),
                "(T0.STATUS = ? OR NOT(T0.SENDER = ?)) AND NOT(T0.RECEIVER = ? OR T0.STATUS = ?)",
                "ERROR",
                "From",
                "To",
                "RETRY"
            );
        });
    }

    #[multiplatform_test]
    fn string_functions() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let mpl = "MessageProcessingLogs";

            assert_binding!(
                translate(&bindings, mpl, "toupper(MessageGuid) eq tolower(MessageGuid)").unwrap(),
                "UPPER(T0.MESSAGEGUID) = LOWER(T0.MESSAGEGUID)"
            );
            assert_binding!(
                translate(&bindings, mpl, "concat(MessageGuid, 'test') eq 'abctest'").unwrap(),
                "CONCAT(T0.MESSAGEGUID,?) = ?",
                "test",
                "abctest"
            );
            assert_binding!(
                translate(&bindings, mpl, "length(trim(Sender)) gt 3").unwrap(),
                "LENGTH(TRIM(T0.SENDER)) > ?",
                3
            );
        });
    }

    #[multiplatform_test]
    fn like_patterns() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let mpl = "MessageProcessingLogs";

            assert_binding!(
                translate(
                    &bindings,
                    mpl,
                    "startswith(Sender, 'Jo') and endswith(Receiver, 'ne') or substringof('mid', Status) eq false"
                )
                .unwrap(),
                "T0.SENDER LIKE ? AND T0.RECEIVER LIKE ? OR NOT(T0.STATUS LIKE ?)",
                "Jo%",
                "%ne",
                "%mid%"
            );

            let error = translate(&bindings, mpl, "startswith('Jo', Sender)").unwrap_err();
            assert_eq!(error.to_string(), "Invalid startswith usage");

            let error = translate(&bindings, mpl, "endswith(toupper(Sender), 'X')").unwrap_err();
            assert_eq!(error.to_string(), "Invalid like syntax");
        });
    }

    #[multiplatform_test]
    fn literals_take_the_property_type() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let (sql, params) =
                translate(&bindings, "Entities4", "Id4_1 eq '11' and Id4_2 ne null").unwrap();

            assert_eq!(sql, "T0.ID4_1 = ? AND T0.ID4_2 IS NOT NULL");
            assert_eq!(params[0].value, EdmValue::Int32(11));
            assert_eq!(params[0].edm_type, EdmSimpleType::Int32);

            let error = translate(&bindings, "Entities4", "Id4_1 eq 'eleven'").unwrap_err();
            assert_eq!(error.to_string(), "Could not parse eleven as an integer");
        });
    }

    #[multiplatform_test]
    fn arithmetic_and_navigation() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            assert_binding!(
                translate(&bindings, "Items", "Order/Total sub (Quantity mul 2) ge -5").unwrap(),
                "T1.TOTAL - T0.QUANTITY * ? >= ?",
                2,
                -5i64
            );
        });
    }
}
