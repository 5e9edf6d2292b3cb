// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use super::{SQLBuilder, SQLParam};
use crate::SQLContext;

/// A trait for types that can build themselves into an SQL expression.
///
/// Each constituent of a statement (column, select list, join, predicate, etc.) implements this
/// trait, so a whole statement is rendered by building its parts, in order, into one
/// [`SQLBuilder`]. Parameters are collected in the order their placeholders appear.
pub trait ExpressionBuilder {
    /// Build the SQL expression into the given SQL builder
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder);

    /// Build the SQL expression into a string and return it along with its parameters. Mostly
    /// useful for testing and debugging.
    fn to_sql(&self, context: &SQLContext) -> (String, Vec<SQLParam>)
    where
        Self: Sized,
    {
        let mut builder = SQLBuilder::new(context);
        self.build(context, &mut builder);
        builder.into_sql()
    }
}

impl<T> ExpressionBuilder for Box<T>
where
    T: ExpressionBuilder,
{
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        self.as_ref().build(context, builder)
    }
}

impl<T> ExpressionBuilder for &T
where
    T: ExpressionBuilder,
{
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        (**self).build(context, builder)
    }
}
