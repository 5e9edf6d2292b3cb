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
    query::Ordering,
    sql::{ExpressionBuilder, SQLBuilder},
};

#[derive(Debug, Clone, PartialEq)]
pub enum OrderByTarget {
    Column { alias: String, column: String },
    /// A select-list label, such as the echo column of a calculation-view parameter
    Label(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: OrderByTarget,
    pub ordering: Ordering,
}

impl OrderByElement {
    pub fn column(alias: impl Into<String>, column: impl Into<String>, ordering: Ordering) -> Self {
        Self {
            target: OrderByTarget::Column {
                alias: alias.into(),
                column: column.into(),
            },
            ordering,
        }
    }

    pub fn label(label: impl Into<String>, ordering: Ordering) -> Self {
        Self {
            target: OrderByTarget::Label(label.into()),
            ordering,
        }
    }
}

impl ExpressionBuilder for OrderByElement {
    fn build(&self, _context: &SQLContext, builder: &mut SQLBuilder) {
        match &self.target {
            OrderByTarget::Column { alias, column } => builder.push_column(alias, column),
            OrderByTarget::Label(label) => builder.push_str(label),
        }
        builder.push_space();

        if self.ordering == Ordering::Asc {
            builder.push_str("ASC");
        } else {
            builder.push_str("DESC");
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy(pub Vec<OrderByElement>);

impl OrderBy {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append `element` unless the same target is already ordered on
    pub fn push(&mut self, element: OrderByElement) {
        if !self.0.iter().any(|existing| existing.target == element.target) {
            self.0.push(element);
        }
    }
}

impl ExpressionBuilder for OrderBy {
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        builder.push_str("ORDER BY ");
        builder.push_elems(context, &self.0, ", ");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DatabaseProduct;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn labels_then_columns() {
        let mut order_by = OrderBy::default();
        order_by.push(OrderByElement::label("CurrentEmployeeId_T0", Ordering::Asc));
        order_by.push(OrderByElement::column("T0", "ID", Ordering::Asc));
        order_by.push(OrderByElement::column("T0", "ID", Ordering::Desc));
        order_by.push(OrderByElement::column("T1", "NAME", Ordering::Desc));

        assert_binding!(
            order_by.to_sql(&SQLContext::new(DatabaseProduct::Hana).with_case_sensitive(true)),
            r#"ORDER BY CurrentEmployeeId_T0 ASC, "T0"."ID" ASC, "T1"."NAME" DESC"#
        );
    }
}
