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
    sql::{ExpressionBuilder, SQLBuilder},
};

use super::SelectList;

/// `GROUP BY` over the plain columns of a select list that carries aggregates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupBy(Vec<(String, String)>);

impl GroupBy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group by every non-aggregated column of `select`. Empty unless `select` aggregates.
    pub fn from_select(select: &SelectList) -> Self {
        if !select.has_aggregates() {
            return Self::new();
        }

        Self(
            select
                .grouping_columns()
                .map(|(alias, column)| (alias.to_string(), column.to_string()))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl ExpressionBuilder for GroupBy {
    fn build(&self, _context: &SQLContext, builder: &mut SQLBuilder) {
        builder.push_str("GROUP BY ");
        for (index, (alias, column)) in self.0.iter().enumerate() {
            if index > 0 {
                builder.push_str(", ");
            }
            builder.push_column(alias, column);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseProduct, clause::SelectItem};
    use edm_binding::AggregateFunction;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn groups_by_plain_columns() {
        let mut select = SelectList::new();
        select.push(SelectItem::column("T0", "REGION"));
        select.push(SelectItem::aggregate(AggregateFunction::Sum, "T0", "NUMBER"));
        select.push(SelectItem::column("T0", "ID"));

        assert_binding!(
            GroupBy::from_select(&select).to_sql(&SQLContext::new(DatabaseProduct::H2)),
            "GROUP BY T0.REGION, T0.ID"
        );
        assert_binding!(
            GroupBy::from_select(&select)
                .to_sql(&SQLContext::new(DatabaseProduct::Hana).with_case_sensitive(true)),
            r#"GROUP BY "T0"."REGION", "T0"."ID""#
        );
    }

    #[multiplatform_test]
    fn nothing_to_group_without_aggregates() {
        let mut select = SelectList::new();
        select.push(SelectItem::column("T0", "REGION"));

        assert!(GroupBy::from_select(&select).is_empty());
    }
}
