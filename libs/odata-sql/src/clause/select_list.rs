// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::AggregateFunction;

use crate::{
    SQLContext,
    context::is_quoted,
    sql::{ExpressionBuilder, SQLBuilder, SQLParam},
};

/// One entry of the select list.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    /// `<alias>.<column> AS "<column>_<alias>"`
    Column { alias: String, column: String },
    /// `<function>(<alias>.<column>) AS "<column>_<alias>"`, grouped by the plain columns
    Aggregate {
        function: AggregateFunction,
        alias: String,
        column: String,
    },
    /// A calculation-view parameter echoed back as a column: `? AS <name>_<alias>`
    Parameter {
        name: String,
        alias: String,
        param: SQLParam,
    },
    Count,
}

impl SelectItem {
    pub fn column(alias: impl Into<String>, column: impl Into<String>) -> Self {
        SelectItem::Column {
            alias: alias.into(),
            column: column.into(),
        }
    }

    pub fn aggregate(
        function: AggregateFunction,
        alias: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        SelectItem::Aggregate {
            function,
            alias: alias.into(),
            column: column.into(),
        }
    }

    /// The name the result column is read back by
    pub fn label(&self) -> Option<String> {
        match self {
            SelectItem::Column { alias, column } | SelectItem::Aggregate { alias, column, .. } => {
                Some(column_label(column, alias))
            }
            SelectItem::Parameter { name, alias, .. } => Some(parameter_label(name, alias)),
            SelectItem::Count => None,
        }
    }
}

fn column_label(column: &str, alias: &str) -> String {
    let column = if is_quoted(column) {
        &column[1..column.len() - 1]
    } else {
        column
    };
    format!("{column}_{alias}")
}

fn parameter_label(name: &str, alias: &str) -> String {
    format!("{name}_{alias}")
}

impl ExpressionBuilder for SelectItem {
    fn build(&self, _context: &SQLContext, builder: &mut SQLBuilder) {
        match self {
            SelectItem::Column { alias, column } => {
                builder.push_column(alias, column);
                builder.push_str(" AS \"");
                builder.push_str(column_label(column, alias));
                builder.push('"');
            }
            SelectItem::Aggregate {
                function,
                alias,
                column,
            } => {
                builder.push_str(function.sql_name());
                builder.push('(');
                builder.push_column(alias, column);
                builder.push_str(") AS \"");
                builder.push_str(column_label(column, alias));
                builder.push('"');
            }
            SelectItem::Parameter { name, alias, param } => {
                builder.push_param(param.clone());
                builder.push_str(" AS ");
                builder.push_str(parameter_label(name, alias));
            }
            SelectItem::Count => builder.push_str("COUNT(*)"),
        }
    }
}

/// The select list in output order. A column is listed once even when several options ask for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectList {
    items: Vec<SelectItem>,
}

impl SelectList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count() -> Self {
        Self {
            items: vec![SelectItem::Count],
        }
    }

    pub fn push(&mut self, item: SelectItem) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    pub fn is_count(&self) -> bool {
        self.items.contains(&SelectItem::Count)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_aggregates(&self) -> bool {
        self.items
            .iter()
            .any(|item| matches!(item, SelectItem::Aggregate { .. }))
    }

    /// The plain columns listed next to the aggregates, in select order
    pub fn grouping_columns(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match item {
            SelectItem::Column { alias, column } => Some((alias.as_str(), column.as_str())),
            _ => None,
        })
    }
}

impl ExpressionBuilder for SelectList {
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        builder.push_elems(context, &self.items, ", ");
    }
}
