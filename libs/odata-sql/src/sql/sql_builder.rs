// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{SQLContext, context::is_quoted};

use super::{ExpressionBuilder, SQLParam};

pub struct SQLBuilder {
    /// The SQL being built with a `?` placeholder for each parameter
    sql: String,
    /// The list of parameters
    params: Vec<SQLParam>,
    /// Quote identifiers (case-sensitive mode)
    quote_identifiers: bool,
    /// Indicates if column name should be rendered with the table alias i.e. `T0.COL` instead of
    /// `COL` (INSERT/UPDATE/DELETE statements use the bare column)
    fully_qualify_column_names: bool,
}

impl SQLBuilder {
    pub fn new(context: &SQLContext) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            quote_identifiers: context.case_sensitive,
            fully_qualify_column_names: true,
        }
    }

    /// Push a string
    pub fn push_str<T: AsRef<str>>(&mut self, s: T) {
        self.sql.push_str(s.as_ref());
    }

    /// Push a character
    pub fn push(&mut self, c: char) {
        self.sql.push(c);
    }

    /// Push a table name, column name or alias. In case-sensitive mode the identifier is
    /// surrounded by double quotes (unless it already is), otherwise it is pushed as is and the
    /// database folds its case.
    pub fn push_identifier<T: AsRef<str>>(&mut self, s: T) {
        let s = s.as_ref();
        if self.quote_identifiers && !is_quoted(s) {
            self.sql.push('"');
            self.sql.push_str(s);
            self.sql.push('"');
        } else {
            self.sql.push_str(s);
        }
    }

    /// Push a column. Push `<alias>.<column_name>` if in fully_qualify_column_names mode,
    /// otherwise just `<column_name>`.
    pub fn push_column<T: AsRef<str>>(&mut self, alias: T, column_name: T) {
        if self.fully_qualify_column_names {
            self.push_identifier(alias);
            self.push('.');
        }
        self.push_identifier(column_name);
    }

    /// Push a space. This is a common operation, so it is provided as a separate method.
    pub fn push_space(&mut self) {
        self.sql.push(' ');
    }

    /// Push a parameter, which will be replaced with a placeholder in the SQL string
    /// and the parameter will be added to the list of parameters.
    pub fn push_param(&mut self, param: SQLParam) {
        self.params.push(param);
        self.push('?');
    }

    /// Push elements of an iterator, separated by `sep`. The `push_elem` function provides
    /// the flexibility to map the elements (compared to [`SQLBuilder::push_elems`], which assumes
    /// that the elements implement [`ExpressionBuilder`]).
    pub fn push_iter<T>(
        &mut self,
        iter: impl ExactSizeIterator<Item = T>,
        sep: &str,
        push_elem: impl Fn(&mut Self, T),
    ) {
        let len = iter.len();
        for (i, item) in iter.enumerate() {
            push_elem(self, item);

            if i < len - 1 {
                self.sql.push_str(sep);
            }
        }
    }

    /// Push elements of a slice, separated by `sep`.
    pub fn push_elems<T: ExpressionBuilder>(
        &mut self,
        context: &SQLContext,
        elems: &[T],
        sep: &str,
    ) {
        self.push_iter(elems.iter(), sep, |builder, elem| {
            elem.build(context, builder);
        });
    }

    /// Get the SQL string and the list of parameters. Calling this method should be the final step
    /// in building an SQL expression, and thus this builder consumes the `self`.
    pub fn into_sql(self) -> (String, Vec<SQLParam>) {
        (self.sql, self.params)
    }

    /// Execute the given function with the [`Self::fully_qualify_column_names`] flag set to false.
    /// The original value of the flag is restored afterwards.
    pub fn without_fully_qualified_column_names<F, R>(&mut self, func: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let cur_fully_qualify_column_names = self.fully_qualify_column_names;
        self.fully_qualify_column_names = false;
        let ret = func(self);
        self.fully_qualify_column_names = cur_fully_qualify_column_names;
        ret
    }
}
