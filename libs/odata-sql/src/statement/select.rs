// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::{
    AggregateFunction, BindingError, EdmTableBindingProvider, EntityTypeBinding, PropertyBinding,
};
use tracing::debug;

use crate::{
    ODataSqlError, SQLContext,
    clause::{
        FilterTranslator, FromClause, GroupBy, JoinClause, JoinScope, OrderBy, OrderByElement,
        Paging, ResolvedColumn, SQLExpression, SelectItem, SelectList, WhereClause,
    },
    query::{OrderByItem, Ordering, PropertyPath, filter::FilterExpression, is_star},
    sql::{ExpressionBuilder, SQLBuilder, SQLParam, SQLStatement},
};

/// The largest offset a statement can skip to. Offsets are bound as SQL `BIGINT`.
pub const MAX_OFFSET: usize = i64::MAX as usize;

/// Builds one `SELECT` over an entity type (the primary table, always aliased `T0`).
///
/// The builder accumulates joins and parameters as clauses are added, so it is used for exactly
/// one statement. Clauses may be added in any order; [`SQLSelectBuilder::build`] renders them in
/// SQL order and binds parameters in the order their placeholders appear.
pub struct SQLSelectBuilder<'a> {
    target: &'a EntityTypeBinding,
    alias: String,
    scope: JoinScope<'a>,
    select: SelectList,
    parameters: Vec<(String, SQLParam)>,
    where_clause: WhereClause,
    order_by: OrderBy,
    top: Option<usize>,
    skip: Option<usize>,
    server_side_paging: bool,
}

impl<'a> SQLSelectBuilder<'a> {
    pub fn new(provider: &'a dyn EdmTableBindingProvider, target: &'a EntityTypeBinding) -> Self {
        let mut scope = JoinScope::new(provider, target);
        let alias = scope.alias(&target.name);

        Self {
            target,
            alias,
            scope,
            select: SelectList::new(),
            parameters: vec![],
            where_clause: WhereClause::new(),
            order_by: OrderBy::default(),
            top: None,
            skip: None,
            server_side_paging: false,
        }
    }

    pub fn target(&self) -> &'a EntityTypeBinding {
        self.target
    }

    /// The alias of the primary table
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Select `COUNT(*)` instead of columns. Counting ignores ordering and paging.
    pub fn select_count(&mut self) {
        self.select = SelectList::count();
    }

    /// Select the columns named by `$select`, or every simple and complex property when it asks
    /// for everything. Key columns are always part of the result.
    pub fn select(&mut self, paths: &[PropertyPath]) -> Result<(), ODataSqlError> {
        let target = self.target;

        if paths.is_empty() || paths.iter().any(|path| is_star(path)) {
            for property in &target.properties {
                self.select_property(property);
            }
            for complex_property in &target.complex_properties {
                self.select_complex(&complex_property.name)?;
            }
        } else {
            for path in paths {
                self.select_path(path)?;
            }
        }

        self.select_keys()
    }

    /// Select only the key columns
    pub fn select_keys(&mut self) -> Result<(), ODataSqlError> {
        let target = self.target;
        for key in target.key_properties()? {
            self.select_property(key);
        }
        Ok(())
    }

    fn select_property(&mut self, property: &PropertyBinding) {
        let item = match self.target.aggregate_function(&property.column) {
            Some(function) => {
                SelectItem::aggregate(function, self.alias.clone(), property.column.clone())
            }
            None => SelectItem::column(self.alias.clone(), property.column.clone()),
        };
        self.select.push(item);
    }

    fn select_complex(&mut self, name: &str) -> Result<(), ODataSqlError> {
        let target = self.target;
        let complex_property = target.find_complex_property(name).ok_or_else(|| {
            ODataSqlError::UnsupportedQuery(format!("{name} is not a complex property"))
        })?;

        let (alias, complex_type) = self.scope.join_complex(target, complex_property)?;
        for property in &complex_type.properties {
            self.select
                .push(SelectItem::column(alias.clone(), property.column.clone()));
        }
        Ok(())
    }

    fn select_path(&mut self, path: &[String]) -> Result<(), ODataSqlError> {
        let target = self.target;

        match path {
            [name] if target.is_parameter(name) => Ok(()),
            [name] if target.find_complex_property(name).is_some() => self.select_complex(name),
            [name, ..] if target.find_complex_property(name).is_some() => {
                Err(unmapped_path(target, path).into())
            }
            _ => {
                let column = self.scope.resolve(target, path)?;
                let item = match self.aggregate_function(&column) {
                    Some(function) => SelectItem::aggregate(function, column.alias, column.column),
                    None => SelectItem::column(column.alias, column.column),
                };
                self.select.push(item);
                Ok(())
            }
        }
    }

    /// The aggregate applied to `column`, if it is an aggregated column of the primary table
    fn aggregate_function(&self, column: &ResolvedColumn) -> Option<AggregateFunction> {
        if column.alias == self.alias {
            self.target.aggregate_function(&column.column)
        } else {
            None
        }
    }

    /// Select every column of each navigation target along the `$expand` paths, joining them in.
    pub fn expand(&mut self, paths: &[PropertyPath]) -> Result<(), ODataSqlError> {
        for path in paths {
            let mut current = self.target;

            for navigation in path {
                let (_, expanded) = self.scope.provider().navigation(current, navigation)?;
                let alias = self.scope.join(expanded, current)?;

                for property in &expanded.properties {
                    self.select
                        .push(SelectItem::column(alias.clone(), property.column.clone()));
                }
                current = expanded;
            }
        }
        Ok(())
    }

    /// Join the navigation targets along the `$expand` paths without selecting their columns
    pub fn join_expanded(&mut self, paths: &[PropertyPath]) -> Result<(), ODataSqlError> {
        for path in paths {
            let mut current = self.target;

            for navigation in path {
                let (_, expanded) = self.scope.provider().navigation(current, navigation)?;
                self.scope.join(expanded, current)?;
                current = expanded;
            }
        }
        Ok(())
    }

    /// Pass calculation-view input parameters. Each value is also selected back as
    /// `? AS <name>_T0`, except when counting.
    pub fn with_parameters(&mut self, parameters: Vec<(String, SQLParam)>) {
        if !self.select.is_count() {
            for (name, param) in &parameters {
                self.select.push(SelectItem::Parameter {
                    name: name.clone(),
                    alias: self.alias.clone(),
                    param: param.clone(),
                });
            }
        }
        self.parameters = parameters;
    }

    /// AND the translated `$filter`
    pub fn filter(&mut self, filter: &FilterExpression) -> Result<(), ODataSqlError> {
        let condition = FilterTranslator::new(&mut self.scope, self.target).translate(filter)?;
        self.where_clause.and(condition);
        Ok(())
    }

    /// Restrict to the rows whose single key column is one of `ids`
    pub fn filter_ids(&mut self, key: &PropertyBinding, ids: Vec<SQLParam>) {
        self.where_clause.and(SQLExpression::In {
            operand: Box::new(SQLExpression::column(self.alias.clone(), key.column.clone())),
            values: ids,
        });
    }

    /// AND `<alias>.<key column> = ?` for each key of the addressed entity `start`. When the
    /// request navigated away from `start`, it is joined to the target first.
    pub fn with_keys(
        &mut self,
        start: &'a EntityTypeBinding,
        keys: Vec<(&PropertyBinding, SQLParam)>,
    ) -> Result<(), ODataSqlError> {
        let alias = if start.name == self.target.name {
            self.alias.clone()
        } else {
            self.scope.join(start, self.target)?
        };

        if let Some(condition) = SQLExpression::conjunction(keys.into_iter().map(|(key, param)| {
            SQLExpression::eq(
                SQLExpression::column(alias.clone(), key.column.clone()),
                SQLExpression::Param(param),
            )
        })) {
            self.where_clause.and(condition);
        }
        Ok(())
    }

    /// Order by `$orderby`, or by default by the calculation-view parameters and then the key
    /// columns, ascending.
    pub fn order_by(&mut self, items: &[OrderByItem]) -> Result<(), ODataSqlError> {
        if items.is_empty() {
            return self.default_order();
        }

        let target = self.target;
        for item in items {
            match item.path.as_slice() {
                [name] if target.is_parameter(name) => self.order_by.push(
                    OrderByElement::label(format!("{name}_{}", self.alias), item.ordering),
                ),
                [name, ..] if target.find_complex_property(name).is_some() => {
                    return Err(unmapped_path(target, &item.path).into());
                }
                path => {
                    let column = self.scope.resolve(target, path)?;
                    let element = match self.aggregate_function(&column) {
                        // Ordered through the aggregate's select-list label
                        Some(function) => OrderByElement::label(
                            format!(
                                "\"{}\"",
                                SelectItem::aggregate(function, column.alias, column.column)
                                    .label()
                                    .unwrap_or_default()
                            ),
                            item.ordering,
                        ),
                        None => OrderByElement::column(column.alias, column.column, item.ordering),
                    };
                    self.order_by.push(element);
                }
            }
        }
        Ok(())
    }

    fn default_order(&mut self) -> Result<(), ODataSqlError> {
        let target = self.target;

        for parameter in &target.parameters {
            self.order_by.push(OrderByElement::label(
                format!("{}_{}", parameter.name, self.alias),
                Ordering::Asc,
            ));
        }
        for key in target.key_properties()? {
            self.order_by.push(OrderByElement::column(
                self.alias.clone(),
                key.column.clone(),
                Ordering::Asc,
            ));
        }
        Ok(())
    }

    /// Apply `$top`, `$skip` and `$skiptoken`. A missing `$top`, or one above `page_size`, is
    /// replaced by `page_size` and marks the statement as server-side paged. Fails when `$skip`
    /// and `$skiptoken` together pass [`MAX_OFFSET`].
    pub fn paginate(
        &mut self,
        top: Option<usize>,
        skip: Option<usize>,
        skip_token: Option<usize>,
        page_size: usize,
    ) -> Result<(), ODataSqlError> {
        match top {
            Some(top) if top <= page_size => {
                self.top = Some(top);
                self.server_side_paging = false;
            }
            _ => {
                self.top = Some(page_size);
                self.server_side_paging = true;
            }
        }

        self.skip = match (skip, skip_token) {
            (None, None) => None,
            (skip, skip_token) => {
                let offset = skip
                    .unwrap_or(0)
                    .checked_add(skip_token.unwrap_or(0))
                    .filter(|offset| *offset <= MAX_OFFSET)
                    .ok_or_else(|| {
                        ODataSqlError::invalid_option(
                            "$skiptoken",
                            format!("$skip and $skiptoken add up to more than {MAX_OFFSET}"),
                        )
                    })?;
                Some(offset)
            }
        };
        Ok(())
    }

    /// AND a further condition, for instance from an interceptor
    pub fn add_condition(&mut self, condition: SQLExpression) {
        self.where_clause.and(condition);
    }

    pub fn where_clause(&self) -> &WhereClause {
        &self.where_clause
    }

    pub fn joins(&self) -> &[JoinClause] {
        self.scope.joins()
    }

    pub fn select_list(&self) -> &SelectList {
        &self.select
    }

    pub fn effective_top(&self) -> Option<usize> {
        self.top
    }

    /// `$skip` plus `$skiptoken`; `None` when neither was given
    pub fn effective_skip(&self) -> Option<usize> {
        self.skip
    }

    pub fn is_server_side_paging(&self) -> bool {
        self.server_side_paging
    }

    /// The `$skiptoken` of the next page: only for server-side paging, only when this page
    /// came back full, and never past [`MAX_OFFSET`].
    pub fn next_skip_token(&self, fetched_rows: usize) -> Option<usize> {
        match self.top {
            Some(top) if self.server_side_paging && fetched_rows >= top => self
                .skip
                .unwrap_or(0)
                .checked_add(top)
                .filter(|offset| *offset <= MAX_OFFSET),
            _ => None,
        }
    }

    pub fn params(&self, context: &SQLContext) -> Result<Vec<SQLParam>, ODataSqlError> {
        Ok(self.build(context)?.params)
    }

    pub fn build(&self, context: &SQLContext) -> Result<SQLStatement, ODataSqlError> {
        if !self.parameters.is_empty() && !context.product.supports_calc_view_parameters() {
            return Err(ODataSqlError::DialectMismatch {
                product: context.product,
                feature: format!("Input parameters of calculation view {}", self.target.table),
            });
        }

        let mut builder = SQLBuilder::new(context);
        builder.push_str("SELECT ");
        self.select.build(context, &mut builder);
        builder.push_space();
        FromClause::new(self.target.table.clone(), self.alias.clone())
            .with_parameters(self.parameters.clone())
            .build(context, &mut builder);

        for join in self.scope.joins() {
            builder.push_space();
            join.build(context, &mut builder);
        }

        if !self.where_clause.is_empty() {
            builder.push_str(" WHERE ");
            self.where_clause.build(context, &mut builder);
        }

        if !self.select.is_count() {
            let group_by = GroupBy::from_select(&self.select);
            if !group_by.is_empty() {
                builder.push_space();
                group_by.build(context, &mut builder);
            }

            if !self.order_by.is_empty() {
                builder.push_space();
                self.order_by.build(context, &mut builder);
            }

            let paging = Paging::new(self.top, self.skip.unwrap_or(0));
            if !paging.is_empty() {
                builder.push_space();
                paging.build(context, &mut builder);
            }
        }

        let statement = SQLStatement::from(builder.into_sql());
        debug!(
            sql = %statement.sql,
            params = statement.params.len(),
            "Built select statement"
        );
        Ok(statement)
    }
}

fn unmapped_path(target: &EntityTypeBinding, path: &[String]) -> BindingError {
    BindingError::MissingColumnMapping {
        entity: target.name.clone(),
        property: path.join("/"),
    }
}
