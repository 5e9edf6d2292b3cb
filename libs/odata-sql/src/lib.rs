// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Translates OData requests into parameterized SQL.
///
/// An [ODataQuery] names what a request addresses: an entity set, optionally key predicates
/// and one navigation hop, plus the system query options (`$filter`, `$select`, `$expand`,
/// `$orderby`, `$top`, `$skip`, `$skiptoken`). [SQLQueryBuilder] resolves it against the table
/// bindings of an [EdmTableBindingProvider](edm_binding::EdmTableBindingProvider) and hands out a
/// statement builder ([SQLSelectBuilder], [SQLInsertBuilder], [SQLUpdateBuilder] or
/// [SQLDeleteBuilder]). Building that for an [SQLContext] yields the SQL text with `?`
/// placeholders and the typed parameters in placeholder order ([SQLStatement]).
///
/// The dialect only matters at the very end: the same builder renders `FETCH FIRST` for H2 and
/// Derby, `LIMIT` for PostgreSQL, Sybase ASE, HANA and MySQL, and quotes identifiers when the
/// context is case-sensitive.
///
/// Executing statements is left to the caller; [param_binding] binds the parameters onto a
/// prepared statement.
#[macro_use]
mod sql;

mod clause;
mod config;
mod context;
mod interceptor;
pub mod param_binding;
pub mod query;
mod query_builder;
mod sql_error;
mod statement;

#[cfg(test)]
mod test_util;

/// Public types at the root level of this crate
pub use clause::{
    FilterTranslator, FromClause, GroupBy, JoinClause, JoinCondition, JoinScope, OrderBy,
    OrderByElement, OrderByTarget, Paging, ResolvedColumn, SQLExpression, SelectItem,
    SelectList, TableAliases, WhereClause,
};
pub use config::{
    CASE_SENSITIVE_KEY, DEFAULT_SERVER_PAGING_SIZE, EnvError, Environment, MapEnvironment,
    SERVER_PAGING_SIZE_KEY, SQLConfig, SystemEnvironment,
};
pub use context::{DatabaseProduct, PagingStyle, SQLContext};
pub use interceptor::SQLInterceptor;
pub use query::{
    KeyPredicate, ODataQuery, OrderByItem, Ordering, PropertyPath, QueryOptions,
    filter::{FilterExpression, FilterParseError},
};
pub use query_builder::SQLQueryBuilder;
pub use sql::{ExpressionBuilder, SQLBuilder, SQLParam, SQLStatement};
pub use sql_error::{ODataSqlError, WithContext};
pub use statement::{
    Entry, MAX_OFFSET, SQLDeleteBuilder, SQLInsertBuilder, SQLSelectBuilder, SQLUpdateBuilder,
};
