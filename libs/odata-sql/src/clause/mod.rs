// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The clauses a statement is assembled from. Each renders itself through [`ExpressionBuilder`].
//!
//! [`ExpressionBuilder`]: crate::sql::ExpressionBuilder

mod alias;
mod expression;
mod from;
mod group_by;
mod join;
mod order_by;
mod paging;
mod select_list;
mod where_clause;

pub use alias::TableAliases;
pub use expression::SQLExpression;
pub use from::FromClause;
pub use group_by::GroupBy;
pub use join::{JoinClause, JoinCondition, JoinScope, ResolvedColumn};
pub use order_by::{OrderBy, OrderByElement, OrderByTarget};
pub use paging::Paging;
pub use select_list::{SelectItem, SelectList};
pub use where_clause::{FilterTranslator, WhereClause};
