// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#[macro_use]
#[cfg(test)]
pub(crate) mod test_util;

mod expression_builder;
mod sql_builder;
mod sql_param;
mod statement;

pub use expression_builder::ExpressionBuilder;
pub use sql_builder::SQLBuilder;
pub use sql_param::SQLParam;
pub use statement::SQLStatement;
