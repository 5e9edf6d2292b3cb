// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    ODataQuery, ODataSqlError, SQLDeleteBuilder, SQLInsertBuilder, SQLSelectBuilder,
    SQLUpdateBuilder,
};

/// Hooks run on every statement builder the [`SQLQueryBuilder`](crate::SQLQueryBuilder) hands
/// out, in registration order, for example to add tenant conditions or audit columns.
pub trait SQLInterceptor: Send + Sync {
    fn on_read(
        &self,
        _select: &mut SQLSelectBuilder<'_>,
        _query: &ODataQuery,
    ) -> Result<(), ODataSqlError> {
        Ok(())
    }

    fn on_create(
        &self,
        _insert: &mut SQLInsertBuilder<'_>,
        _query: &ODataQuery,
    ) -> Result<(), ODataSqlError> {
        Ok(())
    }

    fn on_update(
        &self,
        _update: &mut SQLUpdateBuilder<'_>,
        _query: &ODataQuery,
    ) -> Result<(), ODataSqlError> {
        Ok(())
    }

    fn on_delete(
        &self,
        _delete: &mut SQLDeleteBuilder<'_>,
        _query: &ODataQuery,
    ) -> Result<(), ODataSqlError> {
        Ok(())
    }
}
