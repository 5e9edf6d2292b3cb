// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::EntityTypeBinding;
use tracing::debug;

use super::{Entry, check_complete_key, check_key, check_writable, written_value};
use crate::{
    ODataSqlError, SQLContext,
    sql::{SQLBuilder, SQLParam, SQLStatement},
};

/// `DELETE FROM <table> WHERE <key column>=? AND ...`, one equality per key in declared order
pub struct SQLDeleteBuilder<'a> {
    target: &'a EntityTypeBinding,
    keys: Vec<(String, SQLParam)>,
}

impl<'a> SQLDeleteBuilder<'a> {
    pub fn new(target: &'a EntityTypeBinding, keys: &Entry) -> Result<Self, ODataSqlError> {
        check_writable(target)?;
        check_complete_key(target, keys)?;

        for name in keys.keys() {
            check_key(target, name)?;
        }

        let keys = target
            .keys
            .iter()
            .filter_map(|name| keys.get(name).map(|value| (name, value)))
            .map(|(name, value)| -> Result<_, ODataSqlError> {
                let (property, param) = written_value(target, name, value)?;
                Ok((property.column.clone(), param))
            })
            .collect::<Result<Vec<_>, ODataSqlError>>()?;

        Ok(Self { target, keys })
    }

    pub fn target(&self) -> &'a EntityTypeBinding {
        self.target
    }

    pub fn keys(&self) -> &[(String, SQLParam)] {
        &self.keys
    }

    pub fn build(&self, context: &SQLContext) -> Result<SQLStatement, ODataSqlError> {
        let mut builder = SQLBuilder::new(context);

        builder.push_str("DELETE FROM ");
        builder.push_identifier(&self.target.table);
        builder.push_str(" WHERE ");
        builder.push_iter(self.keys.iter(), " AND ", |builder, (column, param)| {
            builder.push_identifier(column);
            builder.push('=');
            builder.push_param(param.clone());
        });

        let statement = SQLStatement::from(builder.into_sql());
        debug!(sql = %statement.sql, params = statement.params.len(), "Built delete statement");
        Ok(statement)
    }
}
