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

/// `UPDATE <table> SET <column>=?, ... WHERE <key column>=? AND ...`
pub struct SQLUpdateBuilder<'a> {
    target: &'a EntityTypeBinding,
    /// Columns to set, in payload order. Key columns are never set.
    values: Vec<(String, SQLParam)>,
    /// Key columns, in the order the keys were given
    keys: Vec<(String, SQLParam)>,
}

impl<'a> SQLUpdateBuilder<'a> {
    pub fn new(
        target: &'a EntityTypeBinding,
        keys: &Entry,
        entry: &Entry,
    ) -> Result<Self, ODataSqlError> {
        check_writable(target)?;
        check_complete_key(target, keys)?;

        let keys = keys
            .iter()
            .map(|(name, value)| -> Result<_, ODataSqlError> {
                check_key(target, name)?;
                let (property, param) = written_value(target, name, value)?;
                Ok((property.column.clone(), param))
            })
            .collect::<Result<Vec<_>, ODataSqlError>>()?;

        let mut values = vec![];
        for (name, value) in entry {
            if target.keys.contains(name) {
                continue;
            }
            let (property, param) = written_value(target, name, value)?;
            values.push((property.column.clone(), param));
        }

        if values.is_empty() {
            return Err(ODataSqlError::EmptyUpdate(target.name.clone()));
        }

        Ok(Self {
            target,
            values,
            keys,
        })
    }

    pub fn target(&self) -> &'a EntityTypeBinding {
        self.target
    }

    pub fn values(&self) -> &[(String, SQLParam)] {
        &self.values
    }

    pub fn keys(&self) -> &[(String, SQLParam)] {
        &self.keys
    }

    /// Set a further column, replacing a value already present
    pub fn set_value(&mut self, column: impl Into<String>, param: SQLParam) {
        let column = column.into();
        match self.values.iter_mut().find(|(existing, _)| *existing == column) {
            Some((_, existing)) => *existing = param,
            None => self.values.push((column, param)),
        }
    }

    pub fn build(&self, context: &SQLContext) -> Result<SQLStatement, ODataSqlError> {
        let mut builder = SQLBuilder::new(context);

        builder.push_str("UPDATE ");
        builder.push_identifier(&self.target.table);
        builder.push_str(" SET ");
        builder.push_iter(self.values.iter(), ", ", |builder, (column, param)| {
            builder.push_identifier(column);
            builder.push('=');
            builder.push_param(param.clone());
        });
        builder.push_str(" WHERE ");
        builder.push_iter(self.keys.iter(), " AND ", |builder, (column, param)| {
            builder.push_identifier(column);
            builder.push('=');
            builder.push_param(param.clone());
        });

        let statement = SQLStatement::from(builder.into_sql());
        debug!(sql = %statement.sql, params = statement.params.len(), "Built update statement");
        Ok(statement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DatabaseProduct, test_util::TestSetup};
    use edm_binding::{EdmTableBindingProvider, EdmValue};
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn set_in_payload_order_then_keys() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let mpl = bindings.entity_set("MessageProcessingLogs").unwrap();
            let keys = Entry::from([("MessageGuid".to_string(), EdmValue::from("abc"))]);
            let entry = Entry::from([
                ("Status".to_string(), EdmValue::from("RETRY")),
                ("MessageGuid".to_string(), EdmValue::from("abc")),
                ("Sender".to_string(), EdmValue::from("From")),
            ]);

            let update = SQLUpdateBuilder::new(mpl, &keys, &entry).unwrap();
            assert_binding!(
                update.build(&SQLContext::new(DatabaseProduct::H2)).unwrap(),
                "UPDATE MPLHEADER SET STATUS=?, SENDER=? WHERE MESSAGEGUID=?",
                "RETRY",
                "From",
                "abc"
            );
        });
    }

    #[multiplatform_test]
    fn composite_keys_in_given_order() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let entities4 = bindings.entity_set("Entities4").unwrap();
            let keys = Entry::from([
                ("Id4_2".to_string(), EdmValue::Int32(22)),
                ("Id4_1".to_string(), EdmValue::Int32(11)),
            ]);
            let entry = Entry::from([("Id4_3".to_string(), EdmValue::from("third"))]);

            let update = SQLUpdateBuilder::new(entities4, &keys, &entry).unwrap();
            assert_binding!(
                update.build(&SQLContext::new(DatabaseProduct::H2)).unwrap(),
                "UPDATE ENTITY4_TABLE SET ID4_3=? WHERE ID4_2=? AND ID4_1=?",
                "third",
                22,
                11
            );
        });
    }

    #[multiplatform_test]
    fn rejects_incomplete_requests() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let entities4 = bindings.entity_set("Entities4").unwrap();
            let keys = Entry::from([("Id4_1".to_string(), EdmValue::Int32(11))]);
            let entry = Entry::from([("Id4_3".to_string(), EdmValue::from("third"))]);
            let error = SQLUpdateBuilder::new(entities4, &keys, &entry).err().unwrap();
            assert_eq!(
                error.to_string(),
                "Missing value for key property Id4_2 of Entity4Type"
            );

            let keys = Entry::from([
                ("Id4_1".to_string(), EdmValue::Int32(11)),
                ("Id4_2".to_string(), EdmValue::Int32(22)),
            ]);
            let entry = Entry::from([("Id4_1".to_string(), EdmValue::Int32(11))]);
            let error = SQLUpdateBuilder::new(entities4, &keys, &entry).err().unwrap();
            assert_eq!(error.to_string(), "Nothing to update for Entity4Type");
        });
    }
}
