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

use super::{Entry, check_writable, written_value};
use crate::{
    ODataSqlError, SQLContext,
    sql::{SQLBuilder, SQLParam, SQLStatement},
};

/// `INSERT INTO <table> (<columns>) VALUES (<values>)`
pub struct SQLInsertBuilder<'a> {
    target: &'a EntityTypeBinding,
    /// Columns with their values, in declared property order
    values: Vec<(String, SQLParam)>,
}

impl<'a> SQLInsertBuilder<'a> {
    /// Insert the properties present in `entry`, in the order the entity type declares them.
    /// The database fills in a generated key column, so a value given for it is dropped.
    pub fn new(target: &'a EntityTypeBinding, entry: &Entry) -> Result<Self, ODataSqlError> {
        check_writable(target)?;

        let mut values = vec![];
        for (name, value) in entry {
            let (property, param) = written_value(target, name, value)?;
            if target.is_generated_key(property) {
                debug!(column = %property.column, "Skipping generated key column");
                continue;
            }
            values.push((property, param));
        }

        let position = |name: &str| {
            target
                .properties
                .iter()
                .position(|property| property.name == name)
        };
        values.sort_by_key(|(property, _)| position(&property.name));

        let values = values
            .into_iter()
            .map(|(property, param)| (property.column.clone(), param))
            .collect::<Vec<_>>();

        if values.is_empty() {
            return Err(ODataSqlError::UnsupportedQuery(format!(
                "Nothing to insert into {}",
                target.name
            )));
        }

        Ok(Self { target, values })
    }

    pub fn target(&self) -> &'a EntityTypeBinding {
        self.target
    }

    pub fn values(&self) -> &[(String, SQLParam)] {
        &self.values
    }

    /// Insert a further column value, replacing one already present
    pub fn set_value(&mut self, column: impl Into<String>, param: SQLParam) {
        let column = column.into();
        match self.values.iter_mut().find(|(existing, _)| *existing == column) {
            Some((_, existing)) => *existing = param,
            None => self.values.push((column, param)),
        }
    }

    pub fn build(&self, context: &SQLContext) -> Result<SQLStatement, ODataSqlError> {
        let mut builder = SQLBuilder::new(context);

        builder.push_str("INSERT INTO ");
        builder.push_identifier(&self.target.table);
        builder.push_str(" (");
        builder.push_iter(self.values.iter(), ",", |builder, (column, _)| {
            builder.push_identifier(column)
        });
        builder.push_str(") VALUES (");
        builder.push_iter(self.values.iter(), ",", |builder, (_, param)| {
            builder.push_param(param.clone())
        });
        builder.push(')');

        let statement = SQLStatement::from(builder.into_sql());
        debug!(sql = %statement.sql, params = statement.params.len(), "Built insert statement");
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
    fn declared_order_and_coerced_values() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let entities4 = bindings.entity_set("Entities4").unwrap();
            let entry = Entry::from([
                ("Id4_3".to_string(), EdmValue::from("third")),
                ("Id4_2".to_string(), EdmValue::Int64(22)),
                ("Id4_1".to_string(), EdmValue::from("11")),
            ]);

            let insert = SQLInsertBuilder::new(entities4, &entry).unwrap();
            assert_binding!(
                insert.build(&SQLContext::new(DatabaseProduct::H2)).unwrap(),
                "INSERT INTO ENTITY4_TABLE (ID4_1,ID4_2,ID4_3) VALUES (?,?,?)",
                11,
                22,
                "third"
            );

            assert_binding!(
                insert
                    .build(&SQLContext::new(DatabaseProduct::Hana).with_case_sensitive(true))
                    .unwrap(),
                r#"INSERT INTO "ENTITY4_TABLE" ("ID4_1","ID4_2","ID4_3") VALUES (?,?,?)"#,
                11,
                22,
                "third"
            );
        });
    }

    #[multiplatform_test]
    fn rejects_unwritable_properties() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let persons = bindings.entity_set("Persons").unwrap();
            let entry = Entry::from([("Address".to_string(), EdmValue::from("Main St"))]);
            let error = SQLInsertBuilder::new(persons, &entry).err().unwrap();
            assert_eq!(
                error.to_string(),
                "No column mapping for property Address of PersonType"
            );

            let entry = Entry::from([("Unknown".to_string(), EdmValue::from("x"))]);
            let error = SQLInsertBuilder::new(persons, &entry).err().unwrap();
            assert_eq!(
                error.to_string(),
                "Property Unknown is not defined on PersonType"
            );

            let entities6 = bindings.entity_set("Entities6").unwrap();
            let entry = Entry::from([("ID".to_string(), EdmValue::Int32(1))]);
            let error = SQLInsertBuilder::new(entities6, &entry).err().unwrap();
            assert_eq!(error.to_string(), "Calculation view ENTITY6_TABLE is read-only");
        });
    }

    #[multiplatform_test]
    fn generated_keys_are_left_to_the_database() {
        TestSetup::with_setup(|TestSetup { bindings, .. }| {
            let invoices = bindings.entity_set("Invoices").unwrap();
            let entry = Entry::from([
                ("Id".to_string(), EdmValue::Int32(7)),
                ("Amount".to_string(), EdmValue::Int64(250)),
            ]);

            let insert = SQLInsertBuilder::new(invoices, &entry).unwrap();
            assert_binding!(
                insert.build(&SQLContext::new(DatabaseProduct::H2)).unwrap(),
                "INSERT INTO INVOICES (AMOUNT) VALUES (?)",
                250i64
            );

            let entry = Entry::from([("Id".to_string(), EdmValue::Int32(7))]);
            let error = SQLInsertBuilder::new(invoices, &entry).err().unwrap();
            assert_eq!(error.to_string(), "Nothing to insert into InvoiceType");
        });
    }
}
