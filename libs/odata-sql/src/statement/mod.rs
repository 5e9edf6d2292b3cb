// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

mod delete;
mod insert;
mod select;
mod update;

pub use delete::SQLDeleteBuilder;
pub use insert::SQLInsertBuilder;
pub use select::{MAX_OFFSET, SQLSelectBuilder};
pub use update::SQLUpdateBuilder;

use edm_binding::{DataStructureType, EdmValue, EntityTypeBinding, PropertyBinding};
use indexmap::IndexMap;

use crate::{ODataSqlError, sql::SQLParam};

/// A property name to value map, in the order the values were supplied
pub type Entry = IndexMap<String, EdmValue>;

fn check_writable(target: &EntityTypeBinding) -> Result<(), ODataSqlError> {
    if target.kind == DataStructureType::CalcView {
        return Err(ODataSqlError::UnsupportedQuery(format!(
            "Calculation view {} is read-only",
            target.table
        )));
    }
    Ok(())
}

/// The binding of a written property along with its value, converted to the property type
fn written_value<'a>(
    target: &'a EntityTypeBinding,
    name: &str,
    value: &EdmValue,
) -> Result<(&'a PropertyBinding, SQLParam), ODataSqlError> {
    target.column(name)?;
    let property = target.property_binding(name)?;
    Ok((property, SQLParam::coerced(value, property.edm_type)?))
}

pub(crate) fn check_key<'a>(
    target: &'a EntityTypeBinding,
    name: &str,
) -> Result<&'a PropertyBinding, ODataSqlError> {
    if !target.keys.iter().any(|key| key == name) {
        return Err(ODataSqlError::UnsupportedQuery(format!(
            "{name} is not a key property of {}",
            target.name
        )));
    }
    Ok(target.property_binding(name)?)
}

/// Every key property must have a value
fn check_complete_key(target: &EntityTypeBinding, keys: &Entry) -> Result<(), ODataSqlError> {
    match target.keys.iter().find(|key| !keys.contains_key(*key)) {
        Some(missing) => Err(ODataSqlError::MissingKey {
            entity: target.name.clone(),
            property: missing.clone(),
        }),
        None => Ok(()),
    }
}
