// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use crate::CastError;

#[derive(Error, Debug)]
pub enum BindingError {
    #[error("Table metadata not found for {0}")]
    TableMetadataNotFound(String),

    #[error("No such entity type: {0}")]
    NoSuchEntity(String),

    #[error("No such entity set: {0}")]
    NoSuchEntitySet(String),

    #[error("No such association: {0}")]
    NoSuchAssociation(String),

    #[error("No such complex type: {0}")]
    NoSuchComplexType(String),

    #[error("Property {property} is not defined on {entity}")]
    NoSuchProperty { entity: String, property: String },

    #[error("No column mapping for property {property} of {entity}")]
    MissingColumnMapping { entity: String, property: String },

    #[error("Column {column} of {entity} does not exist in table {table}")]
    ColumnNotFound {
        entity: String,
        table: String,
        column: String,
    },

    #[error("Column {column} of {entity} is mapped by both {first} and {second}")]
    DuplicateColumn {
        entity: String,
        column: String,
        first: String,
        second: String,
    },

    #[error("Primary key {primary_key} of table {table} does not match the key columns {keys} of {entity}")]
    PrimaryKeyMismatch {
        entity: String,
        table: String,
        primary_key: String,
        keys: String,
    },

    #[error("No join column definition found from type {from} to type {to}")]
    NoJoinColumns { from: String, to: String },

    #[error(
        "Join columns of {association} do not line up: {from_count} column(s) on one side, {to_count} on the other"
    )]
    JoinColumnMismatch {
        association: String,
        from_count: usize,
        to_count: usize,
    },

    #[error(
        "Missing manyToManyMappingTable definition for {entity}. Both sides need to point to the mapping table"
    )]
    MissingMappingTable { entity: String },

    #[error(
        "manyToManyMappingTable name is different for {first} and {second}. Both sides need to point to the same mapping table"
    )]
    MappingTableMismatch { first: String, second: String },

    #[error("Invalid table mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Cast(#[from] CastError),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<BindingError>),
}

impl BindingError {
    pub fn with_context(self, context: String) -> BindingError {
        BindingError::WithContext(context, Box::new(self))
    }
}
