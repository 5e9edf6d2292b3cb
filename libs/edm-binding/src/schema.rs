// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::DataStructureType;

/// What the database reports about one table, view, or calculation view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub name: String,
    #[serde(default)]
    pub kind: DataStructureType,
    pub columns: Vec<String>,
    #[serde(default)]
    pub primary_keys: Vec<String>,
}

impl TableMetadata {
    pub fn new(name: impl Into<String>, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind: DataStructureType::Table,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            primary_keys: vec![],
        }
    }

    pub fn with_primary_keys(mut self, primary_keys: &[&str]) -> Self {
        self.primary_keys = primary_keys.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_kind(mut self, kind: DataStructureType) -> Self {
        self.kind = kind;
        self
    }

    /// Column names are compared case-insensitively, since unquoted identifiers fold case in
    /// every supported database.
    pub fn has_column(&self, column: &str) -> bool {
        let column = column.trim_matches('"');
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(column))
    }
}

/// Source of physical table metadata (typically database introspection done at startup).
pub trait TableMetadataProvider: Send + Sync {
    fn table(&self, name: &str) -> Option<&TableMetadata>;
}

/// An in-memory [`TableMetadataProvider`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalSchema {
    tables: IndexMap<String, TableMetadata>,
}

impl PhysicalSchema {
    pub fn new(tables: Vec<TableMetadata>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|table| (table.name.to_ascii_uppercase(), table))
                .collect(),
        }
    }

    pub fn add_table(&mut self, table: TableMetadata) {
        self.tables.insert(table.name.to_ascii_uppercase(), table);
    }
}

impl TableMetadataProvider for PhysicalSchema {
    fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables
            .get(&name.trim_matches('"').to_ascii_uppercase())
    }
}
