// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use tracing::trace;

/// Table aliases of one statement. Entity and complex types get `T0`, `T1`, ... in the order they
/// are first used (the queried type is always `T0`); many-to-many mapping tables get `MT0`,
/// `MT1`, ...
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableAliases {
    types: IndexMap<String, String>,
    mapping_tables: IndexMap<String, String>,
}

impl TableAliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// The alias of `type_name`, granting the next one on first use.
    pub fn alias(&mut self, type_name: &str) -> String {
        if let Some(alias) = self.types.get(type_name) {
            return alias.clone();
        }

        let alias = format!("T{}", self.types.len());
        trace!(type_name, alias = %alias, "Granted table alias");
        self.types.insert(type_name.to_string(), alias.clone());
        alias
    }

    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.types.get(type_name).map(String::as_str)
    }

    pub fn mapping_alias(&mut self, table: &str) -> String {
        if let Some(alias) = self.mapping_tables.get(table) {
            return alias.clone();
        }

        let alias = format!("MT{}", self.mapping_tables.len());
        trace!(table, alias = %alias, "Granted mapping table alias");
        self.mapping_tables.insert(table.to_string(), alias.clone());
        alias
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn aliases_are_granted_in_first_use_order() {
        let mut aliases = TableAliases::new();
        assert_eq!(aliases.alias("ItemType"), "T0");
        assert_eq!(aliases.alias("OrderType"), "T1");
        assert_eq!(aliases.alias("ItemType"), "T0");
        assert_eq!(aliases.mapping_alias("ENROLLMENTS"), "MT0");
        assert_eq!(aliases.get("OrderType"), Some("T1"));
        assert_eq!(aliases.get("CustomerType"), None);
    }
}
