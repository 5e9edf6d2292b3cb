// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashSet;

use edm_binding::{
    BindingError, ComplexPropertyBinding, ComplexTypeBinding, EdmSimpleType,
    EdmTableBindingProvider, EntityTypeBinding,
};
use tracing::trace;

use super::TableAliases;
use crate::{
    ODataSqlError, SQLContext,
    sql::{ExpressionBuilder, SQLBuilder},
};

/// `<alias>.<column> = <other_alias>.<other_column>`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub alias: String,
    pub column: String,
    pub other_alias: String,
    pub other_column: String,
}

/// `LEFT JOIN <table> AS <alias> ON <conditions>`
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub alias: String,
    pub conditions: Vec<JoinCondition>,
}

impl ExpressionBuilder for JoinCondition {
    fn build(&self, _context: &SQLContext, builder: &mut SQLBuilder) {
        builder.push_column(&self.alias, &self.column);
        builder.push_str(" = ");
        builder.push_column(&self.other_alias, &self.other_column);
    }
}

impl ExpressionBuilder for JoinClause {
    fn build(&self, context: &SQLContext, builder: &mut SQLBuilder) {
        builder.push_str("LEFT JOIN ");
        builder.push_identifier(&self.table);
        builder.push_str(" AS ");
        builder.push_identifier(&self.alias);
        builder.push_str(" ON ");
        builder.push_elems(context, &self.conditions, " AND ");
    }
}

/// A simple property resolved to an aliased column.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedColumn {
    pub alias: String,
    pub column: String,
    pub edm_type: EdmSimpleType,
}

/// The tables taking part in one statement: aliases granted so far and the joins that bring
/// navigation targets and complex-type tables into scope. Each type is joined at most once.
pub struct JoinScope<'a> {
    provider: &'a dyn EdmTableBindingProvider,
    aliases: TableAliases,
    joins: Vec<JoinClause>,
    joined: HashSet<String>,
}

impl<'a> JoinScope<'a> {
    pub fn new(provider: &'a dyn EdmTableBindingProvider, primary: &EntityTypeBinding) -> Self {
        let mut aliases = TableAliases::new();
        aliases.alias(&primary.name);

        Self {
            provider,
            aliases,
            joins: vec![],
            joined: HashSet::from([primary.name.clone()]),
        }
    }

    pub fn provider(&self) -> &'a dyn EdmTableBindingProvider {
        self.provider
    }

    pub fn alias(&mut self, type_name: &str) -> String {
        self.aliases.alias(type_name)
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Join `joined` to `existing`, which must already be in scope, through the association
    /// between them. Returns the alias of `joined`.
    pub fn join(
        &mut self,
        joined: &EntityTypeBinding,
        existing: &EntityTypeBinding,
    ) -> Result<String, ODataSqlError> {
        if joined.name == existing.name || self.joined.contains(&joined.name) {
            return Ok(self.alias(&joined.name));
        }

        let association_name = existing
            .navigations
            .iter()
            .find(|navigation| navigation.target == joined.name)
            .or_else(|| {
                joined
                    .navigations
                    .iter()
                    .find(|navigation| navigation.target == existing.name)
            })
            .map(|navigation| navigation.association.as_str())
            .ok_or_else(|| BindingError::NoJoinColumns {
                from: joined.name.clone(),
                to: existing.name.clone(),
            })?;
        let association = self.provider.association(association_name)?;

        let existing_alias = self.alias(&existing.name);
        let joined_alias = self.alias(&joined.name);
        let joined_columns = association.join_columns(&joined.name, &existing.name)?;
        let existing_columns = association.join_columns(&existing.name, &joined.name)?;

        match &association.mapping_table {
            Some(mapping_table) => {
                let mapping_columns = |entity_type: &str| {
                    association
                        .mapping_join_columns(entity_type)
                        .ok_or_else(|| BindingError::MissingMappingTable {
                            entity: entity_type.to_string(),
                        })
                };
                let mapping_existing = mapping_columns(&existing.name)?;
                let mapping_joined = mapping_columns(&joined.name)?;
                let mapping_alias = self.aliases.mapping_alias(&mapping_table.table);

                self.joins.push(JoinClause {
                    table: mapping_table.table.clone(),
                    alias: mapping_alias.clone(),
                    conditions: conditions(
                        &mapping_alias,
                        mapping_existing,
                        &existing_alias,
                        existing_columns,
                    ),
                });
                self.joins.push(JoinClause {
                    table: joined.table.clone(),
                    alias: joined_alias.clone(),
                    conditions: conditions(
                        &joined_alias,
                        joined_columns,
                        &mapping_alias,
                        mapping_joined,
                    ),
                });
            }
            None => {
                self.joins.push(JoinClause {
                    table: joined.table.clone(),
                    alias: joined_alias.clone(),
                    conditions: conditions(
                        &joined_alias,
                        joined_columns,
                        &existing_alias,
                        existing_columns,
                    ),
                });
            }
        }

        trace!(
            joined = %joined.name,
            existing = %existing.name,
            association = %association.name,
            "Joined entity type"
        );
        self.joined.insert(joined.name.clone());
        Ok(joined_alias)
    }

    /// Join the table of a complex property of `owner` (which must be in scope).
    pub fn join_complex(
        &mut self,
        owner: &EntityTypeBinding,
        property: &ComplexPropertyBinding,
    ) -> Result<(String, &'a ComplexTypeBinding), ODataSqlError> {
        let provider = self.provider;
        let complex_type = provider.complex_type(&owner.name, &property.name)?;
        let alias = self.alias(&complex_type.name);

        if !self.joined.contains(&complex_type.name) {
            let owner_alias = self.alias(&owner.name);
            self.joins.push(JoinClause {
                table: complex_type.table.clone(),
                alias: alias.clone(),
                conditions: conditions(
                    &alias,
                    &complex_type.join_columns,
                    &owner_alias,
                    &property.join_columns,
                ),
            });
            trace!(owner = %owner.name, property = %property.name, "Joined complex type");
            self.joined.insert(complex_type.name.clone());
        }

        Ok((alias, complex_type))
    }

    /// Resolve a property path such as `Name`, `Items/Name` or `Address/City` starting at
    /// `owner`, joining every navigation target and complex type on the way.
    pub fn resolve(
        &mut self,
        owner: &'a EntityTypeBinding,
        path: &[String],
    ) -> Result<ResolvedColumn, ODataSqlError> {
        let provider = self.provider;
        let mut current = owner;

        let (last, navigations) = path
            .split_last()
            .ok_or_else(|| ODataSqlError::UnsupportedQuery("Empty property path".to_string()))?;

        for (index, segment) in navigations.iter().enumerate() {
            if let Some(complex_property) = current.find_complex_property(segment) {
                if index + 1 != navigations.len() {
                    return Err(ODataSqlError::UnsupportedQuery(format!(
                        "Nested complex property path {} is not supported",
                        path.join("/")
                    )));
                }

                let (alias, complex_type) = self.join_complex(current, complex_property)?;
                let property = complex_type
                    .properties
                    .iter()
                    .find(|property| &property.name == last)
                    .ok_or_else(|| BindingError::NoSuchProperty {
                        entity: complex_type.name.clone(),
                        property: last.clone(),
                    })?;

                return Ok(ResolvedColumn {
                    alias,
                    column: property.column.clone(),
                    edm_type: property.edm_type,
                });
            }

            let (_, target) = provider.navigation(current, segment)?;
            self.join(target, current)?;
            current = target;
        }

        let column = current.column(last)?.to_string();
        let property = current.property_binding(last)?;

        Ok(ResolvedColumn {
            alias: self.alias(&current.name),
            column,
            edm_type: property.edm_type,
        })
    }
}

fn conditions(
    alias: &str,
    columns: &[String],
    other_alias: &str,
    other_columns: &[String],
) -> Vec<JoinCondition> {
    columns
        .iter()
        .zip(other_columns)
        .map(|(column, other_column)| JoinCondition {
            alias: alias.to_string(),
            column: column.clone(),
            other_alias: other_alias.to_string(),
            other_column: other_column.clone(),
        })
        .collect()
}
