// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    Aggregation, AssociationBinding, AssociationEndBinding, BindingError, ComplexPropertyBinding,
    ComplexTypeBinding, DataStructureType, EdmModel, EdmSimpleType, EntityTypeBinding,
    MappingTableBinding, NavigationBinding, PropertyBinding, TableMapping, TableMetadataProvider,
    model::local_name,
};

/// Resolves entity types, associations, and complex types to their physical representation.
///
/// Implementations are populated once at startup and shared read-only between requests.
pub trait EdmTableBindingProvider: Send + Sync {
    fn entity_type(&self, name: &str) -> Result<&EntityTypeBinding, BindingError>;

    fn entity_set(&self, name: &str) -> Result<&EntityTypeBinding, BindingError>;

    fn association(&self, name: &str) -> Result<&AssociationBinding, BindingError>;

    /// The complex type of `owner`'s property `property`
    fn complex_type(&self, owner: &str, property: &str)
    -> Result<&ComplexTypeBinding, BindingError>;

    fn entity_types(&self) -> Vec<&EntityTypeBinding>;

    /// Follow a navigation property of `owner` to its association and target type
    fn navigation(
        &self,
        owner: &EntityTypeBinding,
        name: &str,
    ) -> Result<(&AssociationBinding, &EntityTypeBinding), BindingError> {
        let navigation = owner
            .find_navigation(name)
            .ok_or_else(|| BindingError::NoSuchProperty {
                entity: owner.name.clone(),
                property: name.to_string(),
            })?;

        Ok((
            self.association(&navigation.association)?,
            self.entity_type(&navigation.target)?,
        ))
    }
}

/// The default [`EdmTableBindingProvider`].
///
/// Built either from generator documents ([`TableBindings::from_mappings`]) or by hand
/// ([`TableBindings::builder`]); both paths run the same validation.
#[derive(Debug, Clone, Default)]
pub struct TableBindings {
    entity_types: IndexMap<String, EntityTypeBinding>,
    entity_sets: IndexMap<String, String>,
    associations: IndexMap<String, AssociationBinding>,
    complex_types: IndexMap<String, ComplexTypeBinding>,
}

#[derive(Debug, Default)]
pub struct TableBindingsBuilder {
    bindings: TableBindings,
}

impl TableBindingsBuilder {
    pub fn entity_type(mut self, binding: EntityTypeBinding) -> Self {
        self.bindings
            .entity_types
            .insert(binding.name.clone(), binding);
        self
    }

    /// Register an entity type and expose it under an entity set name
    pub fn entity_set(mut self, name: impl Into<String>, binding: EntityTypeBinding) -> Self {
        self.bindings
            .entity_sets
            .insert(name.into(), binding.name.clone());
        self.entity_type(binding)
    }

    pub fn entity_set_of(mut self, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        self.bindings
            .entity_sets
            .insert(name.into(), entity_type.into());
        self
    }

    pub fn association(mut self, binding: AssociationBinding) -> Self {
        self.bindings
            .associations
            .insert(binding.name.clone(), binding);
        self
    }

    pub fn complex_type(mut self, binding: ComplexTypeBinding) -> Self {
        self.bindings
            .complex_types
            .insert(binding.name.clone(), binding);
        self
    }

    pub fn build(self) -> Result<TableBindings, BindingError> {
        self.bindings.validate()?;

        debug!(
            "Resolved table bindings for {} entity types, {} associations, {} complex types",
            self.bindings.entity_types.len(),
            self.bindings.associations.len(),
            self.bindings.complex_types.len()
        );

        Ok(self.bindings)
    }
}

impl TableBindings {
    pub fn builder() -> TableBindingsBuilder {
        TableBindingsBuilder::default()
    }

    /// Resolve the generator's table-mapping documents against the EDM metadata and check the
    /// result against the physical schema.
    pub fn from_mappings(
        model: &EdmModel,
        mappings: Vec<TableMapping>,
        schema: &dyn TableMetadataProvider,
    ) -> Result<Self, BindingError> {
        let mappings: HashMap<String, TableMapping> = mappings
            .into_iter()
            .map(|mapping| (local_name(&mapping.edm_type).to_string(), mapping))
            .collect();

        let mapping_for = |type_name: &str| {
            mappings.get(type_name).ok_or_else(|| {
                BindingError::InvalidMapping(format!("No table mapping for type {type_name}"))
            })
        };

        let mut builder = TableBindings::builder();

        for complex_type in &model.complex_types {
            let mapping = mapping_for(&complex_type.name)?;

            // The complex type's table refers back to the entity type owning the property
            let owners = model
                .entity_types
                .iter()
                .filter(|entity_type| {
                    entity_type.properties.iter().any(|property| {
                        model
                            .complex_type(&property.type_name)
                            .is_some_and(|typ| typ.name == complex_type.name)
                    })
                })
                .map(|entity_type| entity_type.name.as_str())
                .collect::<Vec<_>>();

            let join_columns = owners
                .iter()
                .find_map(|owner| mapping.reference(owner))
                .map(|reference| reference.join_columns.clone())
                .ok_or_else(|| BindingError::NoJoinColumns {
                    from: complex_type.name.clone(),
                    to: owners
                        .first()
                        .map(|owner| owner.to_string())
                        .unwrap_or_else(|| "its owner".to_string()),
                })?;

            let properties = complex_type
                .properties
                .iter()
                .map(|property| {
                    let column = mapping.column(&property.name).ok_or_else(|| {
                        BindingError::MissingColumnMapping {
                            entity: complex_type.name.clone(),
                            property: property.name.clone(),
                        }
                    })?;
                    Ok(PropertyBinding::new(
                        &property.name,
                        column,
                        EdmSimpleType::from_str(&property.type_name)?,
                    ))
                })
                .collect::<Result<Vec<_>, BindingError>>()?;

            builder = builder.complex_type(ComplexTypeBinding {
                name: complex_type.name.clone(),
                table: mapping.sql_table.clone(),
                join_columns,
                properties,
            });
        }

        for entity_type in &model.entity_types {
            let mapping = mapping_for(&entity_type.name)?;
            let is_parameter = |name: &str| mapping.parameters.iter().any(|p| p == name);

            let mut binding = EntityTypeBinding::new(&entity_type.name, &mapping.sql_table)
                .with_fqn(
                    mapping
                        .edm_type_fqn
                        .clone()
                        .unwrap_or_else(|| model.qualified_name(&entity_type.name)),
                )
                .with_kind(mapping.data_structure_type);
            binding.key_generated = mapping.key_generated.clone();
            binding.aggregation = mapping.aggregation_type.map(|kind| Aggregation {
                kind,
                functions: mapping.aggregations.clone(),
            });

            for property in &entity_type.properties {
                if let Some(complex_type) = model.complex_type(&property.type_name) {
                    let reference = mapping.reference(&complex_type.name).ok_or_else(|| {
                        BindingError::NoJoinColumns {
                            from: entity_type.name.clone(),
                            to: complex_type.name.clone(),
                        }
                    })?;
                    binding.complex_properties.push(ComplexPropertyBinding {
                        name: property.name.clone(),
                        complex_type: complex_type.name.clone(),
                        join_columns: reference.join_columns.clone(),
                    });
                    continue;
                }

                let edm_type = EdmSimpleType::from_str(&property.type_name)?;

                if is_parameter(&property.name) {
                    let column = mapping.column(&property.name).unwrap_or(property.name.as_str());
                    binding
                        .parameters
                        .push(PropertyBinding::new(&property.name, column, edm_type));
                } else {
                    let column = mapping.column(&property.name).ok_or_else(|| {
                        BindingError::MissingColumnMapping {
                            entity: entity_type.name.clone(),
                            property: property.name.clone(),
                        }
                    })?;
                    binding
                        .properties
                        .push(PropertyBinding::new(&property.name, column, edm_type));
                }
            }

            binding.keys = entity_type
                .key
                .iter()
                .filter(|key| !is_parameter(key))
                .cloned()
                .collect();

            if binding.kind != DataStructureType::CalcView {
                check_primary_key(&binding, &mapping.primary_keys)?;
            }

            for navigation in &entity_type.navigation_properties {
                let association = model.association(&navigation.relationship).ok_or_else(|| {
                    BindingError::NoSuchAssociation(navigation.relationship.clone())
                })?;
                let target = association.end_for_role(&navigation.to_role).ok_or_else(|| {
                    BindingError::InvalidMapping(format!(
                        "Association {} has no role {}",
                        association.name, navigation.to_role
                    ))
                })?;

                binding.navigations.push(NavigationBinding {
                    name: navigation.name.clone(),
                    association: association.name.clone(),
                    target: local_name(&target.type_name).to_string(),
                });
            }

            builder = builder.entity_type(binding);
        }

        for association in &model.associations {
            let from_type = local_name(&association.end1.type_name);
            let to_type = local_name(&association.end2.type_name);

            let reference = |from: &str, to: &str| {
                mapping_for(from)?
                    .reference(to)
                    .ok_or_else(|| BindingError::NoJoinColumns {
                        from: from.to_string(),
                        to: to.to_string(),
                    })
            };
            let from_reference = reference(from_type, to_type)?;
            let to_reference = reference(to_type, from_type)?;

            let mapping_table = match (&from_reference.mapping_table, &to_reference.mapping_table)
            {
                (Some(from_table), Some(to_table)) => {
                    if from_table.table != to_table.table {
                        return Err(BindingError::MappingTableMismatch {
                            first: from_type.to_string(),
                            second: to_type.to_string(),
                        });
                    }
                    Some(MappingTableBinding {
                        table: from_table.table.clone(),
                        from_join_columns: from_table.join_columns.clone(),
                        to_join_columns: to_table.join_columns.clone(),
                    })
                }
                (None, None) => None,
                (Some(_), None) => {
                    return Err(BindingError::MissingMappingTable {
                        entity: to_type.to_string(),
                    });
                }
                (None, Some(_)) => {
                    return Err(BindingError::MissingMappingTable {
                        entity: from_type.to_string(),
                    });
                }
            };

            builder = builder.association(AssociationBinding {
                name: association.name.clone(),
                from: AssociationEndBinding {
                    entity_type: from_type.to_string(),
                    multiplicity: association.end1.multiplicity,
                    join_columns: from_reference.join_columns.clone(),
                },
                to: AssociationEndBinding {
                    entity_type: to_type.to_string(),
                    multiplicity: association.end2.multiplicity,
                    join_columns: to_reference.join_columns.clone(),
                },
                mapping_table,
            });
        }

        for entity_set in &model.entity_sets {
            builder = builder.entity_set_of(&entity_set.name, local_name(&entity_set.entity_type));
        }

        let bindings = builder.build()?;
        bindings.validate_against(schema)?;
        Ok(bindings)
    }

    /// Structural checks that do not need the database
    fn validate(&self) -> Result<(), BindingError> {
        for binding in self.entity_types.values() {
            if binding.keys.is_empty() {
                return Err(BindingError::InvalidMapping(format!(
                    "Entity type {} declares no key",
                    binding.name
                )));
            }
            binding.key_properties()?;

            let mut columns: HashMap<String, &str> = HashMap::new();
            for property in &binding.properties {
                if let Some(first) =
                    columns.insert(property.column.to_ascii_uppercase(), &property.name)
                {
                    return Err(BindingError::DuplicateColumn {
                        entity: binding.name.clone(),
                        column: property.column.clone(),
                        first: first.to_string(),
                        second: property.name.clone(),
                    });
                }
            }

            for navigation in &binding.navigations {
                let association = self.association(&navigation.association)?;
                self.entity_type(&navigation.target)?;
                association.join_columns(&binding.name, &navigation.target)?;
                association.join_columns(&navigation.target, &binding.name)?;
            }

            for complex_property in &binding.complex_properties {
                let complex_type = self.complex_type_binding(&complex_property.complex_type)?;
                if complex_type.join_columns.len() != complex_property.join_columns.len() {
                    return Err(BindingError::JoinColumnMismatch {
                        association: format!("{}.{}", binding.name, complex_property.name),
                        from_count: complex_property.join_columns.len(),
                        to_count: complex_type.join_columns.len(),
                    });
                }
            }

            if let Some(column) = &binding.key_generated {
                let is_key_column = binding
                    .key_properties()?
                    .iter()
                    .any(|key| key.column.eq_ignore_ascii_case(column));
                if !is_key_column {
                    return Err(BindingError::InvalidMapping(format!(
                        "Generated key {column} of {} is not a key column",
                        binding.name
                    )));
                }
            }

            if let Some(aggregation) = &binding.aggregation {
                for column in aggregation.functions.keys() {
                    let is_mapped = binding
                        .properties
                        .iter()
                        .any(|property| property.column.eq_ignore_ascii_case(column));
                    if !is_mapped {
                        return Err(BindingError::InvalidMapping(format!(
                            "Aggregated column {column} of {} is not mapped by any property",
                            binding.name
                        )));
                    }
                }
            }

            if binding.kind != DataStructureType::CalcView && binding.has_parameters() {
                return Err(BindingError::InvalidMapping(format!(
                    "Only calculation views declare parameters, but {} is a {}",
                    binding.name,
                    binding.kind.name()
                )));
            }
        }

        for association in self.associations.values() {
            self.entity_type(&association.from.entity_type)?;
            self.entity_type(&association.to.entity_type)?;

            if association.from.entity_type == association.to.entity_type {
                return Err(BindingError::InvalidMapping(format!(
                    "Self-referencing association {} is not supported",
                    association.name
                )));
            }

            let mismatch = |from_count: usize, to_count: usize| {
                Err(BindingError::JoinColumnMismatch {
                    association: association.name.clone(),
                    from_count,
                    to_count,
                })
            };

            match &association.mapping_table {
                None => {
                    let (from_count, to_count) = (
                        association.from.join_columns.len(),
                        association.to.join_columns.len(),
                    );
                    if from_count != to_count {
                        return mismatch(from_count, to_count);
                    }
                }
                Some(mapping_table) => {
                    for (end, mapping_columns) in [
                        (&association.from, &mapping_table.from_join_columns),
                        (&association.to, &mapping_table.to_join_columns),
                    ] {
                        if end.join_columns.len() != mapping_columns.len() {
                            return mismatch(end.join_columns.len(), mapping_columns.len());
                        }
                    }
                }
            }
        }

        for entity_type in self.entity_sets.values() {
            self.entity_type(entity_type)?;
        }

        Ok(())
    }

    /// Check every table and column the bindings refer to against the physical schema. Where
    /// the schema knows a table's primary key, it must match the entity type's key columns.
    pub fn validate_against(&self, schema: &dyn TableMetadataProvider) -> Result<(), BindingError> {
        for binding in self.entity_types.values() {
            check_columns(
                schema,
                &binding.name,
                &binding.table,
                binding
                    .properties
                    .iter()
                    .map(|p| &p.column)
                    .chain(binding.complex_properties.iter().flat_map(|c| &c.join_columns)),
            )?;

            if binding.kind != DataStructureType::CalcView {
                if let Some(metadata) = schema.table(&binding.table) {
                    check_primary_key(binding, &metadata.primary_keys)?;
                }
            }
        }

        for complex_type in self.complex_types.values() {
            check_columns(
                schema,
                &complex_type.name,
                &complex_type.table,
                complex_type
                    .properties
                    .iter()
                    .map(|p| &p.column)
                    .chain(complex_type.join_columns.iter()),
            )?;
        }

        for association in self.associations.values() {
            for end in [&association.from, &association.to] {
                let table = &self.entity_type(&end.entity_type)?.table;
                check_columns(schema, &association.name, table, &end.join_columns)?;
            }

            if let Some(mapping_table) = &association.mapping_table {
                check_columns(
                    schema,
                    &association.name,
                    &mapping_table.table,
                    mapping_table
                        .from_join_columns
                        .iter()
                        .chain(mapping_table.to_join_columns.iter()),
                )?;
            }
        }

        Ok(())
    }

    fn complex_type_binding(&self, name: &str) -> Result<&ComplexTypeBinding, BindingError> {
        self.complex_types
            .get(name)
            .ok_or_else(|| BindingError::NoSuchComplexType(name.to_string()))
    }
}

/// A declared primary key, when there is one, names exactly the key columns (in any order)
fn check_primary_key(
    binding: &EntityTypeBinding,
    primary_key: &[String],
) -> Result<(), BindingError> {
    if primary_key.is_empty() {
        return Ok(());
    }

    let normalize = |column: &str| column.trim_matches('"').to_ascii_uppercase();
    let keys = binding
        .key_properties()?
        .iter()
        .map(|key| key.column.as_str())
        .collect::<Vec<_>>();

    let declared = primary_key
        .iter()
        .map(|column| normalize(column))
        .collect::<HashSet<_>>();
    if declared != keys.iter().map(|column| normalize(column)).collect::<HashSet<_>>() {
        return Err(BindingError::PrimaryKeyMismatch {
            entity: binding.name.clone(),
            table: binding.table.clone(),
            primary_key: primary_key.join(","),
            keys: keys.join(","),
        });
    }
    Ok(())
}

fn check_columns<'a>(
    schema: &dyn TableMetadataProvider,
    owner: &str,
    table: &str,
    columns: impl IntoIterator<Item = &'a String>,
) -> Result<(), BindingError> {
    let metadata = schema
        .table(table)
        .ok_or_else(|| BindingError::TableMetadataNotFound(table.to_string()))?;

    for column in columns {
        if !metadata.has_column(column) {
            return Err(BindingError::ColumnNotFound {
                entity: owner.to_string(),
                table: table.to_string(),
                column: column.clone(),
            });
        }
    }
    Ok(())
}

impl EdmTableBindingProvider for TableBindings {
    fn entity_type(&self, name: &str) -> Result<&EntityTypeBinding, BindingError> {
        self.entity_types
            .get(local_name(name))
            .ok_or_else(|| BindingError::NoSuchEntity(name.to_string()))
    }

    fn entity_set(&self, name: &str) -> Result<&EntityTypeBinding, BindingError> {
        let entity_type = self
            .entity_sets
            .get(name)
            .ok_or_else(|| BindingError::NoSuchEntitySet(name.to_string()))?;
        self.entity_type(entity_type)
    }

    fn association(&self, name: &str) -> Result<&AssociationBinding, BindingError> {
        self.associations
            .get(local_name(name))
            .ok_or_else(|| BindingError::NoSuchAssociation(name.to_string()))
    }

    fn complex_type(
        &self,
        owner: &str,
        property: &str,
    ) -> Result<&ComplexTypeBinding, BindingError> {
        let owner = self.entity_type(owner)?;
        let complex_property =
            owner
                .find_complex_property(property)
                .ok_or_else(|| BindingError::NoSuchProperty {
                    entity: owner.name.clone(),
                    property: property.to_string(),
                })?;
        self.complex_type_binding(&complex_property.complex_type)
    }

    fn entity_types(&self) -> Vec<&EntityTypeBinding> {
        self.entity_types.values().collect()
    }
}
