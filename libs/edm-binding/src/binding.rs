// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::{
    AggregateFunction, AggregationType, BindingError, DataStructureType, EdmSimpleType, Multiplicity,
};

/// A simple property and the column backing it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyBinding {
    pub name: String,
    pub column: String,
    pub edm_type: EdmSimpleType,
}

impl PropertyBinding {
    pub fn new(name: impl Into<String>, column: impl Into<String>, edm_type: EdmSimpleType) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            edm_type,
        }
    }
}

/// An entity type together with the table (or view) that stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTypeBinding {
    pub name: String,
    pub fqn: String,
    pub table: String,
    pub kind: DataStructureType,
    /// Simple properties in declared order
    pub properties: Vec<PropertyBinding>,
    /// Key property names in declared order. Calculation-view parameters are not part of it.
    pub keys: Vec<String>,
    /// Calculation-view input parameters. Their `column` is the parameter name.
    pub parameters: Vec<PropertyBinding>,
    pub complex_properties: Vec<ComplexPropertyBinding>,
    pub navigations: Vec<NavigationBinding>,
    /// The key column the database fills in on insert
    pub key_generated: Option<String>,
    pub aggregation: Option<Aggregation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub kind: AggregationType,
    /// Column name -> function. Only derived aggregation lists any.
    pub functions: IndexMap<String, AggregateFunction>,
}

/// A property typed by a complex type, whose members live in a separate table.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexPropertyBinding {
    pub name: String,
    pub complex_type: String,
    /// Columns of the owning entity's table that reference the complex type's table
    pub join_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComplexTypeBinding {
    pub name: String,
    pub table: String,
    /// Columns of the complex type's table, matched positionally with
    /// [`ComplexPropertyBinding::join_columns`]
    pub join_columns: Vec<String>,
    pub properties: Vec<PropertyBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationBinding {
    pub name: String,
    pub association: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationBinding {
    pub name: String,
    pub from: AssociationEndBinding,
    pub to: AssociationEndBinding,
    pub mapping_table: Option<MappingTableBinding>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssociationEndBinding {
    pub entity_type: String,
    pub multiplicity: Multiplicity,
    /// Columns of this end's own table taking part in the join
    pub join_columns: Vec<String>,
}

/// The intermediate table of a many-to-many association.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingTableBinding {
    pub table: String,
    /// Mapping-table columns matching the `from` end's join columns
    pub from_join_columns: Vec<String>,
    /// Mapping-table columns matching the `to` end's join columns
    pub to_join_columns: Vec<String>,
}

impl EntityTypeBinding {
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            fqn: name.clone(),
            name,
            table: table.into(),
            kind: DataStructureType::Table,
            properties: vec![],
            keys: vec![],
            parameters: vec![],
            complex_properties: vec![],
            navigations: vec![],
            key_generated: None,
            aggregation: None,
        }
    }

    pub fn with_fqn(mut self, fqn: impl Into<String>) -> Self {
        self.fqn = fqn.into();
        self
    }

    pub fn with_kind(mut self, kind: DataStructureType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_key_generated(mut self, column: impl Into<String>) -> Self {
        self.key_generated = Some(column.into());
        self
    }

    pub fn with_aggregation(
        mut self,
        kind: AggregationType,
        functions: &[(&str, AggregateFunction)],
    ) -> Self {
        self.aggregation = Some(Aggregation {
            kind,
            functions: functions
                .iter()
                .map(|(column, function)| (column.to_string(), *function))
                .collect(),
        });
        self
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        edm_type: EdmSimpleType,
    ) -> Self {
        self.properties
            .push(PropertyBinding::new(name, column, edm_type));
        self
    }

    /// Declare a property and make it the next key component.
    pub fn key_property(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        edm_type: EdmSimpleType,
    ) -> Self {
        let name = name.into();
        self.keys.push(name.clone());
        self.property(name, column, edm_type)
    }

    pub fn parameter(mut self, name: impl Into<String>, edm_type: EdmSimpleType) -> Self {
        let name = name.into();
        self.parameters
            .push(PropertyBinding::new(name.clone(), name, edm_type));
        self
    }

    pub fn complex_property(
        mut self,
        name: impl Into<String>,
        complex_type: impl Into<String>,
        join_columns: &[&str],
    ) -> Self {
        self.complex_properties.push(ComplexPropertyBinding {
            name: name.into(),
            complex_type: complex_type.into(),
            join_columns: join_columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn navigation(
        mut self,
        name: impl Into<String>,
        association: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.navigations.push(NavigationBinding {
            name: name.into(),
            association: association.into(),
            target: target.into(),
        });
        self
    }

    pub fn find_property(&self, name: &str) -> Option<&PropertyBinding> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn find_parameter(&self, name: &str) -> Option<&PropertyBinding> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn find_navigation(&self, name: &str) -> Option<&NavigationBinding> {
        self.navigations.iter().find(|n| n.name == name)
    }

    pub fn find_complex_property(&self, name: &str) -> Option<&ComplexPropertyBinding> {
        self.complex_properties.iter().find(|c| c.name == name)
    }

    pub fn is_parameter(&self, name: &str) -> bool {
        self.find_parameter(name).is_some()
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn property_binding(&self, name: &str) -> Result<&PropertyBinding, BindingError> {
        self.find_property(name)
            .ok_or_else(|| BindingError::NoSuchProperty {
                entity: self.name.clone(),
                property: name.to_string(),
            })
    }

    /// The column of a simple property. Complex and navigation properties have no single column.
    pub fn column(&self, name: &str) -> Result<&str, BindingError> {
        match self.find_property(name) {
            Some(property) => Ok(&property.column),
            None if self.find_complex_property(name).is_some()
                || self.find_navigation(name).is_some() =>
            {
                Err(BindingError::MissingColumnMapping {
                    entity: self.name.clone(),
                    property: name.to_string(),
                })
            }
            None => Err(BindingError::NoSuchProperty {
                entity: self.name.clone(),
                property: name.to_string(),
            }),
        }
    }

    /// Whether the database generates the value of `property` on insert
    pub fn is_generated_key(&self, property: &PropertyBinding) -> bool {
        self.key_generated
            .as_deref()
            .is_some_and(|column| column.eq_ignore_ascii_case(&property.column))
    }

    /// The function a query aggregates `column` with. Only derived aggregation has any.
    pub fn aggregate_function(&self, column: &str) -> Option<AggregateFunction> {
        match &self.aggregation {
            Some(Aggregation {
                kind: AggregationType::Derived,
                functions,
            }) => functions
                .iter()
                .find(|(aggregated, _)| aggregated.eq_ignore_ascii_case(column))
                .map(|(_, function)| *function),
            _ => None,
        }
    }

    /// Key properties in declared key order
    pub fn key_properties(&self) -> Result<Vec<&PropertyBinding>, BindingError> {
        self.keys
            .iter()
            .map(|key| self.property_binding(key))
            .collect()
    }
}

impl ComplexTypeBinding {
    pub fn new(name: impl Into<String>, table: impl Into<String>, join_columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            join_columns: join_columns.iter().map(|c| c.to_string()).collect(),
            properties: vec![],
        }
    }

    pub fn property(
        mut self,
        name: impl Into<String>,
        column: impl Into<String>,
        edm_type: EdmSimpleType,
    ) -> Self {
        self.properties
            .push(PropertyBinding::new(name, column, edm_type));
        self
    }
}

impl AssociationEndBinding {
    pub fn new(
        entity_type: impl Into<String>,
        multiplicity: Multiplicity,
        join_columns: &[&str],
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            multiplicity,
            join_columns: join_columns.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl AssociationBinding {
    pub fn new(
        name: impl Into<String>,
        from: AssociationEndBinding,
        to: AssociationEndBinding,
    ) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            mapping_table: None,
        }
    }

    pub fn with_mapping_table(
        mut self,
        table: impl Into<String>,
        from_join_columns: &[&str],
        to_join_columns: &[&str],
    ) -> Self {
        self.mapping_table = Some(MappingTableBinding {
            table: table.into(),
            from_join_columns: from_join_columns.iter().map(|c| c.to_string()).collect(),
            to_join_columns: to_join_columns.iter().map(|c| c.to_string()).collect(),
        });
        self
    }

    pub fn end(&self, entity_type: &str) -> Option<&AssociationEndBinding> {
        [&self.from, &self.to]
            .into_iter()
            .find(|end| end.entity_type == entity_type)
    }

    /// The mapping-table columns that match the given end's join columns
    pub fn mapping_join_columns(&self, entity_type: &str) -> Option<&[String]> {
        let mapping_table = self.mapping_table.as_ref()?;
        if self.from.entity_type == entity_type {
            Some(&mapping_table.from_join_columns)
        } else if self.to.entity_type == entity_type {
            Some(&mapping_table.to_join_columns)
        } else {
            None
        }
    }

    /// Join columns of `from_type`'s table towards `to_type`
    pub fn join_columns(&self, from_type: &str, to_type: &str) -> Result<&[String], BindingError> {
        let no_join_columns = || BindingError::NoJoinColumns {
            from: from_type.to_string(),
            to: to_type.to_string(),
        };

        if self.end(to_type).is_none() {
            return Err(no_join_columns());
        }

        self.end(from_type)
            .filter(|end| !end.join_columns.is_empty())
            .map(|end| end.join_columns.as_slice())
            .ok_or_else(no_join_columns)
    }
}
