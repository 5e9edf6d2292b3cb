// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The EDM metadata as published by the OData service: entity types, complex types,
//! associations and entity sets. This says nothing about tables; [`crate::TableMapping`]
//! documents supply that half.

use serde::{Deserialize, Serialize};

use crate::{BindingError, Multiplicity};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmModel {
    pub namespace: String,
    #[serde(default)]
    pub entity_types: Vec<EdmEntityType>,
    #[serde(default)]
    pub complex_types: Vec<EdmComplexType>,
    #[serde(default)]
    pub associations: Vec<EdmAssociation>,
    #[serde(default)]
    pub entity_sets: Vec<EdmEntitySet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmEntityType {
    pub name: String,
    pub key: Vec<String>,
    pub properties: Vec<EdmProperty>,
    #[serde(default)]
    pub navigation_properties: Vec<EdmNavigationProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmComplexType {
    pub name: String,
    pub properties: Vec<EdmProperty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmProperty {
    pub name: String,
    /// Either a simple type (`Edm.String`) or the (possibly qualified) name of a complex type
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmNavigationProperty {
    pub name: String,
    pub relationship: String,
    pub from_role: String,
    pub to_role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmAssociation {
    pub name: String,
    pub end1: EdmAssociationEnd,
    pub end2: EdmAssociationEnd,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmAssociationEnd {
    pub role: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub multiplicity: Multiplicity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdmEntitySet {
    pub name: String,
    pub entity_type: String,
}

impl EdmModel {
    pub fn from_json(json: &str) -> Result<Self, BindingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn entity_type(&self, name: &str) -> Option<&EdmEntityType> {
        let name = local_name(name);
        self.entity_types.iter().find(|t| t.name == name)
    }

    pub fn complex_type(&self, name: &str) -> Option<&EdmComplexType> {
        let name = local_name(name);
        self.complex_types.iter().find(|t| t.name == name)
    }

    pub fn association(&self, name: &str) -> Option<&EdmAssociation> {
        let name = local_name(name);
        self.associations.iter().find(|a| a.name == name)
    }

    pub fn qualified_name(&self, name: &str) -> String {
        format!("{}.{}", self.namespace, local_name(name))
    }
}

impl EdmAssociation {
    pub fn end_for_role(&self, role: &str) -> Option<&EdmAssociationEnd> {
        [&self.end1, &self.end2]
            .into_iter()
            .find(|end| end.role == role)
    }
}

/// Strip the namespace from a qualified EDM name (`org.example.OrderType` -> `OrderType`)
pub fn local_name(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, local)| local).unwrap_or(name)
}
