// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Table-mapping documents, one per entity (or complex) type, in the flat JSON shape the
//! OData generator emits:
//!
//! ```json
//! {
//!   "edmType": "OrderType",
//!   "edmTypeFqn": "org.example.OrderType",
//!   "sqlTable": "ORDERS",
//!   "dataStructureType": "TABLE",
//!   "Id": "ID",
//!   "Customer": "CUSTOMER",
//!   "_ref_ItemType": { "joinColumn": ["ID"] },
//!   "keyGenerated": "ID",
//!   "_pk_": "ID"
//! }
//! ```
//!
//! Aggregate entity types also carry `"aggregationType"` (`"explicit"` or `"derived"`) and, when
//! derived, `"aggregationProps"`: a column name to aggregation function object.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{AggregateFunction, AggregationType, BindingError, DataStructureType};

const EDM_TYPE: &str = "edmType";
const EDM_TYPE_FQN: &str = "edmTypeFqn";
const SQL_TABLE: &str = "sqlTable";
const DATA_STRUCTURE_TYPE: &str = "dataStructureType";
const PRIMARY_KEY: &str = "_pk_";
const PARAMETERS: &str = "_parameters_";
const REFERENCE_PREFIX: &str = "_ref_";
const KEY_GENERATED: &str = "keyGenerated";
const AGGREGATION_TYPE: &str = "aggregationType";
const AGGREGATION_PROPS: &str = "aggregationProps";

#[derive(Debug, Clone, PartialEq)]
pub struct TableMapping {
    pub edm_type: String,
    pub edm_type_fqn: Option<String>,
    pub sql_table: String,
    pub data_structure_type: DataStructureType,
    /// Primary key columns in declared order
    pub primary_keys: Vec<String>,
    /// Names of the properties that are calculation-view input parameters
    pub parameters: Vec<String>,
    /// Property name -> column name, in document order
    pub columns: IndexMap<String, String>,
    /// Referenced type name -> the join information of this side
    pub references: IndexMap<String, ReferenceMapping>,
    /// The key column the database generates on insert
    pub key_generated: Option<String>,
    pub aggregation_type: Option<AggregationType>,
    /// Column name -> aggregation function, for derived aggregation
    pub aggregations: IndexMap<String, AggregateFunction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReferenceMapping {
    #[serde(rename = "joinColumn", deserialize_with = "one_or_many")]
    pub join_columns: Vec<String>,
    #[serde(rename = "manyToManyMappingTable", default)]
    pub mapping_table: Option<MappingTableReference>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MappingTableReference {
    #[serde(rename = "mappingTableName")]
    pub table: String,
    #[serde(rename = "mappingTableJoinColumn", deserialize_with = "one_or_many")]
    pub join_columns: Vec<String>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(column) => vec![column],
        OneOrMany::Many(columns) => columns,
    })
}

impl TableMapping {
    pub fn from_json(json: &str) -> Result<Self, BindingError> {
        Self::from_value(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, BindingError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| e.with_context(format!("While loading {}", path.display())))
    }

    /// Load every `*.json` document of a directory, in file name order
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, BindingError> {
        let mut paths = std::fs::read_dir(dir)?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|path| path.extension().is_some_and(|ext| ext == "json"));
        paths.sort();

        debug!("Loading {} table mapping documents from {}", paths.len(), dir.display());

        paths.iter().map(|path| Self::from_file(path)).collect()
    }

    pub fn from_value(value: Value) -> Result<Self, BindingError> {
        let Value::Object(object) = value else {
            return Err(BindingError::InvalidMapping(
                "A table mapping must be a JSON object".into(),
            ));
        };

        let mut edm_type = None;
        let mut edm_type_fqn = None;
        let mut sql_table = None;
        let mut data_structure_type = DataStructureType::default();
        let mut primary_keys = vec![];
        let mut parameters = vec![];
        let mut columns = IndexMap::new();
        let mut references = IndexMap::new();
        let mut key_generated = None;
        let mut aggregation_type = None;
        let mut aggregations: IndexMap<String, AggregateFunction> = IndexMap::new();

        for (key, value) in object {
            match key.as_str() {
                EDM_TYPE => edm_type = Some(expect_string(&key, value)?),
                EDM_TYPE_FQN => edm_type_fqn = Some(expect_string(&key, value)?),
                SQL_TABLE => sql_table = Some(expect_string(&key, value)?),
                DATA_STRUCTURE_TYPE => data_structure_type = serde_json::from_value(value)?,
                PRIMARY_KEY => {
                    primary_keys = expect_string(&key, value)?
                        .split(',')
                        .map(|column| column.trim().to_string())
                        .filter(|column| !column.is_empty())
                        .collect()
                }
                PARAMETERS => parameters = serde_json::from_value(value)?,
                KEY_GENERATED => key_generated = Some(expect_string(&key, value)?),
                AGGREGATION_TYPE => aggregation_type = Some(serde_json::from_value(value)?),
                AGGREGATION_PROPS => {
                    let props = match value {
                        Value::Object(props) => props,
                        other => {
                            return Err(BindingError::InvalidMapping(format!(
                                "Expected an object for '{key}', found {other}"
                            )));
                        }
                    };
                    for (column, function) in props {
                        let function =
                            expect_string(&column, function)?.parse::<AggregateFunction>()?;
                        aggregations.insert(column, function);
                    }
                }
                _ => {
                    if let Some(referenced_type) = key.strip_prefix(REFERENCE_PREFIX) {
                        let reference: ReferenceMapping = serde_json::from_value(value)?;
                        references.insert(referenced_type.to_string(), reference);
                    } else if key.starts_with('_') {
                        // Generator bookkeeping entries other than the ones above carry no binding
                        debug!("Ignoring mapping entry {key}");
                    } else {
                        let column = expect_string(&key, value)?;
                        columns.insert(key, column);
                    }
                }
            }
        }

        let edm_type = edm_type
            .ok_or_else(|| BindingError::InvalidMapping(format!("Missing '{EDM_TYPE}'")))?;
        let sql_table = sql_table.ok_or_else(|| {
            BindingError::InvalidMapping(format!("Missing '{SQL_TABLE}' for {edm_type}"))
        })?;

        if !aggregations.is_empty() && aggregation_type != Some(AggregationType::Derived) {
            return Err(BindingError::InvalidMapping(format!(
                "'{AGGREGATION_PROPS}' of {edm_type} needs '{AGGREGATION_TYPE}' to be derived"
            )));
        }

        Ok(TableMapping {
            edm_type,
            edm_type_fqn,
            sql_table,
            data_structure_type,
            primary_keys,
            parameters,
            columns,
            references,
            key_generated,
            aggregation_type,
            aggregations,
        })
    }

    pub fn column(&self, property: &str) -> Option<&str> {
        self.columns.get(property).map(|column| column.as_str())
    }

    pub fn reference(&self, other_type: &str) -> Option<&ReferenceMapping> {
        self.references.get(other_type)
    }
}

fn expect_string(key: &str, value: Value) -> Result<String, BindingError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(BindingError::InvalidMapping(format!(
            "Expected a string for '{key}', found {other}"
        ))),
    }
}
