// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{BindingError, edm_value::CastError};

/// The simple (primitive) types of the entity data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmSimpleType {
    Binary,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    Guid,
    Time,
    DateTime,
    DateTimeOffset,
    Null,
}

impl EdmSimpleType {
    pub fn name(&self) -> &'static str {
        match self {
            EdmSimpleType::Binary => "Edm.Binary",
            EdmSimpleType::Boolean => "Edm.Boolean",
            EdmSimpleType::Byte => "Edm.Byte",
            EdmSimpleType::SByte => "Edm.SByte",
            EdmSimpleType::Int16 => "Edm.Int16",
            EdmSimpleType::Int32 => "Edm.Int32",
            EdmSimpleType::Int64 => "Edm.Int64",
            EdmSimpleType::Single => "Edm.Single",
            EdmSimpleType::Double => "Edm.Double",
            EdmSimpleType::Decimal => "Edm.Decimal",
            EdmSimpleType::String => "Edm.String",
            EdmSimpleType::Guid => "Edm.Guid",
            EdmSimpleType::Time => "Edm.Time",
            EdmSimpleType::DateTime => "Edm.DateTime",
            EdmSimpleType::DateTimeOffset => "Edm.DateTimeOffset",
            EdmSimpleType::Null => "Null",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            EdmSimpleType::Byte
                | EdmSimpleType::SByte
                | EdmSimpleType::Int16
                | EdmSimpleType::Int32
                | EdmSimpleType::Int64
                | EdmSimpleType::Single
                | EdmSimpleType::Double
                | EdmSimpleType::Decimal
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            EdmSimpleType::Time | EdmSimpleType::DateTime | EdmSimpleType::DateTimeOffset
        )
    }
}

impl FromStr for EdmSimpleType {
    type Err = CastError;

    /// Accepts both the qualified (`Edm.Int32`) and the bare (`Int32`) form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("Edm.").unwrap_or(s);

        let typ = match name {
            "Binary" => EdmSimpleType::Binary,
            "Boolean" => EdmSimpleType::Boolean,
            "Byte" => EdmSimpleType::Byte,
            "SByte" => EdmSimpleType::SByte,
            "Int16" => EdmSimpleType::Int16,
            "Int32" => EdmSimpleType::Int32,
            "Int64" => EdmSimpleType::Int64,
            "Single" => EdmSimpleType::Single,
            "Double" => EdmSimpleType::Double,
            "Decimal" => EdmSimpleType::Decimal,
            "String" => EdmSimpleType::String,
            "Guid" => EdmSimpleType::Guid,
            "Time" => EdmSimpleType::Time,
            "DateTime" => EdmSimpleType::DateTime,
            "DateTimeOffset" => EdmSimpleType::DateTimeOffset,
            "Null" => EdmSimpleType::Null,
            _ => return Err(CastError::UnsupportedType(s.to_string())),
        };

        Ok(typ)
    }
}

impl Display for EdmSimpleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for EdmSimpleType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for EdmSimpleType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        EdmSimpleType::from_str(&name).map_err(serde::de::Error::custom)
    }
}

/// Cardinality of one end of an association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Multiplicity {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "0..1")]
    ZeroToOne,
    #[serde(rename = "*")]
    Many,
}

impl Multiplicity {
    pub fn is_many(&self) -> bool {
        matches!(self, Multiplicity::Many)
    }
}

/// The kind of database object backing an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DataStructureType {
    #[default]
    #[serde(rename = "TABLE")]
    Table,
    #[serde(rename = "VIEW")]
    View,
    #[serde(rename = "CALC VIEW")]
    CalcView,
}

impl DataStructureType {
    pub fn name(&self) -> &'static str {
        match self {
            DataStructureType::Table => "TABLE",
            DataStructureType::View => "VIEW",
            DataStructureType::CalcView => "CALC VIEW",
        }
    }
}

/// How an aggregate entity type gets its aggregated values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    /// The database object already aggregates; its columns are selected as they are.
    Explicit,
    /// Columns listed with an [`AggregateFunction`] are aggregated by the query, grouped by the
    /// other selected columns.
    Derived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggregateFunction {
    pub fn sql_name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
            AggregateFunction::Count => "COUNT",
        }
    }
}

impl FromStr for AggregateFunction {
    type Err = BindingError;

    /// Case-insensitive. `AVERAGE` is the generator's spelling of `AVG`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let function = match s.trim().to_ascii_uppercase().as_str() {
            "SUM" => AggregateFunction::Sum,
            "AVG" | "AVERAGE" => AggregateFunction::Avg,
            "MIN" => AggregateFunction::Min,
            "MAX" => AggregateFunction::Max,
            "COUNT" => AggregateFunction::Count,
            _ => {
                return Err(BindingError::InvalidMapping(format!(
                    "Unsupported aggregation function {s}"
                )));
            }
        };
        Ok(function)
    }
}

impl Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sql_name())
    }
}
