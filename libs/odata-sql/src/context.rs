// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use crate::config::{EnvError, Environment, SQLConfig};

/// The database dialects the generated SQL targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DatabaseProduct {
    #[default]
    H2,
    Derby,
    PostgreSql,
    SybaseAse,
    Hana,
    MySql,
}

/// How a dialect expresses a row limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `OFFSET n FETCH FIRST m ROWS ONLY`
    FetchFirst,
    /// `LIMIT m OFFSET n`
    Limit,
}

impl DatabaseProduct {
    pub fn name(&self) -> &'static str {
        match self {
            DatabaseProduct::H2 => "H2",
            DatabaseProduct::Derby => "Apache Derby",
            DatabaseProduct::PostgreSql => "PostgreSQL",
            DatabaseProduct::SybaseAse => "Adaptive Server Enterprise",
            DatabaseProduct::Hana => "HDB",
            DatabaseProduct::MySql => "MySQL",
        }
    }

    pub fn paging_style(&self) -> PagingStyle {
        match self {
            DatabaseProduct::H2 | DatabaseProduct::Derby => PagingStyle::FetchFirst,
            DatabaseProduct::PostgreSql
            | DatabaseProduct::SybaseAse
            | DatabaseProduct::Hana
            | DatabaseProduct::MySql => PagingStyle::Limit,
        }
    }

    /// Only HANA can pass input parameters to a calculation view.
    pub fn supports_calc_view_parameters(&self) -> bool {
        matches!(self, DatabaseProduct::Hana)
    }
}

impl Display for DatabaseProduct {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The per-request rendering context: which dialect to emit and whether identifiers are quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SQLContext {
    pub product: DatabaseProduct,
    pub case_sensitive: bool,
}

impl SQLContext {
    pub fn new(product: DatabaseProduct) -> Self {
        Self {
            product,
            case_sensitive: false,
        }
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn from_config(product: DatabaseProduct, config: &SQLConfig) -> Self {
        Self::new(product).with_case_sensitive(config.case_sensitive)
    }

    pub fn from_env(product: DatabaseProduct, env: &dyn Environment) -> Result<Self, EnvError> {
        Ok(Self::from_config(product, &SQLConfig::from_env(env)?))
    }

    /// Quote `name` in case-sensitive mode. Names that already carry quotes are left alone.
    pub fn quote_identifier(&self, name: &str) -> String {
        if self.case_sensitive && !is_quoted(name) {
            format!("\"{name}\"")
        } else {
            name.to_string()
        }
    }

    pub fn table(&self, name: &str) -> String {
        self.quote_identifier(name)
    }

    pub fn column(&self, alias: &str, column: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(alias),
            self.quote_identifier(column)
        )
    }
}

pub(crate) fn is_quoted(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('"') && name.ends_with('"')
}
