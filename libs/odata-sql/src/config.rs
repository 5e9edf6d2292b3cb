// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

pub const CASE_SENSITIVE_KEY: &str = "DIRIGIBLE_DATABASE_NAMES_CASE_SENSITIVE";
pub const SERVER_PAGING_SIZE_KEY: &str = "DIRIGIBLE_ODATA_SERVER_PAGING_SIZE";

pub const DEFAULT_SERVER_PAGING_SIZE: usize = 1000;

pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, EnvError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" | "enable" => Ok(true),
                "false" | "0" | "no" | "off" | "disabled" | "disable" => Ok(false),
                _ => Err(EnvError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }

    fn get_or_else(&self, key: &str, default_value: &str) -> String {
        self.get(key).unwrap_or(default_value.to_string())
    }
}

impl dyn Environment + '_ {
    /// Parse the value of `key`, if set.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, EnvError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(key)
            .map(|value| {
                value.trim().parse().map_err(|e: T::Err| EnvError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                    value,
                })
            })
            .transpose()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    #[error(
        "Invalid value for {key}: {value}. Expected true, 1, yes, on, enabled, enable OR false, 0, no, off, disabled, disable"
    )]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid value for {key}: {value}. {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Default)]
pub struct MapEnvironment {
    values: HashMap<String, String>,
    fallback: Option<Arc<dyn Environment>>,
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .cloned()
            .or_else(|| self.fallback.as_ref().and_then(|fb| fb.get(key)))
    }
}

impl From<HashMap<String, String>> for MapEnvironment {
    fn from(values: HashMap<String, String>) -> Self {
        Self {
            values,
            fallback: None,
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(values: [(&str, &str); N]) -> Self {
        Self {
            values: HashMap::from_iter(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
            fallback: None,
        }
    }
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_fallback(fallback: Arc<dyn Environment>) -> Self {
        Self {
            values: HashMap::new(),
            fallback: Some(fallback),
        }
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Settings that shape the generated SQL and that do not vary per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SQLConfig {
    /// Upper bound on the rows of one entity-set page
    pub server_paging_size: usize,
    /// Quote every table, column and alias identifier
    pub case_sensitive: bool,
}

impl Default for SQLConfig {
    fn default() -> Self {
        Self {
            server_paging_size: DEFAULT_SERVER_PAGING_SIZE,
            case_sensitive: false,
        }
    }
}

impl SQLConfig {
    pub fn from_env(env: &dyn Environment) -> Result<Self, EnvError> {
        let server_paging_size = match env.get_parsed::<usize>(SERVER_PAGING_SIZE_KEY)? {
            Some(0) => {
                return Err(EnvError::InvalidValue {
                    key: SERVER_PAGING_SIZE_KEY.to_string(),
                    value: "0".to_string(),
                    message: "Expected a positive number".to_string(),
                });
            }
            Some(size) => size,
            None => DEFAULT_SERVER_PAGING_SIZE,
        };

        Ok(Self {
            server_paging_size,
            case_sensitive: env.enabled(CASE_SENSITIVE_KEY, false)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiplatform_test::multiplatform_test;

    #[multiplatform_test]
    fn defaults_without_settings() {
        let env = MapEnvironment::new();
        assert_eq!(SQLConfig::from_env(&env).unwrap(), SQLConfig::default());
    }

    #[multiplatform_test]
    fn reads_settings() {
        let env = MapEnvironment::from([
            (CASE_SENSITIVE_KEY, "yes"),
            (SERVER_PAGING_SIZE_KEY, " 250 "),
        ]);

        let config = SQLConfig::from_env(&env).unwrap();
        assert!(config.case_sensitive);
        assert_eq!(config.server_paging_size, 250);
    }

    #[multiplatform_test]
    fn rejects_invalid_settings() {
        let env = MapEnvironment::from([(CASE_SENSITIVE_KEY, "maybe")]);
        assert!(matches!(
            SQLConfig::from_env(&env),
            Err(EnvError::InvalidBoolean { .. })
        ));

        let env = MapEnvironment::from([(SERVER_PAGING_SIZE_KEY, "many")]);
        assert_eq!(
            SQLConfig::from_env(&env).unwrap_err().to_string(),
            "Invalid value for DIRIGIBLE_ODATA_SERVER_PAGING_SIZE: many. invalid digit found in string"
        );

        let env = MapEnvironment::from([(SERVER_PAGING_SIZE_KEY, "0")]);
        assert!(SQLConfig::from_env(&env).is_err());
    }

    #[multiplatform_test]
    fn falls_back_to_parent_environment() {
        let parent = Arc::new(MapEnvironment::from([(CASE_SENSITIVE_KEY, "on")]));
        let mut env = MapEnvironment::new_with_fallback(parent);
        env.set(SERVER_PAGING_SIZE_KEY, "10");

        let config = SQLConfig::from_env(&env).unwrap();
        assert!(config.case_sensitive);
        assert_eq!(config.server_paging_size, 10);
    }
}
