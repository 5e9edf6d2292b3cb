// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use edm_binding::{BindingError, CastError};
use thiserror::Error;

use crate::{DatabaseProduct, FilterParseError, config::EnvError};

#[derive(Error, Debug)]
pub enum ODataSqlError {
    #[error("{0}")]
    Binding(#[from] BindingError),

    #[error("{0}")]
    Cast(#[from] CastError),

    #[error("{0}")]
    Env(#[from] EnvError),

    #[error("Invalid $filter: {0}")]
    FilterParse(#[from] FilterParseError),

    #[error("{0}")]
    InvalidFilter(String),

    #[error("{message}")]
    InvalidQueryOption {
        option: &'static str,
        message: String,
    },

    #[error("{0}")]
    UnsupportedQuery(String),

    #[error("{feature} is not supported by {product}")]
    DialectMismatch {
        product: DatabaseProduct,
        feature: String,
    },

    #[error("Collection {0} is not directly accessible.")]
    NotDirectlyAccessible(String),

    #[error("Missing value for parameter {parameter} of {entity}")]
    MissingParameter { entity: String, parameter: String },

    #[error("Missing value for key property {property} of {entity}")]
    MissingKey { entity: String, property: String },

    #[error("Nothing to update for {0}")]
    EmptyUpdate(String),

    #[error("{0} {1}")]
    WithContext(String, #[source] Box<ODataSqlError>),
}

impl ODataSqlError {
    pub fn with_context(self, context: String) -> ODataSqlError {
        ODataSqlError::WithContext(context, Box::new(self))
    }

    pub(crate) fn invalid_option(option: &'static str, message: impl Into<String>) -> Self {
        ODataSqlError::InvalidQueryOption {
            option,
            message: message.into(),
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, ODataSqlError> {
    fn with_context(self, context: String) -> Result<T, ODataSqlError> {
        self.map_err(|e| e.with_context(context))
    }
}
