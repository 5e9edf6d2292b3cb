// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::Display;

use edm_binding::{CastError, EdmSimpleType, EdmValue};

/// A value bound to a `?` placeholder, together with the EDM type it is bound as.
#[derive(Debug, Clone, PartialEq)]
pub struct SQLParam {
    pub value: EdmValue,
    pub edm_type: EdmSimpleType,
}

impl SQLParam {
    pub fn new(value: EdmValue, edm_type: EdmSimpleType) -> Self {
        Self { value, edm_type }
    }

    /// A parameter typed by the shape of its value
    pub fn typed(value: EdmValue) -> Self {
        let edm_type = value.natural_type();
        Self { value, edm_type }
    }

    /// Convert `value` to `edm_type` first, so that the bound value matches the column.
    pub fn coerced(value: &EdmValue, edm_type: EdmSimpleType) -> Result<Self, CastError> {
        Ok(Self::new(value.coerce_to(edm_type)?, edm_type))
    }
}

impl Display for SQLParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.value, self.edm_type)
    }
}
