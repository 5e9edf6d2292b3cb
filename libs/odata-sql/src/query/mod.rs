// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! What an OData request addresses (entity set, keys, one navigation hop) and the system query
//! options that shape the result.

pub mod filter;
mod options;

use std::collections::HashMap;

pub use options::{OrderByItem, Ordering, PropertyPath, QueryOptions};
pub(crate) use options::is_star;

use crate::ODataSqlError;

/// A key predicate as written in the resource path: `Id4_1=11` is property `Id4_1` with the
/// literal `11`. Calculation-view input parameters are passed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPredicate {
    pub property: String,
    pub literal: String,
}

impl KeyPredicate {
    pub fn new(property: impl Into<String>, literal: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            literal: literal.into(),
        }
    }
}

/// The resource addressed by a request, such as `Orders(1)/Items?$top=5`.
///
/// Without a navigation the key predicates address the entity set's own type. With one, they
/// address the entity the navigation starts from and the navigation target is queried.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataQuery {
    pub entity_set: String,
    pub key_predicates: Vec<KeyPredicate>,
    pub navigation: Option<String>,
    pub options: HashMap<String, String>,
    pub count: bool,
}

impl ODataQuery {
    pub fn new(entity_set: impl Into<String>) -> Self {
        Self {
            entity_set: entity_set.into(),
            ..Default::default()
        }
    }

    pub fn key(mut self, property: impl Into<String>, literal: impl Into<String>) -> Self {
        self.key_predicates.push(KeyPredicate::new(property, literal));
        self
    }

    pub fn navigate(mut self, navigation: impl Into<String>) -> Self {
        self.navigation = Some(navigation.into());
        self
    }

    pub fn option(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn parse_options(&self) -> Result<QueryOptions, ODataSqlError> {
        QueryOptions::parse(&self.options)
    }
}
