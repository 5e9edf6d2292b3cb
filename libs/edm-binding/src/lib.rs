// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Binds an OData entity data model (EDM) to relational tables.
//!
//! The EDM side ([`EdmModel`]) describes entity types, their keys, navigation properties and
//! associations. The generator that publishes the model also emits one [`TableMapping`]
//! document per type, naming the table and columns behind each property and the join columns
//! behind each association. [`TableBindings::from_mappings`] combines both, checks the result
//! against the physical schema ([`TableMetadataProvider`]), and exposes it through
//! [`EdmTableBindingProvider`], which is what the SQL builders consume.
//!
//! Bindings are resolved once, up front. A model that refers to a missing table, a missing
//! column, or join columns that do not line up is rejected before any query is translated.

mod binding;
mod binding_error;
mod edm_type;
mod edm_value;
mod mapping;
mod model;
mod provider;
mod schema;

pub use binding::{
    Aggregation, AssociationBinding, AssociationEndBinding, ComplexPropertyBinding,
    ComplexTypeBinding, EntityTypeBinding, MappingTableBinding, NavigationBinding,
    PropertyBinding,
};
pub use binding_error::BindingError;
pub use edm_type::{
    AggregateFunction, AggregationType, DataStructureType, EdmSimpleType, Multiplicity,
};
pub use edm_value::{CastError, EdmValue, parse_calendar, parse_time};
pub use mapping::{MappingTableReference, ReferenceMapping, TableMapping};
pub use model::{
    EdmAssociation, EdmAssociationEnd, EdmComplexType, EdmEntitySet, EdmEntityType, EdmModel,
    EdmNavigationProperty, EdmProperty, local_name,
};
pub use provider::{EdmTableBindingProvider, TableBindings, TableBindingsBuilder};
pub use schema::{PhysicalSchema, TableMetadata, TableMetadataProvider};
