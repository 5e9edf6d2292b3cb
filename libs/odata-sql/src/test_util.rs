// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![cfg(test)]

use std::sync::Arc;

use edm_binding::{
    AggregateFunction, AggregationType, AssociationBinding, AssociationEndBinding,
    ComplexTypeBinding, DataStructureType, EdmSimpleType, EntityTypeBinding, Multiplicity,
    TableBindings,
};

use crate::{SQLConfig, SQLQueryBuilder};

pub struct TestSetup {
    pub bindings: TableBindings,
    pub query_builder: SQLQueryBuilder,
}

impl TestSetup {
    pub fn with_setup(test_fn: impl Fn(TestSetup)) {
        let bindings = bindings();
        let query_builder = SQLQueryBuilder::new(Arc::new(bindings.clone()), SQLConfig::default());

        test_fn(TestSetup {
            bindings,
            query_builder,
        })
    }
}

fn bindings() -> TableBindings {
    TableBindings::builder()
        .entity_set(
            "MessageProcessingLogs",
            EntityTypeBinding::new("MessageProcessingLogType", "MPLHEADER")
                .with_fqn("org.example.mpl.MessageProcessingLogType")
                .key_property("MessageGuid", "MESSAGEGUID", EdmSimpleType::String)
                .property("LogStart", "LOGSTART", EdmSimpleType::DateTime)
                .property("LogEnd", "LOGEND", EdmSimpleType::DateTime)
                .property("Sender", "SENDER", EdmSimpleType::String)
                .property("Receiver", "RECEIVER", EdmSimpleType::String)
                .property("Status", "STATUS", EdmSimpleType::String),
        )
        .entity_set(
            "Entities4",
            EntityTypeBinding::new("Entity4Type", "ENTITY4_TABLE")
                .key_property("Id4_1", "ID4_1", EdmSimpleType::Int32)
                .key_property("Id4_2", "ID4_2", EdmSimpleType::Int32)
                .property("Id4_3", "ID4_3", EdmSimpleType::String),
        )
        .entity_set(
            "Entities6",
            EntityTypeBinding::new("Entity6Type", "ENTITY6_TABLE")
                .with_kind(DataStructureType::CalcView)
                .key_property("ID", "ID", EdmSimpleType::Int32)
                .property("NAME", "NAME", EdmSimpleType::String)
                .parameter("CurrentEmployeeId", EdmSimpleType::Int32)
                .parameter("CurrentEmployeeName", EdmSimpleType::String),
        )
        .entity_set(
            "Orders",
            EntityTypeBinding::new("OrderType", "ORDERS")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("Customer", "CUSTOMER", EdmSimpleType::String)
                .property("Total", "TOTAL", EdmSimpleType::Int64)
                .property("Status", "STATUS", EdmSimpleType::String)
                .navigation("Items", "Order_Items", "ItemType")
                .navigation("Buyer", "Customer_Orders", "CustomerType"),
        )
        .entity_set(
            "Items",
            EntityTypeBinding::new("ItemType", "ITEMS")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("OrderId", "ORDER_ID", EdmSimpleType::Int32)
                .property("Name", "NAME", EdmSimpleType::String)
                .property("Quantity", "QUANTITY", EdmSimpleType::Int32)
                .navigation("Order", "Order_Items", "OrderType"),
        )
        .entity_set(
            "Customers",
            EntityTypeBinding::new("CustomerType", "CUSTOMERS")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("Name", "NAME", EdmSimpleType::String)
                .navigation("Orders", "Customer_Orders", "OrderType"),
        )
        .entity_set(
            "Students",
            EntityTypeBinding::new("StudentType", "STUDENTS")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("Name", "NAME", EdmSimpleType::String)
                .navigation("Courses", "Student_Courses", "CourseType"),
        )
        .entity_set(
            "Courses",
            EntityTypeBinding::new("CourseType", "COURSES")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("Title", "TITLE", EdmSimpleType::String)
                .navigation("Students", "Student_Courses", "StudentType"),
        )
        .entity_set(
            "Persons",
            EntityTypeBinding::new("PersonType", "PERSONS")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .complex_property("Address", "AddressType", &["ID"]),
        )
        .entity_set(
            "Payments",
            EntityTypeBinding::new("PaymentType", "PAYMENTS")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("Region", "REGION", EdmSimpleType::String)
                .property("Number", "NUMBER", EdmSimpleType::Int32)
                .property("Amount", "AMOUNT", EdmSimpleType::Int64)
                .with_aggregation(
                    AggregationType::Derived,
                    &[
                        ("NUMBER", AggregateFunction::Sum),
                        ("AMOUNT", AggregateFunction::Avg),
                    ],
                ),
        )
        .entity_set(
            "Invoices",
            EntityTypeBinding::new("InvoiceType", "INVOICES")
                .key_property("Id", "ID", EdmSimpleType::Int32)
                .property("Amount", "AMOUNT", EdmSimpleType::Int64)
                .with_key_generated("ID"),
        )
        .association(AssociationBinding::new(
            "Order_Items",
            AssociationEndBinding::new("OrderType", Multiplicity::One, &["ID"]),
            AssociationEndBinding::new("ItemType", Multiplicity::Many, &["ORDER_ID"]),
        ))
        .association(AssociationBinding::new(
            "Customer_Orders",
            AssociationEndBinding::new("CustomerType", Multiplicity::ZeroToOne, &["ID"]),
            AssociationEndBinding::new("OrderType", Multiplicity::Many, &["CUSTOMER_ID"]),
        ))
        .association(
            AssociationBinding::new(
                "Student_Courses",
                AssociationEndBinding::new("StudentType", Multiplicity::Many, &["ID"]),
                AssociationEndBinding::new("CourseType", Multiplicity::Many, &["ID"]),
            )
            .with_mapping_table("ENROLLMENTS", &["STUDENT_ID"], &["COURSE_ID"]),
        )
        .complex_type(
            ComplexTypeBinding::new("AddressType", "ADDRESSES", &["PERSON_ID"])
                .property("Street", "STREET", EdmSimpleType::String)
                .property("City", "CITY", EdmSimpleType::String),
        )
        .build()
        .expect("Test bindings must be valid")
}
