// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! Binding [`SQLParam`]s onto the positional slots of a prepared statement.

use std::{
    fmt::Display,
    sync::Arc,
};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use edm_binding::{CastError, EdmSimpleType, EdmValue};
use pg_bigdecimal::{BigDecimal, PgNumeric};
use thiserror::Error;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use tracing::trace;
use uuid::Uuid;

use crate::sql::SQLParam;

#[derive(Error, Debug)]
pub enum BindError {
    #[error("Cannot bind parameter {index} as {edm_type}: {source}")]
    Cast {
        index: usize,
        edm_type: EdmSimpleType,
        #[source]
        source: CastError,
    },

    #[error("Cannot bind {value} to parameter {index} of type {edm_type}")]
    Mismatch {
        index: usize,
        edm_type: EdmSimpleType,
        value: String,
    },
}

/// The typed setters of a prepared statement. `index` is the zero-based position of the `?`
/// placeholder.
pub trait StatementParameters {
    fn set_null(&mut self, index: usize, edm_type: EdmSimpleType);
    fn set_boolean(&mut self, index: usize, value: bool);
    fn set_byte(&mut self, index: usize, value: i8);
    fn set_short(&mut self, index: usize, value: i16);
    fn set_int(&mut self, index: usize, value: i32);
    fn set_long(&mut self, index: usize, value: i64);
    fn set_float(&mut self, index: usize, value: f32);
    fn set_double(&mut self, index: usize, value: f64);
    fn set_decimal(&mut self, index: usize, value: BigDecimal);
    fn set_string(&mut self, index: usize, value: String);
    fn set_uuid(&mut self, index: usize, value: Uuid);
    fn set_bytes(&mut self, index: usize, value: Vec<u8>);
    fn set_time(&mut self, index: usize, value: NaiveTime);
    fn set_timestamp(&mut self, index: usize, value: NaiveDateTime);
    fn set_date(&mut self, index: usize, value: NaiveDate);
}

/// Bind `params` to consecutive slots, starting at the first.
pub fn bind_params(
    slots: &mut dyn StatementParameters,
    params: &[SQLParam],
) -> Result<(), BindError> {
    params
        .iter()
        .enumerate()
        .try_for_each(|(index, param)| bind_param(slots, index, param))
}

/// Bind one parameter with the setter that matches its EDM type.
///
/// The value is first converted to that type. `Edm.Byte` is unsigned and so goes through the
/// short setter, while `Edm.SByte` uses the byte setter. The temporal types all carry an
/// instant: `Edm.Time` binds its time of day, `Edm.DateTime` a timestamp and `Edm.DateTimeOffset`
/// the (UTC) date.
pub fn bind_param(
    slots: &mut dyn StatementParameters,
    index: usize,
    param: &SQLParam,
) -> Result<(), BindError> {
    let edm_type = param.edm_type;
    trace!(index, %edm_type, "Binding parameter");

    if param.value.is_null() || edm_type == EdmSimpleType::Null {
        slots.set_null(index, edm_type);
        return Ok(());
    }

    let value = param
        .value
        .coerce_to(edm_type)
        .map_err(|source| BindError::Cast {
            index,
            edm_type,
            source,
        })?;

    match (edm_type, value) {
        (EdmSimpleType::Boolean, EdmValue::Boolean(v)) => slots.set_boolean(index, v),
        (EdmSimpleType::Byte, EdmValue::Byte(v)) => slots.set_short(index, i16::from(v)),
        (EdmSimpleType::SByte, EdmValue::SByte(v)) => slots.set_byte(index, v),
        (EdmSimpleType::Int16, EdmValue::Int16(v)) => slots.set_short(index, v),
        (EdmSimpleType::Int32, EdmValue::Int32(v)) => slots.set_int(index, v),
        (EdmSimpleType::Int64, EdmValue::Int64(v)) => slots.set_long(index, v),
        (EdmSimpleType::Single, EdmValue::Single(v)) => slots.set_float(index, v),
        (EdmSimpleType::Double, EdmValue::Double(v)) => slots.set_double(index, v),
        (EdmSimpleType::Decimal, EdmValue::Decimal(v)) => slots.set_decimal(index, v),
        (EdmSimpleType::String, EdmValue::String(v)) => slots.set_string(index, v),
        (EdmSimpleType::Guid, EdmValue::Guid(v)) => slots.set_uuid(index, v),
        (EdmSimpleType::Binary, EdmValue::Binary(v)) => slots.set_bytes(index, v),
        (EdmSimpleType::Time, EdmValue::Calendar(instant)) => {
            slots.set_time(index, instant.naive_utc().time())
        }
        (EdmSimpleType::DateTime, EdmValue::Calendar(instant)) => {
            slots.set_timestamp(index, instant.naive_utc())
        }
        (EdmSimpleType::DateTimeOffset, EdmValue::Calendar(instant)) => {
            slots.set_date(index, instant.naive_utc().date())
        }
        (edm_type, value) => {
            return Err(BindError::Mismatch {
                index,
                edm_type,
                value: value.to_string(),
            });
        }
    }
    Ok(())
}

/// Newtype for values bound to a `tokio-postgres` statement. `Arc<dyn ToSql>` cannot implement
/// `ToSql` itself since `Arc` is not a `#[fundamental]` type.
#[derive(Clone, Debug)]
pub struct SQLParamContainer(Arc<dyn ToSql + Send + Sync>);

impl SQLParamContainer {
    pub fn new<T: ToSql + Send + Sync + 'static>(param: T) -> Self {
        Self(Arc::new(param))
    }
}

impl ToSql for SQLParamContainer {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        self.0.as_ref().to_sql_checked(ty, out)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

impl Display for SQLParamContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// A null that fits a column of any type
#[derive(Debug)]
struct SqlNull;

impl ToSql for SqlNull {
    fn to_sql(
        &self,
        _ty: &Type,
        _out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        Ok(IsNull::Yes)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Parameters for a `tokio-postgres` query over [`SQLStatement::numbered_sql`](crate::SQLStatement::numbered_sql).
#[derive(Debug, Default)]
pub struct PostgresParameters {
    params: Vec<SQLParamContainer>,
}

impl PostgresParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_params(params: &[SQLParam]) -> Result<Self, BindError> {
        let mut parameters = Self::new();
        bind_params(&mut parameters, params)?;
        Ok(parameters)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn params(&self) -> &[SQLParamContainer] {
        &self.params
    }

    /// In the shape `tokio_postgres::Client::query` expects
    pub fn as_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params
            .iter()
            .map(|param| param as &(dyn ToSql + Sync))
            .collect()
    }

    fn set<T: ToSql + Send + Sync + 'static>(&mut self, index: usize, value: T) {
        if index >= self.params.len() {
            self.params
                .resize_with(index + 1, || SQLParamContainer::new(SqlNull));
        }
        self.params[index] = SQLParamContainer::new(value);
    }
}

impl StatementParameters for PostgresParameters {
    fn set_null(&mut self, index: usize, _edm_type: EdmSimpleType) {
        self.set(index, SqlNull);
    }

    fn set_boolean(&mut self, index: usize, value: bool) {
        self.set(index, value);
    }

    fn set_byte(&mut self, index: usize, value: i8) {
        self.set(index, value);
    }

    fn set_short(&mut self, index: usize, value: i16) {
        self.set(index, value);
    }

    fn set_int(&mut self, index: usize, value: i32) {
        self.set(index, value);
    }

    fn set_long(&mut self, index: usize, value: i64) {
        self.set(index, value);
    }

    fn set_float(&mut self, index: usize, value: f32) {
        self.set(index, value);
    }

    fn set_double(&mut self, index: usize, value: f64) {
        self.set(index, value);
    }

    fn set_decimal(&mut self, index: usize, value: BigDecimal) {
        self.set(index, PgNumeric { n: Some(value) });
    }

    fn set_string(&mut self, index: usize, value: String) {
        self.set(index, value);
    }

    fn set_uuid(&mut self, index: usize, value: Uuid) {
        self.set(index, value);
    }

    fn set_bytes(&mut self, index: usize, value: Vec<u8>) {
        self.set(index, value);
    }

    fn set_time(&mut self, index: usize, value: NaiveTime) {
        self.set(index, value);
    }

    fn set_timestamp(&mut self, index: usize, value: NaiveDateTime) {
        self.set(index, value);
    }

    fn set_date(&mut self, index: usize, value: NaiveDate) {
        self.set(index, value);
    }
}
