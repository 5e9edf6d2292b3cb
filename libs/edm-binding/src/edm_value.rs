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
use std::sync::LazyLock;

use chrono::prelude::*;
use pg_bigdecimal::BigDecimal;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

use crate::EdmSimpleType;

const NAIVE_DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_TIME_FORMAT: &str = "%H:%M:%S%.f";
const NAIVE_TIME_MINUTES_FORMAT: &str = "%H:%M";

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?$").expect("valid duration regex")
});

#[derive(Debug, Error)]
pub enum CastError {
    #[error("{0}")]
    Generic(String),

    #[error("{0}")]
    Date(String, #[source] chrono::format::ParseError),

    #[error("{0}")]
    Uuid(#[from] uuid::Error),

    #[error("{0}")]
    BigDecimal(String),

    #[error("Unsupported EDM type {0}")]
    UnsupportedType(String),

    #[error("Cannot convert {value} to {target}")]
    Mismatch { value: String, target: EdmSimpleType },
}

/// A typed literal value: a key predicate, a `$filter` literal, or a payload entry.
///
/// Time-valued literals (`Edm.Time`, `Edm.DateTime`, `Edm.DateTimeOffset`) share the
/// [`EdmValue::Calendar`] representation (an instant in UTC); the declared EDM type decides how
/// the instant is bound.
#[derive(Debug, Clone, PartialEq)]
pub enum EdmValue {
    Null,
    Boolean(bool),
    Byte(u8),
    SByte(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Single(f32),
    Double(f64),
    Decimal(BigDecimal),
    String(String),
    Guid(Uuid),
    Binary(Vec<u8>),
    Calendar(DateTime<Utc>),
}

enum Number {
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
}

impl EdmValue {
    /// The type a literal of this shape has when nothing else is known about it.
    pub fn natural_type(&self) -> EdmSimpleType {
        match self {
            EdmValue::Null => EdmSimpleType::Null,
            EdmValue::Boolean(_) => EdmSimpleType::Boolean,
            EdmValue::Byte(_) => EdmSimpleType::Byte,
            EdmValue::SByte(_) => EdmSimpleType::SByte,
            EdmValue::Int16(_) => EdmSimpleType::Int16,
            EdmValue::Int32(_) => EdmSimpleType::Int32,
            EdmValue::Int64(_) => EdmSimpleType::Int64,
            EdmValue::Single(_) => EdmSimpleType::Single,
            EdmValue::Double(_) => EdmSimpleType::Double,
            EdmValue::Decimal(_) => EdmSimpleType::Decimal,
            EdmValue::String(_) => EdmSimpleType::String,
            EdmValue::Guid(_) => EdmSimpleType::Guid,
            EdmValue::Binary(_) => EdmSimpleType::Binary,
            EdmValue::Calendar(_) => EdmSimpleType::DateTime,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, EdmValue::Null)
    }

    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            EdmValue::Calendar(instant) => Some(instant.timestamp_millis()),
            _ => None,
        }
    }

    /// Convert this value so that it can be bound as `target`. Numeric values widen freely and
    /// narrow only when in range; strings are parsed.
    pub fn coerce_to(&self, target: EdmSimpleType) -> Result<EdmValue, CastError> {
        match (self, target) {
            (EdmValue::Null, _) | (_, EdmSimpleType::Null) => Ok(EdmValue::Null),
            (EdmValue::String(_), EdmSimpleType::String) => Ok(self.clone()),
            (EdmValue::String(string), _) => parse_string(string, target),
            (EdmValue::Boolean(_), EdmSimpleType::Boolean) => Ok(self.clone()),
            (EdmValue::Guid(_), EdmSimpleType::Guid) => Ok(self.clone()),
            (EdmValue::Guid(guid), EdmSimpleType::String) => Ok(EdmValue::String(guid.to_string())),
            (EdmValue::Binary(_), EdmSimpleType::Binary) => Ok(self.clone()),
            (EdmValue::Calendar(_), target) if target.is_temporal() => Ok(self.clone()),
            (_, target) if target.is_numeric() => self.cast_number(target),
            _ => Err(self.mismatch(target)),
        }
    }

    fn cast_number(&self, target: EdmSimpleType) -> Result<EdmValue, CastError> {
        let number = match self {
            EdmValue::Byte(v) => Number::Integer(*v as i64),
            EdmValue::SByte(v) => Number::Integer(*v as i64),
            EdmValue::Int16(v) => Number::Integer(*v as i64),
            EdmValue::Int32(v) => Number::Integer(*v as i64),
            EdmValue::Int64(v) => Number::Integer(*v),
            EdmValue::Single(v) => Number::Float(*v as f64),
            EdmValue::Double(v) => Number::Float(*v),
            EdmValue::Decimal(v) => Number::Decimal(v.clone()),
            _ => return Err(self.mismatch(target)),
        };

        cast_number(number, target)
    }

    fn mismatch(&self, target: EdmSimpleType) -> CastError {
        CastError::Mismatch {
            value: self.to_string(),
            target,
        }
    }
}

fn cast_number(number: Number, target: EdmSimpleType) -> Result<EdmValue, CastError> {
    let value = match target {
        EdmSimpleType::Byte => EdmValue::Byte(narrow(to_integer(&number)?, target)?),
        EdmSimpleType::SByte => EdmValue::SByte(narrow(to_integer(&number)?, target)?),
        EdmSimpleType::Int16 => EdmValue::Int16(narrow(to_integer(&number)?, target)?),
        EdmSimpleType::Int32 => EdmValue::Int32(narrow(to_integer(&number)?, target)?),
        EdmSimpleType::Int64 => EdmValue::Int64(to_integer(&number)?),
        EdmSimpleType::Single => EdmValue::Single(to_float(&number)? as f32),
        EdmSimpleType::Double => EdmValue::Double(to_float(&number)?),
        EdmSimpleType::Decimal => EdmValue::Decimal(match number {
            Number::Integer(v) => BigDecimal::from(v),
            Number::Float(v) => parse_decimal(&v.to_string())?,
            Number::Decimal(v) => v,
        }),
        _ => {
            return Err(CastError::Generic(format!(
                "Unexpected destination type {target} for a number value"
            )));
        }
    };

    Ok(value)
}

fn to_integer(number: &Number) -> Result<i64, CastError> {
    match number {
        Number::Integer(v) => Ok(*v),
        Number::Float(v) if !v.is_finite() || v.fract() != 0.0 => Err(CastError::Generic(
            format!("Cannot use the fractional number {v} as an integer"),
        )),
        // `i64::MAX as f64` rounds up to 2^63, which is itself out of range
        Number::Float(v) if *v >= i64::MIN as f64 && *v < i64::MAX as f64 => Ok(*v as i64),
        Number::Float(v) => Err(CastError::Generic(format!(
            "Integer overflow: {v} is out of range for {}",
            EdmSimpleType::Int64
        ))),
        Number::Decimal(v) => i64::from_str(&v.to_string()).map_err(|_| {
            CastError::Generic(format!("Cannot use the decimal {v} as an integer"))
        }),
    }
}

fn to_float(number: &Number) -> Result<f64, CastError> {
    match number {
        Number::Integer(v) => Ok(*v as f64),
        Number::Float(v) => Ok(*v),
        Number::Decimal(v) => f64::from_str(&v.to_string())
            .map_err(|_| CastError::Generic(format!("Failed to cast {v} to a float"))),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64, target: EdmSimpleType) -> Result<T, CastError> {
    T::try_from(value).map_err(|_| {
        CastError::Generic(format!(
            "Integer overflow: {value} is out of range for {target}"
        ))
    })
}

fn parse_decimal(string: &str) -> Result<BigDecimal, CastError> {
    BigDecimal::from_str(string)
        .map_err(|_| CastError::BigDecimal(format!("Could not parse {string} into a decimal")))
}

fn parse_string(string: &str, target: EdmSimpleType) -> Result<EdmValue, CastError> {
    let value = match target {
        EdmSimpleType::Boolean => match string {
            "true" | "1" => EdmValue::Boolean(true),
            "false" | "0" => EdmValue::Boolean(false),
            _ => {
                return Err(CastError::Generic(format!(
                    "Could not parse {string} as a boolean"
                )));
            }
        },
        EdmSimpleType::Byte
        | EdmSimpleType::SByte
        | EdmSimpleType::Int16
        | EdmSimpleType::Int32
        | EdmSimpleType::Int64 => {
            let integer = i64::from_str(string.trim()).map_err(|_| {
                CastError::Generic(format!("Could not parse {string} as an integer"))
            })?;
            cast_number(Number::Integer(integer), target)?
        }
        EdmSimpleType::Single | EdmSimpleType::Double => {
            let float = f64::from_str(string.trim()).map_err(|_| {
                CastError::Generic(format!("Could not parse {string} as a floating point number"))
            })?;
            cast_number(Number::Float(float), target)?
        }
        EdmSimpleType::Decimal => EdmValue::Decimal(parse_decimal(string.trim())?),
        EdmSimpleType::Guid => EdmValue::Guid(Uuid::parse_str(string)?),
        EdmSimpleType::Time => EdmValue::Calendar(parse_time(string)?),
        EdmSimpleType::DateTime | EdmSimpleType::DateTimeOffset => {
            EdmValue::Calendar(parse_calendar(string)?)
        }
        EdmSimpleType::String => EdmValue::String(string.to_string()),
        EdmSimpleType::Binary => EdmValue::Binary(string.as_bytes().to_vec()),
        EdmSimpleType::Null => EdmValue::Null,
    };

    Ok(value)
}

/// Parse a date-time literal. Offsets are honored; values without an offset are taken as UTC.
pub fn parse_calendar(string: &str) -> Result<DateTime<Utc>, CastError> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(string) {
        return Ok(datetime.with_timezone(&Utc));
    }

    let naive_datetime = NaiveDateTime::parse_from_str(
        string,
        &format!("{NAIVE_DATE_FORMAT}T{NAIVE_TIME_FORMAT}"),
    )
    .or_else(|_| {
        NaiveDateTime::parse_from_str(
            string,
            &format!("{NAIVE_DATE_FORMAT}T{NAIVE_TIME_MINUTES_FORMAT}"),
        )
    });

    match naive_datetime {
        Ok(naive_datetime) => Ok(naive_datetime.and_utc()),
        Err(_) => {
            let date = NaiveDate::parse_from_str(string, NAIVE_DATE_FORMAT).map_err(|e| {
                CastError::Date(format!("Could not parse {string} as a valid date-time"), e)
            })?;
            Ok(date.and_time(NaiveTime::MIN).and_utc())
        }
    }
}

/// Parse a time-of-day literal, either as an ISO-8601 duration (`PT13H20M`) or as `13:20:00`.
/// The result is that time on the epoch day.
pub fn parse_time(string: &str) -> Result<DateTime<Utc>, CastError> {
    let time = match DURATION_REGEX.captures(string) {
        Some(captures) => {
            let component = |index: usize| -> Result<f64, CastError> {
                captures
                    .get(index)
                    .map(|m| {
                        f64::from_str(m.as_str()).map_err(|_| {
                            CastError::Generic(format!("Invalid duration component in {string}"))
                        })
                    })
                    .unwrap_or(Ok(0.0))
            };
            let millis = (component(1)? * 3_600_000.0
                + component(2)? * 60_000.0
                + component(3)? * 1000.0)
                .round() as i64;

            DateTime::<Utc>::from_timestamp_millis(millis)
                .ok_or_else(|| CastError::Generic(format!("Time {string} is out of range")))?
        }
        None => {
            let time = NaiveTime::parse_from_str(string, NAIVE_TIME_FORMAT)
                .or_else(|_| NaiveTime::parse_from_str(string, NAIVE_TIME_MINUTES_FORMAT))
                .map_err(|e| {
                    CastError::Date(format!("Could not parse {string} as a valid time"), e)
                })?;
            NaiveDate::default().and_time(time).and_utc()
        }
    };

    Ok(time)
}

impl Display for EdmValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdmValue::Null => f.write_str("null"),
            EdmValue::Boolean(v) => write!(f, "{v}"),
            EdmValue::Byte(v) => write!(f, "{v}"),
            EdmValue::SByte(v) => write!(f, "{v}"),
            EdmValue::Int16(v) => write!(f, "{v}"),
            EdmValue::Int32(v) => write!(f, "{v}"),
            EdmValue::Int64(v) => write!(f, "{v}"),
            EdmValue::Single(v) => write!(f, "{v}"),
            EdmValue::Double(v) => write!(f, "{v}"),
            EdmValue::Decimal(v) => write!(f, "{v}"),
            EdmValue::String(v) => write!(f, "'{v}'"),
            EdmValue::Guid(v) => write!(f, "guid'{v}'"),
            EdmValue::Binary(v) => write!(f, "binary({} bytes)", v.len()),
            EdmValue::Calendar(v) => write!(f, "datetime'{}'", v.to_rfc3339()),
        }
    }
}

macro_rules! impl_from {
    ($($source:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$source> for EdmValue {
                fn from(value: $source) -> Self {
                    EdmValue::$variant(value)
                }
            }
        )*
    };
}

impl_from!(
    bool => Boolean,
    u8 => Byte,
    i8 => SByte,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Single,
    f64 => Double,
    BigDecimal => Decimal,
    String => String,
    Uuid => Guid,
    Vec<u8> => Binary,
    DateTime<Utc> => Calendar,
);

impl From<&str> for EdmValue {
    fn from(value: &str) -> Self {
        EdmValue::String(value.to_string())
    }
}

impl<T: Into<EdmValue>> From<Option<T>> for EdmValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(EdmValue::Null)
    }
}
