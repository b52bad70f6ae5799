//! Type coercion table
//!
//! Maps host field types onto the closed set of [`WireType`]s. The same
//! mapping is used when binding parameters and when picking the typed reader
//! accessor for a result column, so a value always travels through the same
//! wire type in both directions.

use std::fmt;

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};

/// Closed set of types exchanged with the database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    String,
    Int32,
    Int64,
    DateTime2,
    Double,
    Boolean,
    VarBinary,
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::String => "String",
            WireType::Int32 => "Int32",
            WireType::Int64 => "Int64",
            WireType::DateTime2 => "DateTime2",
            WireType::Double => "Double",
            WireType::Boolean => "Boolean",
            WireType::VarBinary => "VarBinary",
        };
        f.write_str(name)
    }
}

/// A single value on the wire. Nulls keep their wire type so they can be
/// bound as typed DB-null parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null(WireType),
    String(String),
    Int32(i32),
    Int64(i64),
    DateTime(NaiveDateTime),
    Double(f64),
    Boolean(bool),
    Bytes(Vec<u8>),
}

impl Value {
    /// Wire type this value is bound as
    pub fn wire_type(&self) -> WireType {
        match self {
            Value::Null(wire) => *wire,
            Value::String(_) => WireType::String,
            Value::Int32(_) => WireType::Int32,
            Value::Int64(_) => WireType::Int64,
            Value::DateTime(_) => WireType::DateTime2,
            Value::Double(_) => WireType::Double,
            Value::Boolean(_) => WireType::Boolean,
            Value::Bytes(_) => WireType::VarBinary,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null(_))
    }

    /// JSON rendering, used when tracing bound parameters
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null(_) => JsonValue::Null,
            Value::String(s) => JsonValue::String(s.clone()),
            Value::Int32(i) => JsonValue::from(*i),
            Value::Int64(i) => JsonValue::from(*i),
            Value::DateTime(dt) => JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Double(f) => serde_json::Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Value::Boolean(b) => JsonValue::Bool(*b),
            Value::Bytes(b) => JsonValue::Array(b.iter().map(|&x| JsonValue::from(x)).collect()),
        }
    }

    fn mismatch(&self, expected: WireType) -> ModelError {
        ModelError::Decode(format!(
            "expected a {} value, found {}",
            expected,
            self.wire_type()
        ))
    }
}

/// Host types with a fixed wire type
pub trait SqlType: Sized {
    /// Wire type used for binding and decoding
    const WIRE_TYPE: WireType;

    /// Whether the host type can hold a null
    const NULLABLE: bool = false;

    fn to_value(&self) -> Value;

    fn from_value(value: Value) -> ModelResult<Self>;
}

impl SqlType for String {
    const WIRE_TYPE: WireType = WireType::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

impl SqlType for i32 {
    const WIRE_TYPE: WireType = WireType::Int32;

    fn to_value(&self) -> Value {
        Value::Int32(*self)
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Int32(v) => Ok(v),
            Value::Int64(v) => i32::try_from(v)
                .map_err(|_| ModelError::Decode(format!("{} does not fit in Int32", v))),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

impl SqlType for i64 {
    const WIRE_TYPE: WireType = WireType::Int64;

    fn to_value(&self) -> Value {
        Value::Int64(*self)
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Int64(v) => Ok(v),
            Value::Int32(v) => Ok(i64::from(v)),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

impl SqlType for NaiveDateTime {
    const WIRE_TYPE: WireType = WireType::DateTime2;

    fn to_value(&self) -> Value {
        Value::DateTime(*self)
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

impl SqlType for f64 {
    const WIRE_TYPE: WireType = WireType::Double;

    fn to_value(&self) -> Value {
        Value::Double(*self)
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Double(v) => Ok(v),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

impl SqlType for bool {
    const WIRE_TYPE: WireType = WireType::Boolean;

    fn to_value(&self) -> Value {
        Value::Boolean(*self)
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

impl SqlType for Vec<u8> {
    const WIRE_TYPE: WireType = WireType::VarBinary;

    fn to_value(&self) -> Value {
        Value::Bytes(self.clone())
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(other.mismatch(Self::WIRE_TYPE)),
        }
    }
}

// Nullable types share the wire type of the type they wrap.
impl<T: SqlType> SqlType for Option<T> {
    const WIRE_TYPE: WireType = T::WIRE_TYPE;
    const NULLABLE: bool = true;

    fn to_value(&self) -> Value {
        match self {
            Some(inner) => inner.to_value(),
            None => Value::Null(T::WIRE_TYPE),
        }
    }

    fn from_value(value: Value) -> ModelResult<Self> {
        match value {
            Value::Null(_) => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Enumerations stored as their Int32 ordinal
///
/// Implement through [`sql_enum!`](crate::sql_enum), which also provides the
/// [`SqlType`] impl and the `Value` conversion.
pub trait SqlEnum: Sized + Copy {
    fn ordinal(self) -> i32;

    fn from_ordinal(ordinal: i32) -> Option<Self>;
}

/// Decode an enum ordinal, failing on values with no matching variant
pub fn enum_from_value<E: SqlEnum>(value: Value, type_name: &str) -> ModelResult<E> {
    let ordinal = i32::from_value(value)?;
    E::from_ordinal(ordinal).ok_or_else(|| {
        ModelError::Decode(format!("{} is not a valid {} ordinal", ordinal, type_name))
    })
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int32(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int64(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Bytes(value.to_vec())
    }
}

impl<T: SqlType> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.to_value()
    }
}

/// Build an argument list for `where_sql` and the raw execution methods.
///
/// ```ignore
/// query.where_sql("Name = $ AND Price > $", args!["A", 9.5])
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}

/// Map an enum onto its Int32 ordinal.
///
/// ```ignore
/// sql_enum! { Status { Draft = 0, Published = 1 } }
/// ```
#[macro_export]
macro_rules! sql_enum {
    ($ty:ident { $($variant:ident = $ordinal:literal),+ $(,)? }) => {
        impl $crate::SqlEnum for $ty {
            fn ordinal(self) -> i32 {
                match self {
                    $($ty::$variant => $ordinal,)+
                }
            }

            fn from_ordinal(ordinal: i32) -> ::std::option::Option<Self> {
                match ordinal {
                    $($ordinal => ::std::option::Option::Some($ty::$variant),)+
                    _ => ::std::option::Option::None,
                }
            }
        }

        impl $crate::SqlType for $ty {
            const WIRE_TYPE: $crate::WireType = $crate::WireType::Int32;

            fn to_value(&self) -> $crate::Value {
                $crate::Value::Int32($crate::SqlEnum::ordinal(*self))
            }

            fn from_value(value: $crate::Value) -> $crate::ModelResult<Self> {
                $crate::types::enum_from_value(value, stringify!($ty))
            }
        }

        impl ::std::convert::From<$ty> for $crate::Value {
            fn from(value: $ty) -> Self {
                $crate::Value::Int32($crate::SqlEnum::ordinal(value))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Status {
        Draft,
        Published,
    }

    crate::sql_enum! { Status { Draft = 0, Published = 1 } }

    #[test]
    fn test_wire_types_of_host_types() {
        assert_eq!(<String as SqlType>::WIRE_TYPE, WireType::String);
        assert_eq!(<i32 as SqlType>::WIRE_TYPE, WireType::Int32);
        assert_eq!(<i64 as SqlType>::WIRE_TYPE, WireType::Int64);
        assert_eq!(<NaiveDateTime as SqlType>::WIRE_TYPE, WireType::DateTime2);
        assert_eq!(<f64 as SqlType>::WIRE_TYPE, WireType::Double);
        assert_eq!(<bool as SqlType>::WIRE_TYPE, WireType::Boolean);
        assert_eq!(<Vec<u8> as SqlType>::WIRE_TYPE, WireType::VarBinary);
        assert_eq!(<Status as SqlType>::WIRE_TYPE, WireType::Int32);
    }

    #[test]
    fn test_nullable_unwraps_to_inner_wire_type() {
        assert_eq!(<Option<f64> as SqlType>::WIRE_TYPE, WireType::Double);
        assert!(<Option<f64> as SqlType>::NULLABLE);
        assert!(!<f64 as SqlType>::NULLABLE);
        assert_eq!(None::<f64>.to_value(), Value::Null(WireType::Double));
        assert_eq!(Some(9.99).to_value(), Value::Double(9.99));
    }

    #[test]
    fn test_nullable_decoding() {
        assert_eq!(Option::<String>::from_value(Value::Null(WireType::String)).unwrap(), None);
        assert_eq!(
            Option::<String>::from_value(Value::String("a".into())).unwrap(),
            Some("a".to_string())
        );
    }

    #[test]
    fn test_integer_widening_and_narrowing() {
        assert_eq!(i64::from_value(Value::Int32(7)).unwrap(), 7);
        assert_eq!(i32::from_value(Value::Int64(7)).unwrap(), 7);
        assert!(matches!(
            i32::from_value(Value::Int64(i64::MAX)),
            Err(ModelError::Decode(_))
        ));
    }

    #[test]
    fn test_mismatched_value_is_rejected() {
        let err = bool::from_value(Value::String("yes".into())).unwrap_err();
        assert_eq!(
            err,
            ModelError::Decode("expected a Boolean value, found String".to_string())
        );
    }

    #[test]
    fn test_enum_ordinals() {
        assert_eq!(Status::Published.to_value(), Value::Int32(1));
        assert_eq!(Status::from_value(Value::Int32(0)).unwrap(), Status::Draft);
        assert!(matches!(
            Status::from_value(Value::Int32(9)),
            Err(ModelError::Decode(msg)) if msg.contains("Status")
        ));
        assert_eq!(Value::from(Status::Draft), Value::Int32(0));
    }

    #[test]
    fn test_args_macro() {
        let when = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let values = crate::args![5, "x", 2_i64, when, None::<i32>, vec![1_u8, 2]];
        assert_eq!(
            values,
            vec![
                Value::Int32(5),
                Value::String("x".into()),
                Value::Int64(2),
                Value::DateTime(when),
                Value::Null(WireType::Int32),
                Value::Bytes(vec![1, 2]),
            ]
        );
        assert!(crate::args![].is_empty());
    }

    #[test]
    fn test_json_rendering() {
        assert_eq!(Value::Int64(3).to_json(), serde_json::json!(3));
        assert_eq!(Value::Null(WireType::String).to_json(), JsonValue::Null);
        assert_eq!(Value::Boolean(true).to_json(), serde_json::json!(true));
    }
}
