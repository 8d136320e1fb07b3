use crate::Value;
use rust_decimal::Decimal;
use std::borrow::Cow;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion from native Rust types into the dynamically typed [`Value`]
/// representation that backs query parameters.
///
/// `as_empty_value` returns the NULL-like variant carrying only type
/// information, used for declared parameter prototypes and typed NULL binds.
pub trait AsValue {
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
}

macro_rules! impl_as_value {
    ($type:ty, $variant:ident) => {
        impl AsValue for $type {
            fn as_empty_value() -> Value {
                Value::$variant(None)
            }
            fn as_value(self) -> Value {
                Value::$variant(Some(self.into()))
            }
        }
    };
}

impl_as_value!(bool, Boolean);
impl_as_value!(i32, Int32);
impl_as_value!(i64, Int64);
impl_as_value!(f64, Float64);
impl_as_value!(Decimal, Decimal);
impl_as_value!(String, Varchar);
impl_as_value!(Date, Date);
impl_as_value!(Time, Time);
impl_as_value!(PrimitiveDateTime, Timestamp);
impl_as_value!(OffsetDateTime, TimestampWithTimezone);
impl_as_value!(Uuid, Uuid);

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_owned()))
    }
}

impl AsValue for Cow<'_, str> {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.into_owned()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
}

impl<T: AsValue> AsValue for Vec<T> {
    fn as_empty_value() -> Value {
        Value::List(None, Box::new(T::as_empty_value()))
    }
    fn as_value(self) -> Value {
        Value::List(
            Some(self.into_iter().map(AsValue::as_value).collect()),
            Box::new(T::as_empty_value()),
        )
    }
}

impl AsValue for Value {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        self
    }
}
