use rust_decimal::Decimal;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Dynamically typed value moved between native Rust types and query parameters.
///
/// Every variant carries an `Option` payload so the same enum doubles as a type
/// prototype: a `None` payload describes a typed SQL NULL (or the declared type
/// of a method parameter) without holding data.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    TimestampWithTimezone(Option<OffsetDateTime>),
    Uuid(Option<Uuid>),
    List(Option<Vec<Value>>, /* type: */ Box<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Time(l), Self::Time(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::TimestampWithTimezone(l), Self::TimestampWithTimezone(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            (Self::List(l, ..), Self::List(r, ..)) => l == r && self.same_type(other),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(.., l), Self::List(.., r)) => l.same_type(r),
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::TimestampWithTimezone(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
            Value::List(v, ..) => v.is_none(),
        }
    }

    /// Whether the value can participate in LIKE patterns and UPPER() wrapping.
    pub fn is_textual(&self) -> bool {
        matches!(self, Value::Varchar(..))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Value::List(..))
    }

    /// The same variant with its payload removed, usable as a type hint.
    pub fn prototype(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Boolean(..) => Value::Boolean(None),
            Value::Int32(..) => Value::Int32(None),
            Value::Int64(..) => Value::Int64(None),
            Value::Float64(..) => Value::Float64(None),
            Value::Decimal(..) => Value::Decimal(None),
            Value::Varchar(..) => Value::Varchar(None),
            Value::Date(..) => Value::Date(None),
            Value::Time(..) => Value::Time(None),
            Value::Timestamp(..) => Value::Timestamp(None),
            Value::TimestampWithTimezone(..) => Value::TimestampWithTimezone(None),
            Value::Uuid(..) => Value::Uuid(None),
            Value::List(.., t) => Value::List(None, t.clone()),
        }
    }

    /// Human readable type label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Boolean(..) => "Boolean",
            Value::Int32(..) => "Int32",
            Value::Int64(..) => "Int64",
            Value::Float64(..) => "Float64",
            Value::Decimal(..) => "Decimal",
            Value::Varchar(..) => "Varchar",
            Value::Date(..) => "Date",
            Value::Time(..) => "Time",
            Value::Timestamp(..) => "Timestamp",
            Value::TimestampWithTimezone(..) => "TimestampWithTimezone",
            Value::Uuid(..) => "Uuid",
            Value::List(..) => "List",
        }
    }
}
