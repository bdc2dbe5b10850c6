//! Decoded column value.
use bytes::Bytes;
use uuid::Uuid;
use std::{
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
};

use crate::{
    binary::wide::{I256, U256},
    common::ByteStr,
};

/// A single decoded value.
///
/// Temporal and decimal variants hold the raw wire representation, a
/// [`Mapper`][crate::Mapper] decides what those columns actually produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    UInt128(u128),
    UInt256(U256),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Int128(i128),
    Int256(I256),
    Float32(f32),
    Float64(f64),
    String(ByteStr),
    FixedString(Bytes),
    /// Days since unix epoch, for both `Date` and `Date32`.
    Date(i32),
    /// Seconds since unix epoch.
    DateTime(u32),
    /// Ticks of `10^-precision` seconds since unix epoch.
    DateTime64 { ticks: i64, precision: u8 },
    Decimal(Decimal),
    Uuid(Uuid),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    Enum(ByteStr),
    Array(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Tuple(Vec<Value>),
    #[cfg(feature = "time")]
    TimeDate(time::Date),
    #[cfg(feature = "time")]
    TimeDateTime(time::OffsetDateTime),
}

impl Value {
    /// Return `true` if value is `NULL`.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Variant name, for diagnostic.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::UInt8(_) => "UInt8",
            Value::UInt16(_) => "UInt16",
            Value::UInt32(_) => "UInt32",
            Value::UInt64(_) => "UInt64",
            Value::UInt128(_) => "UInt128",
            Value::UInt256(_) => "UInt256",
            Value::Int8(_) => "Int8",
            Value::Int16(_) => "Int16",
            Value::Int32(_) => "Int32",
            Value::Int64(_) => "Int64",
            Value::Int128(_) => "Int128",
            Value::Int256(_) => "Int256",
            Value::Float32(_) => "Float32",
            Value::Float64(_) => "Float64",
            Value::String(_) => "String",
            Value::FixedString(_) => "FixedString",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::DateTime64 { .. } => "DateTime64",
            Value::Decimal(_) => "Decimal",
            Value::Uuid(_) => "UUID",
            Value::Ipv4(_) => "IPv4",
            Value::Ipv6(_) => "IPv6",
            Value::Enum(_) => "Enum",
            Value::Array(_) => "Array",
            Value::Map(_) => "Map",
            Value::Tuple(_) => "Tuple",
            #[cfg(feature = "time")]
            Value::TimeDate(_) => "Date",
            #[cfg(feature = "time")]
            Value::TimeDateTime(_) => "DateTime",
        }
    }

    /// Returns the str if value is `String` or `Enum`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }
}

/// Fixed point decimal, `mantissa * 10^-scale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    mantissa: I256,
    scale: u8,
}

impl Decimal {
    pub const fn new(mantissa: I256, scale: u8) -> Decimal {
        Decimal { mantissa, scale }
    }

    pub const fn mantissa(&self) -> I256 {
        self.mantissa
    }

    pub const fn scale(&self) -> u8 {
        self.scale
    }

    /// Split into whole and fractional digits, both without sign.
    ///
    /// The fractional part is zero padded to `scale` digits.
    pub fn parts(&self) -> (String, String) {
        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return (digits, String::new());
        }
        let digits = format!("{digits:0>width$}", width = scale + 1);
        let (whole, fraction) = digits.split_at(digits.len() - scale);
        (whole.to_owned(), fraction.to_owned())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (whole, fraction) = self.parts();
        if self.mantissa.is_negative() {
            f.write_str("-")?;
        }
        f.write_str(&whole)?;
        if !fraction.is_empty() {
            write!(f, ".{fraction}")?;
        }
        Ok(())
    }
}
