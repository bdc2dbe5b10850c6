//! Pluggable representation of temporal and decimal values.
//!
//! The binary decoders only know the raw integer carried on the wire. A
//! [`Mapper`] is handed that raw representation and decides which [`Value`]
//! the column produces, so the same decoder serves different output types.
use crate::value::{Decimal, Value};

/// Maps raw temporal and decimal representation into application value.
///
/// Every method has a default that keeps the raw representation. Implementor
/// should be pure, the same input must always map to the same value.
pub trait Mapper: Send + Sync {
    /// `Date` and `Date32` columns, days since unix epoch.
    fn date(&self, days: i32) -> Value {
        Value::Date(days)
    }

    /// `DateTime` columns, seconds since unix epoch.
    fn date_time(&self, seconds: u32, timezone: Option<&str>) -> Value {
        let _ = timezone;
        Value::DateTime(seconds)
    }

    /// `DateTime64` columns, ticks of `10^-precision` seconds since unix epoch.
    fn date_time64(&self, ticks: i64, precision: u8, timezone: Option<&str>) -> Value {
        let _ = timezone;
        Value::DateTime64 { ticks, precision }
    }

    /// `Decimal` columns.
    fn decimal(&self, decimal: Decimal) -> Value {
        Value::Decimal(decimal)
    }
}

/// [`Mapper`] which keeps every raw representation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMapper;

impl Mapper for DefaultMapper { }
