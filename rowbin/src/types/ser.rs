use serde::{Serialize, Serializer};

use crate::{
    Row, Value,
    ext::FmtExt,
};

/// Integers wider than 64 bits, decimals, uuid and addresses serialize as
/// string. Temporal values without a mapper serialize as their raw integer.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::UInt8(v) => serializer.serialize_u8(*v),
            Value::UInt16(v) => serializer.serialize_u16(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::UInt128(v) => serializer.collect_str(v),
            Value::UInt256(v) => serializer.collect_str(v),
            Value::Int8(v) => serializer.serialize_i8(*v),
            Value::Int16(v) => serializer.serialize_i16(*v),
            Value::Int32(v) => serializer.serialize_i32(*v),
            Value::Int64(v) => serializer.serialize_i64(*v),
            Value::Int128(v) => serializer.collect_str(v),
            Value::Int256(v) => serializer.collect_str(v),
            Value::Float32(v) => serializer.serialize_f32(*v),
            Value::Float64(v) => serializer.serialize_f64(*v),
            Value::String(v) | Value::Enum(v) => serializer.serialize_str(v),
            Value::FixedString(v) => serializer.collect_str(&v.lossy()),
            Value::Date(v) => serializer.serialize_i32(*v),
            Value::DateTime(v) => serializer.serialize_u32(*v),
            Value::DateTime64 { ticks, .. } => serializer.serialize_i64(*ticks),
            Value::Decimal(v) => serializer.collect_str(v),
            Value::Uuid(v) => serializer.collect_str(v),
            Value::Ipv4(v) => serializer.collect_str(v),
            Value::Ipv6(v) => serializer.collect_str(v),
            Value::Array(v) | Value::Tuple(v) => serializer.collect_seq(v),
            Value::Map(v) => serializer.collect_map(v.iter().map(|(k, v)| (k, v))),
            #[cfg(feature = "time")]
            Value::TimeDate(v) => serializer.collect_str(v),
            #[cfg(feature = "time")]
            Value::TimeDateTime(v) => {
                match v.format(&time::format_description::well_known::Rfc3339) {
                    Ok(rfc3339) => serializer.serialize_str(&rfc3339),
                    Err(_) => serializer.collect_str(v),
                }
            }
        }
    }
}

/// Serialize as a map of column name to value.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}
