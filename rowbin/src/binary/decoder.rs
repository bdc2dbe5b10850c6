//! Typed value decoders.
//!
//! A [`Decoder`] is bound once per column from its [`ColumnType`], branching
//! on the type family happens there and not per value.
//!
//! Decoding returns `Ok(None)` when `buf` ends before the value does. That is
//! not an error, the caller should wait for more bytes and retry from the same
//! offset.
use bytes::{Buf, Bytes};
use uuid::Uuid;
use std::{
    collections::HashMap,
    fmt,
    net::{Ipv4Addr, Ipv6Addr},
    sync::Arc,
};

use super::read::{
    read_float32, read_float64, read_signed_big_int, read_signed_int, read_unsigned_big_int,
    read_unsigned_int, read_var_string, read_var_uint,
};
use crate::{
    column_type::{ColumnType, DecimalSize, EnumSize, ParseTypeError, TypeKind},
    common::ByteStr,
    mapper::Mapper,
    row::DecodeError,
    value::{Decimal, Value},
};
use super::wide::I256;

/// Result of a single decode step.
///
/// `Ok(Some((value, next_offset)))` on success, `Ok(None)` when more bytes are
/// required.
pub type Decoded = Result<Option<(Value, usize)>, DecodeError>;

type DecodeFn = dyn Fn(&Bytes, usize) -> Decoded + Send + Sync;

/// Value decoder bound to a column type.
pub struct Decoder {
    decode: Box<DecodeFn>,
}

impl Decoder {
    fn new<F>(f: F) -> Decoder
    where
        F: Fn(&Bytes, usize) -> Decoded + Send + Sync + 'static,
    {
        Decoder { decode: Box::new(f) }
    }

    /// Decode one value starting at `offset`.
    ///
    /// Returns the value and the offset right after it.
    pub fn decode(&self, buf: &Bytes, offset: usize) -> Decoded {
        (self.decode)(buf, offset)
    }

    /// Bind a decoder for given column type.
    ///
    /// # Errors
    ///
    /// Returns error if the type, or any nested type, have no binary decoder.
    pub fn bind(ty: &ColumnType, mapper: &Arc<dyn Mapper>) -> Result<Decoder, ParseTypeError> {
        let decoder = match &ty.kind {
            TypeKind::Simple { name } => {
                simple(name, mapper).ok_or_else(|| ParseTypeError::unsupported(ty))?
            }
            TypeKind::Nullable { inner } => nullable(Decoder::bind(inner, mapper)?),
            TypeKind::LowCardinality { inner } => Decoder::bind(inner, mapper)?,
            TypeKind::Array { inner, dimensions } => {
                let mut decoder = Decoder::bind(inner, mapper)?;
                for _ in 0..*dimensions {
                    decoder = array(decoder);
                }
                decoder
            }
            TypeKind::Map { key, value } => {
                map(Decoder::bind(key, mapper)?, Decoder::bind(value, mapper)?)
            }
            TypeKind::Tuple { elements } => tuple(
                elements
                    .iter()
                    .map(|e| Decoder::bind(&e.ty, mapper))
                    .collect::<Result<_, _>>()?,
            ),
            TypeKind::Enum { int_size, values } => enumeration(*int_size, values.iter()),
            TypeKind::Decimal { scale, int_size, .. } => decimal(*int_size, *scale, mapper.clone()),
            TypeKind::FixedString { size_bytes } => fixed_string(*size_bytes as usize),
            TypeKind::DateTime { timezone } => {
                let mapper = mapper.clone();
                let timezone = timezone.clone();
                fixed::<4, _>(move |b| {
                    mapper.date_time(read_unsigned_int(b, 0, 4), timezone.as_deref())
                })
            }
            TypeKind::DateTime64 { precision, timezone } => {
                let mapper = mapper.clone();
                let timezone = timezone.clone();
                let precision = *precision;
                fixed::<8, _>(move |mut b| {
                    mapper.date_time64(b.get_i64_le(), precision, timezone.as_deref())
                })
            }
        };
        Ok(decoder)
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decoder")
    }
}

/// Fixed width value, `map` receives exactly `N` bytes.
fn fixed<const N: usize, F>(map: F) -> Decoder
where
    F: Fn(&[u8]) -> Value + Send + Sync + 'static,
{
    Decoder::new(move |buf, offset| {
        let end = offset + N;
        if end > buf.len() {
            return Ok(None);
        }
        Ok(Some((map(&buf[offset..end]), end)))
    })
}

fn simple(name: &str, mapper: &Arc<dyn Mapper>) -> Option<Decoder> {
    let decoder = match name {
        "Bool" => fixed::<1, _>(|b| Value::Bool(b[0] != 0)),
        "UInt8" => fixed::<1, _>(|b| Value::UInt8(b[0])),
        "UInt16" => fixed::<2, _>(|b| Value::UInt16(read_unsigned_int(b, 0, 2) as u16)),
        "UInt32" => fixed::<4, _>(|b| Value::UInt32(read_unsigned_int(b, 0, 4))),
        "UInt64" => fixed::<8, _>(|mut b| Value::UInt64(b.get_u64_le())),
        "UInt128" => fixed::<16, _>(|mut b| Value::UInt128(b.get_u128_le())),
        "UInt256" => fixed::<32, _>(|b| Value::UInt256(read_unsigned_big_int(b, 0, 32))),
        "Int8" => fixed::<1, _>(|b| Value::Int8(read_signed_int(b, 0, 1) as i8)),
        "Int16" => fixed::<2, _>(|b| Value::Int16(read_signed_int(b, 0, 2) as i16)),
        "Int32" => fixed::<4, _>(|b| Value::Int32(read_signed_int(b, 0, 4))),
        "Int64" => fixed::<8, _>(|mut b| Value::Int64(b.get_i64_le())),
        "Int128" => fixed::<16, _>(|mut b| Value::Int128(b.get_i128_le())),
        "Int256" => fixed::<32, _>(|b| Value::Int256(read_signed_big_int(b, 0, 32))),
        "Float32" => fixed::<4, _>(|b| Value::Float32(read_float32(b, 0))),
        "Float64" => fixed::<8, _>(|b| Value::Float64(read_float64(b, 0))),
        "Date" => {
            let mapper = mapper.clone();
            fixed::<2, _>(move |b| mapper.date(read_unsigned_int(b, 0, 2) as i32))
        }
        "Date32" => {
            let mapper = mapper.clone();
            fixed::<4, _>(move |b| mapper.date(read_signed_int(b, 0, 4)))
        }
        // high half first, each half little endian
        "UUID" => fixed::<16, _>(|mut b| {
            let hi = b.get_u64_le();
            let lo = b.get_u64_le();
            Value::Uuid(Uuid::from_u64_pair(hi, lo))
        }),
        "IPv4" => fixed::<4, _>(|mut b| Value::Ipv4(Ipv4Addr::from(b.get_u32_le()))),
        "IPv6" => fixed::<16, _>(|mut b| Value::Ipv6(Ipv6Addr::from(b.get_u128()))),
        "String" => Decoder::new(|buf, offset| {
            Ok(read_var_string(buf, offset).map(|(s, end)| (Value::String(s), end)))
        }),
        _ => return None,
    };
    Some(decoder)
}

fn fixed_string(size: usize) -> Decoder {
    Decoder::new(move |buf, offset| {
        let end = offset + size;
        if end > buf.len() {
            return Ok(None);
        }
        Ok(Some((Value::FixedString(buf.slice(offset..end)), end)))
    })
}

fn nullable(inner: Decoder) -> Decoder {
    Decoder::new(move |buf, offset| match buf.get(offset) {
        None => Ok(None),
        Some(1) => Ok(Some((Value::Null, offset + 1))),
        Some(0) => inner.decode(buf, offset + 1),
        Some(marker) => Err(DecodeError::InvalidNullMarker(*marker)),
    })
}

fn array(element: Decoder) -> Decoder {
    Decoder::new(move |buf, offset| {
        let Some((len, mut offset)) = read_var_uint(buf, offset) else {
            return Ok(None);
        };
        let mut items = Vec::with_capacity(capacity(len, buf.len() - offset));
        for _ in 0..len {
            let Some((value, next)) = element.decode(buf, offset)? else {
                return Ok(None);
            };
            items.push(value);
            offset = next;
        }
        Ok(Some((Value::Array(items), offset)))
    })
}

fn map(key: Decoder, value: Decoder) -> Decoder {
    Decoder::new(move |buf, offset| {
        let Some((len, mut offset)) = read_var_uint(buf, offset) else {
            return Ok(None);
        };
        let mut entries = Vec::with_capacity(capacity(len, buf.len() - offset));
        for _ in 0..len {
            let Some((k, next)) = key.decode(buf, offset)? else {
                return Ok(None);
            };
            let Some((v, next)) = value.decode(buf, next)? else {
                return Ok(None);
            };
            entries.push((k, v));
            offset = next;
        }
        Ok(Some((Value::Map(entries), offset)))
    })
}

fn tuple(elements: Vec<Decoder>) -> Decoder {
    Decoder::new(move |buf, mut offset| {
        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            let Some((value, next)) = element.decode(buf, offset)? else {
                return Ok(None);
            };
            values.push(value);
            offset = next;
        }
        Ok(Some((Value::Tuple(values), offset)))
    })
}

fn enumeration<'a>(int_size: EnumSize, values: impl Iterator<Item = (&'a i16, &'a String)>) -> Decoder {
    let names = values
        .map(|(index, name)| (*index, ByteStr::copy_from_str(name)))
        .collect::<HashMap<_, _>>();
    let lookup = move |index: i16| match names.get(&index) {
        Some(name) => Ok(Value::Enum(name.clone())),
        None => Err(DecodeError::UnknownEnumIndex(index)),
    };
    match int_size {
        EnumSize::Enum8 => Decoder::new(move |buf, offset| match buf.get(offset) {
            Some(b) => Ok(Some((lookup(*b as i8 as i16)?, offset + 1))),
            None => Ok(None),
        }),
        EnumSize::Enum16 => Decoder::new(move |buf, offset| {
            if offset + 2 > buf.len() {
                return Ok(None);
            }
            let index = read_signed_int(buf, offset, 2) as i16;
            Ok(Some((lookup(index)?, offset + 2)))
        }),
    }
}

fn decimal(int_size: DecimalSize, scale: u8, mapper: Arc<dyn Mapper>) -> Decoder {
    let width = int_size.bytes();
    Decoder::new(move |buf, offset| {
        let end = offset + width;
        if end > buf.len() {
            return Ok(None);
        }
        let mantissa = match width {
            4 => I256::from_i128(read_signed_int(buf, offset, 4) as i128),
            _ => read_signed_big_int(buf, offset, width),
        };
        Ok(Some((mapper.decimal(Decimal::new(mantissa, scale)), end)))
    })
}

/// Preallocation for a collection of `len` items, bounded by what the buffer
/// could possibly hold.
fn capacity(len: u64, remaining: usize) -> usize {
    usize::try_from(len).unwrap_or(usize::MAX).min(remaining)
}

#[cfg(test)]
mod test {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::{column_type::parse_type, ext::BufMutExt, mapper::DefaultMapper};

    fn bind(declaration: &str) -> Decoder {
        let mapper: Arc<dyn Mapper> = Arc::new(DefaultMapper);
        Decoder::bind(&parse_type(declaration).unwrap(), &mapper).unwrap()
    }

    /// Decode the whole `bytes`, and also assert that every strict prefix
    /// reports insufficient bytes.
    fn decode(declaration: &str, bytes: &[u8]) -> Value {
        let decoder = bind(declaration);
        for end in 0..bytes.len() {
            let prefix = Bytes::copy_from_slice(&bytes[..end]);
            assert!(decoder.decode(&prefix, 0).unwrap().is_none(), "{declaration} at {end}");
        }
        let buf = Bytes::copy_from_slice(bytes);
        let (value, end) = decoder.decode(&buf, 0).unwrap().unwrap();
        assert_eq!(end, bytes.len());
        value
    }

    #[test]
    fn integers() {
        assert_eq!(decode("UInt32", &[0xff, 0xff, 0xff, 0xff]), Value::UInt32(4294967295));
        assert_eq!(decode("Int32", &[0xff, 0xff, 0xff, 0xff]), Value::Int32(-1));
        assert_eq!(decode("UInt32", &[0, 0, 0, 0x80]), Value::UInt32(2147483648));
        assert_eq!(decode("Int32", &[0, 0, 0, 0x80]), Value::Int32(-2147483648));
        assert_eq!(decode("Int8", &[0xfe]), Value::Int8(-2));
        assert_eq!(decode("UInt16", &[0x34, 0x12]), Value::UInt16(0x1234));
        assert_eq!(decode("Int64", &(-5i64).to_le_bytes()), Value::Int64(-5));
        assert_eq!(decode("UInt128", &u128::MAX.to_le_bytes()), Value::UInt128(u128::MAX));
        assert_eq!(decode("Int128", &i128::MIN.to_le_bytes()), Value::Int128(i128::MIN));
        assert_eq!(decode("Int256", &[0xff; 32]), Value::Int256(I256::from_i128(-1)));
        assert_eq!(decode("Bool", &[0x01]), Value::Bool(true));
    }

    #[test]
    fn strings() {
        let mut buf = BytesMut::new();
        buf.put_var_string("héllo");
        assert_eq!(decode("String", &buf), Value::String("héllo".into()));
        assert_eq!(decode("LowCardinality(String)", &buf), Value::String("héllo".into()));
        assert_eq!(decode("FixedString(3)", b"a\0b"), Value::FixedString(Bytes::from_static(b"a\0b")));
    }

    #[test]
    fn nullable_values() {
        assert_eq!(decode("Nullable(UInt8)", &[1]), Value::Null);
        assert_eq!(decode("Nullable(UInt8)", &[0, 7]), Value::UInt8(7));
        let buf = Bytes::from_static(&[2, 7]);
        assert!(matches!(
            bind("Nullable(UInt8)").decode(&buf, 0),
            Err(DecodeError::InvalidNullMarker(2))
        ));
    }

    #[test]
    fn arrays() {
        let mut buf = BytesMut::new();
        buf.put_var_uint(2);
        buf.put_var_uint(1);
        buf.put_u8(0);
        buf.put_u8(5);
        buf.put_var_uint(0);
        assert_eq!(
            decode("Array(Array(Nullable(UInt8)))", &buf),
            Value::Array(vec![Value::Array(vec![Value::UInt8(5)]), Value::Array(vec![])])
        );
    }

    #[test]
    fn maps_and_tuples() {
        let mut buf = BytesMut::new();
        buf.put_var_uint(1);
        buf.put_var_string("k");
        buf.put_u16_le(300);
        assert_eq!(
            decode("Map(String, UInt16)", &buf),
            Value::Map(vec![(Value::String("k".into()), Value::UInt16(300))])
        );

        let mut buf = BytesMut::new();
        buf.put_i32_le(-1);
        buf.put_var_string("x");
        assert_eq!(
            decode("Tuple(a Int32, b String)", &buf),
            Value::Tuple(vec![Value::Int32(-1), Value::String("x".into())])
        );
    }

    #[test]
    fn enums() {
        assert_eq!(decode("Enum8('a' = -1, 'b' = 2)", &[0xff]), Value::Enum("a".into()));
        assert_eq!(decode("Enum16('x' = 1000)", &1000i16.to_le_bytes()), Value::Enum("x".into()));
        let buf = Bytes::from_static(&[3]);
        assert!(matches!(
            bind("Enum8('a' = 1)").decode(&buf, 0),
            Err(DecodeError::UnknownEnumIndex(3))
        ));
    }

    #[test]
    fn temporal() {
        assert_eq!(decode("Date", &19000u16.to_le_bytes()), Value::Date(19000));
        assert_eq!(decode("Date32", &(-1i32).to_le_bytes()), Value::Date(-1));
        assert_eq!(decode("DateTime('UTC')", &1_700_000_000u32.to_le_bytes()), Value::DateTime(1_700_000_000));
        assert_eq!(
            decode("DateTime64(3)", &1_700_000_000_123i64.to_le_bytes()),
            Value::DateTime64 { ticks: 1_700_000_000_123, precision: 3 }
        );
    }

    #[test]
    fn decimals() {
        let value = decode("Decimal(9, 2)", &(-12345i32).to_le_bytes());
        assert_eq!(value, Value::Decimal(Decimal::new(I256::from_i128(-12345), 2)));
        let Value::Decimal(d) = decode("Decimal128(4)", &123_4567i128.to_le_bytes()) else { panic!() };
        assert_eq!(d.to_string(), "123.4567");
        let Value::Decimal(d) = decode("Decimal(50, 0)", &[0xff; 32]) else { panic!() };
        assert_eq!(d.to_string(), "-1");
    }

    #[test]
    fn misc() {
        assert_eq!(decode("IPv4", &[1, 0, 0, 127]), Value::Ipv4(Ipv4Addr::LOCALHOST));
        assert_eq!(decode("IPv6", &Ipv6Addr::LOCALHOST.octets()), Value::Ipv6(Ipv6Addr::LOCALHOST));

        let mut buf = BytesMut::new();
        buf.put_u64_le(0x61f0c404_5cb3_11e7);
        buf.put_u64_le(0x907b_a6006ad3dba0);
        let Value::Uuid(uuid) = decode("UUID", &buf) else { panic!() };
        assert_eq!(uuid.to_string(), "61f0c404-5cb3-11e7-907b-a6006ad3dba0");
        assert_eq!(uuid.get_version_num(), 1);
    }

    #[test]
    fn unsupported() {
        let mapper: Arc<dyn Mapper> = Arc::new(DefaultMapper);
        for declaration in ["Dynamic", "Array(Nothing)", "Map(String, JSON)"] {
            let err = Decoder::bind(&parse_type(declaration).unwrap(), &mapper).unwrap_err();
            assert_eq!(err.reason(), "Unsupported column type");
        }
    }
}
