//! Decoded row operation.
//!
//! - [`Row`]
//! - [`Column`]
//! - [`FromRow`]
//! - [`Decode`]
//!
//! - [`Index`]
//! - [`DecodeError`]
use bytes::Bytes;
use uuid::Uuid;
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt,
    hash::Hash,
    net::{Ipv4Addr, Ipv6Addr},
    str::Utf8Error,
    string::FromUtf8Error,
    sync::Arc,
};

use crate::{
    binary::wide::{I256, U256},
    common::{ByteStr, unit_error},
    value::{Decimal, Value},
};

/// A fully decoded row.
///
/// Column names are shared between every row of a result set.
#[derive(Clone, PartialEq)]
pub struct Row {
    names: Arc<[ByteStr]>,
    values: Vec<Value>,
}

impl Row {
    pub(crate) fn new(names: Arc<[ByteStr]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len(), "row values len missmatch with columns");
        Self { names, values }
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns column names.
    pub fn names(&self) -> &[ByteStr] {
        &self.names
    }

    /// Returns column values, in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume self into column values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterate over column name and value pairs.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> {
        self.names.iter().map(ByteStr::as_str).zip(&self.values)
    }

    /// Get column value by position or name.
    pub fn get_value<I: Index>(&self, idx: I) -> Result<&Value, DecodeError> {
        let nth = idx.position(&self.names)?;
        Ok(&self.values[nth])
    }

    /// Try get and decode column.
    pub fn try_get<I: Index, R: Decode>(&self, idx: I) -> Result<R, DecodeError> {
        let nth = idx.position(&self.names)?;
        R::decode(Column::new(self.names[nth].clone(), self.values[nth].clone()))
    }

    /// Try decode type using [`FromRow`] implementation.
    pub fn decode<D: FromRow>(self) -> Result<D, DecodeError> {
        D::from_row(self)
    }
}

impl IntoIterator for Row {
    type Item = Column;

    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            names: self.names,
            values: self.values.into_iter(),
            iter_n: 0,
        }
    }
}

/// [`IntoIterator`] implementation from [`Row`].
#[derive(Debug)]
pub struct IntoIter {
    names: Arc<[ByteStr]>,
    values: std::vec::IntoIter<Value>,

    iter_n: usize,
}

impl IntoIter {
    /// Same as [`Iterator::next`] but returns [`Result`] instead.
    pub fn try_next(&mut self) -> Result<Column, DecodeError> {
        self.next().ok_or(DecodeError::IndexOutOfBounds(self.iter_n))
    }
}

impl Iterator for IntoIter {
    type Item = Column;

    fn next(&mut self) -> Option<Self::Item> {
        let value = self.values.next()?;
        let name = self.names[self.iter_n].clone();
        self.iter_n += 1;
        Some(Column::new(name, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.values.size_hint()
    }
}

impl ExactSizeIterator for IntoIter { }

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// A single column of a [`Row`].
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: ByteStr,
    value: Value,
}

impl Column {
    fn new(name: ByteStr, value: Value) -> Self {
        Self { name, value }
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return `true` if value is NULL.
    pub const fn is_null(&self) -> bool {
        self.value.is_null()
    }

    /// Returns the decoded value.
    pub const fn value(&self) -> &Value {
        &self.value
    }

    /// Consume self into the inner [`Value`].
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Try consume self into the inner [`Value`].
    ///
    /// Return [`DecodeError::Null`] if value is `NULL`.
    pub fn try_into_value(self) -> Result<Value, DecodeError> {
        match self.value {
            Value::Null => Err(DecodeError::Null),
            value => Ok(value),
        }
    }

    /// Try decode type using [`Decode`] implementation.
    pub fn decode<D: Decode>(self) -> Result<D, DecodeError> {
        D::decode(self)
    }

    /// Column with the same name holding another value, for nested values.
    fn with_value(&self, value: Value) -> Column {
        Column::new(self.name.clone(), value)
    }
}

// ===== Traits =====

/// Type that can be constructed from a row.
pub trait FromRow: Sized {
    /// Construct self from row.
    fn from_row(row: Row) -> Result<Self, DecodeError>;
}

impl FromRow for Row {
    fn from_row(row: Row) -> Result<Self, DecodeError> {
        Ok(row)
    }
}

impl FromRow for () {
    fn from_row(_: Row) -> Result<Self, DecodeError> {
        Ok(())
    }
}

macro_rules! from_row_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRow for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_row(row: Row) -> Result<Self, DecodeError> {
                Ok((
                    $(row.try_get($i)?),*,
                ))
            }
        }
    };
}

from_row_tuple!(T0 0);
from_row_tuple!(T0 0, T1 1);
from_row_tuple!(T0 0, T1 1, T2 2);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3);

/// A type that can be constructed from [`Column`].
pub trait Decode: Sized {
    /// Try decode self from column.
    fn decode(column: Column) -> Result<Self, DecodeError>;
}

impl Decode for Column {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        Ok(column)
    }
}

impl Decode for Value {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        Ok(column.value)
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.is_null() {
            true => Ok(None),
            false => column.decode().map(Some),
        }
    }
}

impl Decode for () {
    fn decode(_: Column) -> Result<Self, DecodeError> {
        Ok(())
    }
}

pub(crate) fn mismatch(expected: &'static str, found: &Value) -> DecodeError {
    DecodeError::TypeMismatch { expected, found: found.kind_name() }
}

macro_rules! decode_integer {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            fn decode(column: Column) -> Result<Self, DecodeError> {
                let result = match column.try_into_value()? {
                    Value::UInt8(v) => <$ty>::try_from(v).ok(),
                    Value::UInt16(v) => <$ty>::try_from(v).ok(),
                    Value::UInt32(v) => <$ty>::try_from(v).ok(),
                    Value::UInt64(v) => <$ty>::try_from(v).ok(),
                    Value::UInt128(v) => <$ty>::try_from(v).ok(),
                    Value::UInt256(v) => v.to_u128().and_then(|v| <$ty>::try_from(v).ok()),
                    Value::Int8(v) => <$ty>::try_from(v).ok(),
                    Value::Int16(v) => <$ty>::try_from(v).ok(),
                    Value::Int32(v) => <$ty>::try_from(v).ok(),
                    Value::Int64(v) => <$ty>::try_from(v).ok(),
                    Value::Int128(v) => <$ty>::try_from(v).ok(),
                    Value::Int256(v) => v.to_i128().and_then(|v| <$ty>::try_from(v).ok()),
                    value => return Err(mismatch(stringify!($ty), &value)),
                };
                result.ok_or(DecodeError::OutOfRange(stringify!($ty)))
            }
        }
    )*};
}

decode_integer!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl Decode for f32 {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::Float32(v) => Ok(v),
            value => Err(mismatch("f32", &value)),
        }
    }
}

impl Decode for f64 {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::Float32(v) => Ok(v.into()),
            Value::Float64(v) => Ok(v),
            value => Err(mismatch("f64", &value)),
        }
    }
}

impl Decode for bool {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::Bool(v) => Ok(v),
            Value::UInt8(v) => Ok(v != 0),
            value => Err(mismatch("bool", &value)),
        }
    }
}

impl Decode for ByteStr {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::String(v) | Value::Enum(v) => Ok(v),
            Value::FixedString(v) => Ok(ByteStr::from_utf8(v)?),
            value => Err(mismatch("String", &value)),
        }
    }
}

impl Decode for String {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        ByteStr::decode(column).map(Into::into)
    }
}

impl Decode for Bytes {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.try_into_value()? {
            Value::String(v) => Ok(v.into_bytes()),
            Value::FixedString(v) => Ok(v),
            value => Err(mismatch("Bytes", &value)),
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.value {
            Value::Array(ref items) => items
                .iter()
                .map(|e| T::decode(column.with_value(e.clone())))
                .collect(),
            Value::Null => Err(DecodeError::Null),
            ref value => Err(mismatch("Array", value)),
        }
    }
}

impl<K, V> Decode for HashMap<K, V>
where
    K: Decode + Eq + Hash,
    V: Decode,
{
    fn decode(column: Column) -> Result<Self, DecodeError> {
        match column.value {
            Value::Map(ref entries) => entries
                .iter()
                .map(|(k, v)| {
                    Ok((
                        K::decode(column.with_value(k.clone()))?,
                        V::decode(column.with_value(v.clone()))?,
                    ))
                })
                .collect(),
            Value::Null => Err(DecodeError::Null),
            ref value => Err(mismatch("Map", value)),
        }
    }
}

macro_rules! decode_variant {
    ($($ty:ty => $variant:ident, $name:literal;)*) => {$(
        impl Decode for $ty {
            fn decode(column: Column) -> Result<Self, DecodeError> {
                match column.try_into_value()? {
                    Value::$variant(v) => Ok(v),
                    value => Err(mismatch($name, &value)),
                }
            }
        }
    )*};
}

decode_variant! {
    Decimal => Decimal, "Decimal";
    Ipv4Addr => Ipv4, "IPv4";
    Ipv6Addr => Ipv6, "IPv6";
    U256 => UInt256, "UInt256";
    I256 => Int256, "Int256";
    Uuid => Uuid, "UUID";
}

/// Type that can be used for indexing column.
pub trait Index: Sized + sealed::Sealed {
    /// Returns the nth column.
    fn position(self, names: &[ByteStr]) -> Result<usize, DecodeError>;
}

impl Index for usize {
    fn position(self, names: &[ByteStr]) -> Result<usize, DecodeError> {
        match self < names.len() {
            true => Ok(self),
            false => Err(DecodeError::ColumnNotFound(
                String::from(itoa::Buffer::new().format(self)).into(),
            )),
        }
    }
}

impl Index for &str {
    fn position(self, names: &[ByteStr]) -> Result<usize, DecodeError> {
        names
            .iter()
            .position(|e| e == self)
            .ok_or_else(|| DecodeError::ColumnNotFound(String::from(self).into()))
    }
}

mod sealed {
    pub trait Sealed { }
    impl Sealed for usize { }
    impl Sealed for &str { }
}

unit_error! {
    /// An error when try to [`fetch_one`][crate::fetch::fetch_one] and stream does not
    /// contain any row.
    pub struct RowNotFound("row not found");
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for DecodeError {
            fn from($pat: $ty) -> Self {
                $body
            }
        }
    };
}

/// An error when decoding row value.
pub enum DecodeError {
    /// Non utf8 string where utf8 is required.
    Utf8(Utf8Error),
    /// Column requested not found.
    ColumnNotFound(Cow<'static,str>),
    /// Index requested is out of bounds.
    IndexOutOfBounds(usize),
    /// Value does not hold the requested type.
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    /// Integer value does not fit the requested type.
    OutOfRange(&'static str),
    /// Row is null.
    Null,
    /// Enum index not declared in the column type.
    UnknownEnumIndex(i16),
    /// Enum name without matching variant.
    UnknownVariant(Cow<'static,str>),
    /// Nullable marker byte other than `0` or `1`.
    InvalidNullMarker(u8),
    /// Incomplete value grows beyond the configured maximum.
    TailTooLarge(usize),
    /// Failed to deserialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::error::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::Utf8(e) => write!(f, "{e}"),
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
            Self::IndexOutOfBounds(u) => write!(f, "index out of bounds: {u:?}"),
            Self::TypeMismatch { expected, found } => {
                write!(f, "data type missmatch, expected {expected}, found {found}")
            }
            Self::OutOfRange(ty) => write!(f, "integer out of range for {ty}"),
            Self::Null => write!(f, "unexpected NULL value"),
            Self::UnknownEnumIndex(i) => write!(f, "unknown enum index: {i}"),
            Self::UnknownVariant(name) => write!(f, "unknown variant: {name:?}"),
            Self::InvalidNullMarker(b) => write!(f, "invalid nullable marker: {b:#04x}"),
            Self::TailTooLarge(max) => {
                write!(f, "incomplete value exceeds {max} buffered bytes")
            }
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

from!(<Utf8Error>e => Self::Utf8(e));
from!(<FromUtf8Error>e => Self::Utf8(e.utf8_error()));
#[cfg(feature = "json")]
from!(<serde_json::error::Error>e => Self::Json(e));

impl std::error::Error for DecodeError { }

impl fmt::Debug for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn row() -> Row {
        let names: Vec<ByteStr> = vec!["id".into(), "name".into(), "tags".into(), "note".into()];
        Row::new(
            names.into(),
            vec![
                Value::UInt64(7),
                Value::String("deuterium".into()),
                Value::Array(vec![Value::Int8(-1), Value::Int8(2)]),
                Value::Null,
            ],
        )
    }

    #[test]
    fn get_by_index_and_name() {
        let row = row();
        assert_eq!(row.try_get::<_, u32>(0).unwrap(), 7);
        assert_eq!(row.try_get::<_, String>("name").unwrap(), "deuterium");
        assert_eq!(row.try_get::<_, Vec<i64>>("tags").unwrap(), [-1, 2]);
        assert_eq!(row.try_get::<_, Option<String>>("note").unwrap(), None);
        assert_eq!(row.get_value(1).unwrap().as_str(), Some("deuterium"));
    }

    #[test]
    fn get_errors() {
        let row = row();
        assert!(matches!(row.try_get::<_, u8>("missing"), Err(DecodeError::ColumnNotFound(_))));
        assert!(matches!(row.try_get::<_, u8>(4), Err(DecodeError::ColumnNotFound(_))));
        assert!(matches!(row.try_get::<_, String>("note"), Err(DecodeError::Null)));
        assert!(matches!(row.try_get::<_, Vec<u8>>("tags"), Err(DecodeError::OutOfRange("u8"))));
        assert!(matches!(
            row.try_get::<_, f64>("id"),
            Err(DecodeError::TypeMismatch { expected: "f64", found: "UInt64" })
        ));
    }

    #[test]
    fn from_row_tuple() {
        let (id, name) = row().decode::<(i128, ByteStr)>().unwrap();
        assert_eq!(id, 7);
        assert_eq!(name, "deuterium");
    }

    #[test]
    fn iterate() {
        let row = row();
        let names = row.iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, ["id", "name", "tags", "note"]);

        let mut iter = row.into_iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.try_next().unwrap().name(), "id");
        assert!(iter.by_ref().last().unwrap().is_null());
        assert!(matches!(iter.try_next(), Err(DecodeError::IndexOutOfBounds(4))));
    }

    #[test]
    fn decode_uuid() {
        let uuid = Uuid::from_u64_pair(0x61f0c404_5cb3_11e7, 0x907b_a600_6ad3_dba0);
        let names: Vec<ByteStr> = vec!["id".into(), "name".into()];
        let row = Row::new(names.into(), vec![Value::Uuid(uuid), Value::String("x".into())]);
        assert_eq!(row.try_get::<_, Uuid>("id").unwrap(), uuid);
        assert!(matches!(
            row.try_get::<_, Uuid>("name"),
            Err(DecodeError::TypeMismatch { expected: "UUID", found: "String" })
        ));
    }

    #[test]
    fn debug_as_map() {
        let names: Vec<ByteStr> = vec!["a".into()];
        let row = Row::new(names.into(), vec![Value::Bool(true)]);
        assert_eq!(format!("{row:?}"), "{\"a\": Bool(true)}");
    }
}
