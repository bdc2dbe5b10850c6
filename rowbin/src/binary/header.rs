//! Column header of a row-binary stream.
//!
//! ```text
//! varuint column count
//! column count * (varuint len, len bytes)   names
//! column count * (varuint len, len bytes)   types
//! ```
use bytes::Bytes;
use std::sync::Arc;

use super::{
    decoder::Decoder,
    read::{read_var_string, read_var_uint},
};
use crate::{
    column_type::{ColumnType, ParseTypeError, parse_type},
    common::ByteStr,
    mapper::Mapper,
};

/// Columns metadata of a result set, with a decoder bound per column.
///
/// Names, types and decoders always have the same length.
#[derive(Debug)]
pub struct DecodedColumns {
    names: Arc<[ByteStr]>,
    types: Vec<ColumnType>,
    decoders: Vec<Decoder>,
}

impl DecodedColumns {
    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if there is no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Column names, shared by every [`Row`][crate::Row] of the result set.
    pub fn names(&self) -> &Arc<[ByteStr]> {
        &self.names
    }

    /// Parsed column types, the original declaration is in
    /// [`source_type`][ColumnType::source_type].
    pub fn types(&self) -> &[ColumnType] {
        &self.types
    }

    /// Decoder of the `nth` column.
    ///
    /// # Panics
    ///
    /// Panics if `nth` is out of bounds.
    pub fn decoder(&self, nth: usize) -> &Decoder {
        &self.decoders[nth]
    }
}

/// Decode the column header at the start of `buf`.
///
/// Returns the columns and the offset where row data begins, or [`None`] if
/// `buf` ends before the header does.
///
/// # Errors
///
/// Returns error if any column type cannot be parsed or has no decoder. The
/// rest of the stream cannot be interpreted in that case.
pub fn decode_header(
    buf: &Bytes,
    mapper: &Arc<dyn Mapper>,
) -> Result<Option<(DecodedColumns, usize)>, ParseTypeError> {
    let Some((count, mut offset)) = read_var_uint(buf, 0) else {
        return Ok(None);
    };

    // one byte per string at least
    let cap = usize::try_from(count).unwrap_or(usize::MAX).min(buf.len());

    let mut names = Vec::with_capacity(cap);
    let mut type_names = Vec::with_capacity(cap);
    for strings in [&mut names, &mut type_names] {
        for _ in 0..count {
            let Some((string, next)) = read_var_string(buf, offset) else {
                return Ok(None);
            };
            strings.push(string);
            offset = next;
        }
    }

    let types = type_names
        .iter()
        .map(|e| parse_type(e))
        .collect::<Result<Vec<_>, _>>()?;
    let decoders = types
        .iter()
        .map(|e| Decoder::bind(e, mapper))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Some((
        DecodedColumns { names: names.into(), types, decoders },
        offset,
    )))
}
