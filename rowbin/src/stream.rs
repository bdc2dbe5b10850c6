//! Streaming row reassembler.
//!
//! [`RowBinaryDecoder`] is fed byte chunks of any size, as delivered by the
//! transport, and returns batches of fully decoded rows.
//!
//! ```text
//! AwaitingHeader --header decoded--> DecodingRows --finalize--> done
//!       |                                 |
//!       +--- incomplete: keep as tail     +--- incomplete value: keep as tail,
//!                                              keep decoded columns of the row
//! ```
//!
//! Decoding resumes exactly where it stopped. Values already decoded for the
//! row in progress are kept across chunks, only the bytes of the single
//! incomplete value are carried over.
use bytes::{BufMut, Bytes, BytesMut};
use std::{fmt, mem, sync::Arc};

use crate::{
    Result,
    binary::header::{DecodedColumns, decode_header},
    common::{debug, span, verbose},
    config::Config,
    error::TruncatedError,
    mapper::Mapper,
    row::{DecodeError, Row},
    value::Value,
};

/// Rows emitted from a single [`feed`][RowBinaryDecoder::feed].
pub type RowBatch = Vec<Row>;

/// Row-binary stream decoder state.
///
/// One instance per result set. Dropping it discards the partial row.
pub struct RowBinaryDecoder {
    mapper: Arc<dyn Mapper>,
    max_tail: usize,

    columns: Option<DecodedColumns>,
    current: Vec<Value>,
    pending: RowBatch,
    tail: Bytes,
}

impl fmt::Debug for RowBinaryDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBinaryDecoder")
            .field("columns", &self.columns.as_ref().map(DecodedColumns::names))
            .field("column_index", &self.current.len())
            .field("pending", &self.pending.len())
            .field("tail", &self.tail.len())
            .finish()
    }
}

impl Default for RowBinaryDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RowBinaryDecoder {
    /// Create decoder with default [`Config`].
    pub fn new() -> Self {
        Self::with_config(&Config::default())
    }

    /// Create decoder with given [`Config`].
    pub fn with_config(config: &Config) -> Self {
        Self {
            mapper: config.mapper.clone(),
            max_tail: config.max_tail,
            columns: None,
            current: vec![],
            pending: vec![],
            tail: Bytes::new(),
        }
    }

    /// Returns the columns, [`None`] while header is not yet decoded.
    pub fn columns(&self) -> Option<&DecodedColumns> {
        self.columns.as_ref()
    }

    /// Column of the current row to be decoded next.
    pub fn column_index(&self) -> usize {
        self.current.len()
    }

    /// Number of carried over bytes waiting for the next chunk.
    pub fn tail_len(&self) -> usize {
        self.tail.len()
    }

    /// Feed the next chunk of the stream.
    ///
    /// Returns all rows completed by this chunk, or [`None`] if no row is
    /// completed yet. Empty chunk is allowed.
    ///
    /// # Errors
    ///
    /// Returns error if the header is malformed, value bytes are corrupt, or
    /// a single incomplete value grows beyond the configured maximum. Rows
    /// completed earlier in the same chunk are discarded with it, and the
    /// decoder should be discarded afterwards.
    pub fn feed(&mut self, chunk: Bytes) -> Result<Option<RowBatch>> {
        if chunk.is_empty() {
            return Ok(None);
        }

        span!("feed", len = chunk.len(), tail = self.tail.len());

        let buf = match self.tail.is_empty() {
            true => chunk,
            false => {
                let mut buf = BytesMut::with_capacity(self.tail.len() + chunk.len());
                buf.put(mem::take(&mut self.tail));
                buf.put(chunk);
                buf.freeze()
            }
        };

        let (columns, offset) = match self.columns.take() {
            Some(columns) => (columns, 0),
            None => match decode_header(&buf, &self.mapper)? {
                Some((columns, offset)) => {
                    debug!("header decoded, {} columns", columns.len());
                    verbose!(columns = ?columns.names(), "header decoded");
                    (columns, offset)
                }
                None => {
                    self.tail = check_tail(buf, self.max_tail)?;
                    return Ok(None);
                }
            },
        };

        let decoded = decode_rows(&columns, &buf, offset, &mut self.current, &mut self.pending)
            .and_then(|offset|check_tail(buf.slice(offset..), self.max_tail));
        self.columns = Some(columns);
        self.tail = match decoded {
            Ok(tail) => tail,
            Err(err) => {
                self.pending.clear();
                self.current.clear();
                return Err(err.into());
            }
        };

        verbose!(
            rows = self.pending.len(),
            column = self.current.len(),
            tail = self.tail.len(),
            "chunk decoded"
        );

        match self.pending.is_empty() {
            true => Ok(None),
            false => Ok(Some(mem::take(&mut self.pending))),
        }
    }

    /// Signal the end of stream.
    ///
    /// Returns remaining rows, the decoder is reset and can be used for
    /// another stream.
    ///
    /// # Errors
    ///
    /// Returns [`Truncated`][crate::error::ErrorKind::Truncated] error if the
    /// stream ends in the middle of the header or a row.
    pub fn finalize(&mut self) -> Result<RowBatch> {
        let fresh = Self {
            mapper: self.mapper.clone(),
            max_tail: self.max_tail,
            columns: None,
            current: vec![],
            pending: vec![],
            tail: Bytes::new(),
        };
        let done = mem::replace(self, fresh);

        if !done.tail.is_empty() || !done.current.is_empty() {
            verbose!(tail = done.tail.len(), column = done.current.len(), "stream truncated");
            return Err(TruncatedError {
                tail_len: done.tail.len(),
                column_index: done.current.len(),
            }
            .into());
        }

        Ok(done.pending)
    }
}

/// Decode as many values as `buf` holds, returns the offset of the first
/// incomplete value.
fn decode_rows(
    columns: &DecodedColumns,
    buf: &Bytes,
    mut offset: usize,
    current: &mut Vec<Value>,
    pending: &mut RowBatch,
) -> Result<usize, DecodeError> {
    // no value to consume bytes, leave them for finalize
    if columns.is_empty() {
        return Ok(offset);
    }

    while offset < buf.len() {
        let decoder = columns.decoder(current.len());
        let Some((value, next)) = decoder.decode(buf, offset)? else {
            break;
        };
        current.push(value);
        offset = next;

        if current.len() == columns.len() {
            let values = mem::replace(current, Vec::with_capacity(columns.len()));
            pending.push(Row::new(columns.names().clone(), values));
        }
    }

    Ok(offset)
}

fn check_tail(tail: Bytes, max_tail: usize) -> Result<Bytes, DecodeError> {
    match tail.len() > max_tail {
        true => Err(DecodeError::TailTooLarge(max_tail)),
        false => Ok(tail),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        binary::wide::I256,
        error::ErrorKind,
        ext::BufMutExt,
        value::Decimal,
    };

    const COLUMNS: [(&str, &str); 9] = [
        ("id", "UInt32"),
        ("name", "String"),
        ("score", "Nullable(Float64)"),
        ("tags", "Array(LowCardinality(String))"),
        ("attrs", "Map(String, Int16)"),
        ("level", "Enum8('low' = 1, 'high' = 2)"),
        ("price", "Decimal(9, 2)"),
        ("day", "Date"),
        ("code", "FixedString(2)"),
    ];

    fn header(buf: &mut BytesMut, columns: &[(&str, &str)]) {
        buf.put_var_uint(columns.len() as u64);
        for (name, _) in columns {
            buf.put_var_string(name);
        }
        for (_, ty) in columns {
            buf.put_var_string(ty);
        }
    }

    fn put_row(buf: &mut BytesMut, id: u32, name: &str, score: Option<f64>, tags: &[&str]) {
        buf.put_u32_le(id);
        buf.put_var_string(name);
        match score {
            Some(score) => {
                buf.put_u8(0);
                buf.put_f64_le(score);
            }
            None => buf.put_u8(1),
        }
        buf.put_var_uint(tags.len() as u64);
        for tag in tags {
            buf.put_var_string(tag);
        }
        buf.put_var_uint(2);
        buf.put_var_string("ключ");
        buf.put_i16_le(-7);
        buf.put_var_string("k");
        buf.put_i16_le(300);
        buf.put_u8(2);
        buf.put_i32_le(-12345);
        buf.put_u16_le(19000);
        buf.put_slice(b"ok");
    }

    fn payload() -> Bytes {
        let mut buf = BytesMut::new();
        header(&mut buf, &COLUMNS);
        put_row(&mut buf, 1, "héllo wörld ✓", Some(0.5), &["a", "日本"]);
        put_row(&mut buf, 4294967295, "", None, &[]);
        put_row(&mut buf, 3, "🦀🦀", Some(-1.25), &["x"]);
        buf.freeze()
    }

    fn decode_chunks(chunks: impl IntoIterator<Item = Bytes>) -> Result<RowBatch> {
        let mut decoder = RowBinaryDecoder::new();
        let mut rows = vec![];
        for chunk in chunks {
            if let Some(batch) = decoder.feed(chunk)? {
                rows.extend(batch);
            }
        }
        rows.extend(decoder.finalize()?);
        Ok(rows)
    }

    #[test]
    fn whole_payload() {
        let rows = decode_chunks([payload()]).unwrap();
        assert_eq!(rows.len(), 3);

        let row = &rows[0];
        assert_eq!(row.try_get::<_, u32>("id").unwrap(), 1);
        assert_eq!(row.try_get::<_, String>("name").unwrap(), "héllo wörld ✓");
        assert_eq!(row.try_get::<_, Option<f64>>("score").unwrap(), Some(0.5));
        assert_eq!(row.try_get::<_, Vec<String>>("tags").unwrap(), ["a", "日本"]);
        assert_eq!(row.try_get::<_, String>("level").unwrap(), "high");
        assert_eq!(
            row.get_value("attrs").unwrap(),
            &Value::Map(vec![
                (Value::String("ключ".into()), Value::Int16(-7)),
                (Value::String("k".into()), Value::Int16(300)),
            ])
        );
        assert_eq!(
            row.get_value("price").unwrap(),
            &Value::Decimal(Decimal::new(I256::from_i128(-12345), 2))
        );
        assert_eq!(row.get_value("day").unwrap(), &Value::Date(19000));
        assert_eq!(row.try_get::<_, Bytes>("code").unwrap(), "ok");

        assert_eq!(rows[1].try_get::<_, u32>(0).unwrap(), 4294967295);
        assert!(rows[1].get_value("score").unwrap().is_null());
        assert_eq!(rows[2].try_get::<_, String>(1).unwrap(), "🦀🦀");
    }

    #[test]
    fn every_split_point() {
        let payload = payload();
        let expected = decode_chunks([payload.clone()]).unwrap();
        for at in 0..=payload.len() {
            let chunks = [payload.slice(..at), payload.slice(at..)];
            assert_eq!(decode_chunks(chunks).unwrap(), expected, "split at {at}");
        }
    }

    #[test]
    fn every_pair_of_split_points() {
        let payload = payload();
        let expected = decode_chunks([payload.clone()]).unwrap();
        for a in 0..=payload.len() {
            for b in a..=payload.len() {
                let chunks = [payload.slice(..a), payload.slice(a..b), payload.slice(b..)];
                assert_eq!(decode_chunks(chunks).unwrap(), expected, "split at {a} and {b}");
            }
        }
    }

    #[test]
    fn one_byte_chunks() {
        let payload = payload();
        let expected = decode_chunks([payload.clone()]).unwrap();
        let chunks = (0..payload.len()).flat_map(|i| [Bytes::new(), payload.slice(i..i + 1)]);
        assert_eq!(decode_chunks(chunks).unwrap(), expected);
    }

    #[test]
    fn row_is_emitted_once_complete() {
        let payload = payload();
        let mut decoder = RowBinaryDecoder::new();
        let mut emitted = 0;
        for i in 0..payload.len() {
            if let Some(batch) = decoder.feed(payload.slice(i..i + 1)).unwrap() {
                assert_eq!(batch.len(), 1);
                emitted += 1;
            }
            assert!(decoder.tail_len() < payload.len());
        }
        assert_eq!(emitted, 3);
        assert_eq!(decoder.column_index(), 0);
        assert!(decoder.finalize().unwrap().is_empty());
    }

    #[test]
    fn truncated_row() {
        let payload = payload();
        let mut decoder = RowBinaryDecoder::new();
        let rows = decoder.feed(payload.slice(..payload.len() - 1)).unwrap().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(decoder.column_index(), 8);
        assert_eq!(decoder.tail_len(), 1);

        let err = decoder.finalize().unwrap_err();
        assert!(err.is_truncated());
        let ErrorKind::Truncated(truncated) = err.kind() else { panic!() };
        assert_eq!(truncated.tail_len(), 1);
        assert_eq!(truncated.column_index(), 8);

        // reset after finalize
        assert!(decoder.finalize().unwrap().is_empty());
    }

    #[test]
    fn truncated_at_value_boundary() {
        let mut buf = BytesMut::new();
        header(&mut buf, &[("a", "UInt8"), ("b", "UInt8")]);
        buf.put_u8(1);
        let mut decoder = RowBinaryDecoder::new();
        assert!(decoder.feed(buf.freeze()).unwrap().is_none());
        assert_eq!(decoder.tail_len(), 0);
        assert!(decoder.finalize().unwrap_err().is_truncated());
    }

    #[test]
    fn truncated_header() {
        let mut buf = BytesMut::new();
        header(&mut buf, &COLUMNS);
        let buf = buf.freeze();
        let mut decoder = RowBinaryDecoder::new();
        assert!(decoder.feed(buf.slice(..buf.len() - 3)).unwrap().is_none());
        assert!(decoder.columns().is_none());
        assert!(decoder.finalize().unwrap_err().is_truncated());
    }

    #[test]
    fn empty_stream() {
        assert!(decode_chunks(Vec::new()).unwrap().is_empty());

        let mut buf = BytesMut::new();
        header(&mut buf, &COLUMNS);
        assert!(decode_chunks([buf.freeze()]).unwrap().is_empty());
    }

    #[test]
    fn zero_columns() {
        assert!(decode_chunks([Bytes::from_static(&[0])]).unwrap().is_empty());
        let err = decode_chunks([Bytes::from_static(&[0, 1, 2])]).unwrap_err();
        assert!(err.is_truncated());
    }

    #[test]
    fn malformed_header() {
        let mut buf = BytesMut::new();
        header(&mut buf, &[("a", "DateTime64()")]);
        let err = decode_chunks([buf.freeze()]).unwrap_err();
        let ErrorKind::ColumnType(err) = err.kind() else { panic!("{err}") };
        assert_eq!(err.reason(), "Invalid DateTime64 type");
    }

    #[test]
    fn corrupt_value() {
        let mut buf = BytesMut::new();
        header(&mut buf, &[("a", "Nullable(UInt8)")]);
        buf.put_u8(5);
        let err = decode_chunks([buf.freeze()]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode(DecodeError::InvalidNullMarker(5))));
    }

    #[test]
    fn error_discards_completed_rows() {
        let mut buf = BytesMut::new();
        header(&mut buf, &[("a", "Nullable(UInt8)")]);
        buf.put_slice(&[0, 1, 1, 5]);

        let mut decoder = RowBinaryDecoder::new();
        let err = decoder.feed(buf.freeze()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode(DecodeError::InvalidNullMarker(5))));
        assert_eq!(decoder.column_index(), 0);
        assert!(decoder.finalize().unwrap().is_empty());
    }

    /// Single value with a two byte length prefix.
    fn long_payload() -> Bytes {
        let mut buf = BytesMut::new();
        header(&mut buf, &[("blob", "String"), ("bytes", "Array(UInt8)"), ("id", "UInt8")]);
        let header_len = buf.len();
        buf.put_var_string(&"é".repeat(200));
        assert_eq!(&buf[header_len..header_len + 2], [0x90, 0x03]);
        buf.put_var_uint(300);
        buf.put_slice(&[7; 300]);
        buf.put_u8(1);
        buf.put_var_string("short");
        buf.put_var_uint(0);
        buf.put_u8(2);
        buf.freeze()
    }

    #[test]
    fn split_inside_length_prefix() {
        let payload = long_payload();
        let expected = decode_chunks([payload.clone()]).unwrap();
        assert_eq!(expected.len(), 2);
        assert_eq!(expected[0].try_get::<_, String>("blob").unwrap(), "é".repeat(200));
        assert_eq!(expected[0].try_get::<_, Vec<u8>>("bytes").unwrap(), [7; 300]);

        for at in 0..=payload.len() {
            let chunks = [payload.slice(..at), payload.slice(at..)];
            assert_eq!(decode_chunks(chunks).unwrap(), expected, "split at {at}");
        }

        let chunks = (0..payload.len()).map(|i| payload.slice(i..i + 1));
        assert_eq!(decode_chunks(chunks).unwrap(), expected);
    }

    #[test]
    fn tail_limit() {
        let mut buf = BytesMut::new();
        header(&mut buf, &[("a", "String")]);
        let header_len = buf.len();
        buf.put_var_string(&"x".repeat(100));
        let buf = buf.freeze();

        let mut decoder = RowBinaryDecoder::with_config(&Config::default().max_tail(64));
        assert!(decoder.feed(buf.slice(..header_len + 50)).unwrap().is_none());
        let err = decoder.feed(buf.slice(header_len + 50..header_len + 80)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode(DecodeError::TailTooLarge(64))));
    }
}
