//! Streaming `RowBinaryWithNamesAndTypes` Decoder
//!
//! # Examples
//!
//! Decode chunks as they arrive:
//!
//! ```
//! use bytes::{BufMut, BytesMut};
//! use rowbin::{BufMutExt, RowBinaryDecoder};
//!
//! # fn app() -> rowbin::Result<()> {
//! let mut payload = BytesMut::new();
//! payload.put_var_uint(2);
//! payload.put_var_string("id");
//! payload.put_var_string("name");
//! payload.put_var_string("UInt8");
//! payload.put_var_string("String");
//! payload.put_u8(42);
//! payload.put_var_string("Foo");
//! let mut payload = payload.freeze();
//!
//! let mut decoder = RowBinaryDecoder::new();
//! let mut rows = vec![];
//!
//! // chunk boundary is arbitrary
//! while !payload.is_empty() {
//!     let chunk = payload.split_to(payload.len().min(3));
//!     rows.extend(decoder.feed(chunk)?.unwrap_or_default());
//! }
//! rows.extend(decoder.finalize()?);
//!
//! let (id, name) = rows.remove(0).decode::<(u8, String)>()?;
//! assert_eq!(id, 42);
//! assert_eq!(name, "Foo");
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```
//!
//! Parse column type:
//!
//! ```
//! use rowbin::column_type::{TypeKind, parse_type};
//!
//! let ty = parse_type("Array(Array(Nullable(Int32)))").unwrap();
//! let TypeKind::Array { inner, dimensions } = ty.kind else { unreachable!() };
//! assert_eq!(dimensions, 2);
//! assert_eq!(inner.source_type, "Nullable(Int32)");
//!
//! let err = parse_type("FixedString(0)").unwrap_err();
//! assert_eq!(err.to_string(), "Invalid FixedString size in bytes: FixedString(0)");
//! ```
//!
//! Collect rows from async byte source:
//!
//! ```no_run
//! use rowbin::{Config, FromRow, io::ReadChunks};
//!
//! #[derive(FromRow)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! # async fn app(reader: impl tokio::io::AsyncRead + Unpin) -> rowbin::Result<()> {
//! let config = Config::from_env();
//! let users: Vec<User> = rowbin::fetch_all(ReadChunks::new(reader, &config), &config).await?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod ext;

// Wire format
pub mod binary;
pub mod column_type;

// Value
pub mod mapper;
pub mod value;
pub mod row;
pub mod types;

// Streaming
pub mod stream;
pub mod transport;
#[cfg(feature = "tokio")]
pub mod io;
pub mod fetch;

pub mod config;
pub mod error;


pub use binary::header::{DecodedColumns, decode_header};
pub use column_type::{ColumnType, ParseTypeError, parse_type};
pub use ext::BufMutExt;
pub use mapper::{DefaultMapper, Mapper};
pub use value::Value;
pub use row::{Row, FromRow, Decode, DecodeError};
pub use stream::{RowBatch, RowBinaryDecoder};

#[doc(inline)]
pub use fetch::{fetch_all, fetch_one};
pub use config::Config;
pub use error::{Error, Result};

#[cfg(feature = "macros")]
pub use rowbin_macros::{FromRow, Decode};
