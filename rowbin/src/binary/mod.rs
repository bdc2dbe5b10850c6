//! Row-binary wire format.
//!
//! - [`read`], byte primitives
//! - [`header`], column header
//! - [`decoder`], typed value decoders
pub mod read;
pub mod wide;
pub mod header;
pub mod decoder;

pub use header::{DecodedColumns, decode_header};
pub use decoder::{Decoded, Decoder};
pub use wide::{I256, U256};
