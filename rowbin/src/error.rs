//! `rowbin` error types.
use std::{backtrace::Backtrace, fmt, io};

use crate::{
    column_type::ParseTypeError,
    config::ConfigError,
    row::{DecodeError, RowNotFound},
};

/// A specialized [`Result`] type for `rowbin` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible error from `rowbin` library.
pub struct Error {
    context: String,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Add context to the error message.
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    /// Returns `true` if the stream ends before the data it declares.
    pub fn is_truncated(&self) -> bool {
        matches!(self.kind, ErrorKind::Truncated(_))
    }
}

/// All possible error kind from `rowbin` library.
pub enum ErrorKind {
    /// Malformed or unsupported column type in the header.
    ColumnType(ParseTypeError),
    /// Stream ends in the middle of a row.
    Truncated(TruncatedError),
    Decode(DecodeError),
    Io(io::Error),
    Config(ConfigError),
    RowNotFound(RowNotFound),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { context: String::new(), backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ParseTypeError>e => ErrorKind::ColumnType(e));
from!(<TruncatedError>e => ErrorKind::Truncated(e));
from!(<DecodeError>e => ErrorKind::Decode(e));
from!(<std::io::Error>e => ErrorKind::Io(e));
from!(<ConfigError>e => ErrorKind::Config(e));
from!(<RowNotFound>e => ErrorKind::RowNotFound(e));

impl std::error::Error for Error { }

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }

        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl std::error::Error for ErrorKind { }

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ColumnType(e) => e.fmt(f),
            Self::Truncated(e) => e.fmt(f),
            Self::Decode(e) => e.fmt(f),
            Self::Io(e) => e.fmt(f),
            Self::Config(e) => e.fmt(f),
            Self::RowNotFound(e) => e.fmt(f),
        }
    }
}

impl fmt::Debug for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

/// An error when stream ends in the middle of a row.
///
/// Rows decoded before the truncation are already delivered, the partial row
/// is never surfaced.
pub struct TruncatedError {
    pub(crate) tail_len: usize,
    pub(crate) column_index: usize,
}

impl TruncatedError {
    /// Number of undecoded bytes at the end of the stream.
    pub fn tail_len(&self) -> usize {
        self.tail_len
    }

    /// Column of the partial row where decoding stopped.
    pub fn column_index(&self) -> usize {
        self.column_index
    }
}

impl std::error::Error for TruncatedError { }

impl fmt::Display for TruncatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "truncated stream, {} undecoded bytes at column {}",
            self.tail_len, self.column_index,
        )
    }
}

impl fmt::Debug for TruncatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
