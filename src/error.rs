//! Error types for the chunked buffer and the binary codecs.
//!
//! ## Error Categories
//!
//! - **Buffer underflow**: a read asked for more bytes than the buffer holds
//! - **Decoding errors**: malformed framing such as an unknown tag, a bad header, a
//!   key-dictionary index out of order, or a declared length that does not match the content
//! - **Encoding errors**: a document that cannot be written, for example one nested deeper
//!   than [`MAX_DEPTH`](crate::MAX_DEPTH) or a key containing a NUL byte
//! - **Illegal arguments**: misuse of the buffer API, such as applying a
//!   [`Position`](crate::Position) to a buffer that did not produce it
//! - **I/O errors**: failures of the reader or writer handed to a streaming call
//!
//! ## Codec boundaries
//!
//! Callers of a codec treat "this payload is corrupt" uniformly, so the codecs translate
//! buffer faults with [`Error::into_decoding`] and [`Error::into_encoding`] before
//! returning them.
//!
//! ```rust
//! use datacodec::{ChunkedBuffer, Error};
//!
//! let mut buffer = ChunkedBuffer::wrap(datacodec::Endian::Little, &[1, 2]);
//! let err = buffer.get_i32().unwrap_err();
//! assert!(matches!(err, Error::BufferUnderflow { requested: 4, available: 2 }));
//! assert!(matches!(err.into_decoding(), Error::Decoding(_)));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all errors produced by the buffer and the codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Tried to read more bytes than remain in the buffer.
    #[error("Buffer underflow: requested {requested} bytes, only {available} available")]
    BufferUnderflow { requested: usize, available: usize },

    /// Malformed input for a codec.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// A document that cannot be represented in the target format.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Misuse of the buffer API.
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a buffer underflow error.
    pub fn underflow(requested: usize, available: usize) -> Self {
        Error::BufferUnderflow {
            requested,
            available,
        }
    }

    /// Creates a decoding error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use datacodec::Error;
    ///
    /// let err = Error::decoding("Illegal element code 99");
    /// assert!(err.to_string().contains("element code 99"));
    /// ```
    pub fn decoding<T: fmt::Display>(msg: T) -> Self {
        Error::Decoding(msg.to_string())
    }

    /// Creates an encoding error.
    pub fn encoding<T: fmt::Display>(msg: T) -> Self {
        Error::Encoding(msg.to_string())
    }

    /// Creates an illegal argument error.
    pub fn illegal_argument<T: fmt::Display>(msg: T) -> Self {
        Error::IllegalArgument(msg.to_string())
    }

    /// Creates an I/O error for stream reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Translates a buffer fault raised while decoding into a [`Error::Decoding`].
    ///
    /// Decoding and I/O errors pass through unchanged.
    #[must_use]
    pub fn into_decoding(self) -> Self {
        match self {
            Error::BufferUnderflow {
                requested,
                available,
            } => Error::Decoding(format!(
                "Unexpected end of input: needed {} bytes, {} available",
                requested, available
            )),
            Error::IllegalArgument(msg) | Error::Encoding(msg) | Error::Custom(msg) => {
                Error::Decoding(msg)
            }
            other => other,
        }
    }

    /// Translates a buffer fault raised while encoding into an [`Error::Encoding`].
    ///
    /// Encoding and I/O errors pass through unchanged.
    #[must_use]
    pub fn into_encoding(self) -> Self {
        match self {
            Error::BufferUnderflow { .. } => Error::Encoding(self.to_string()),
            Error::IllegalArgument(msg) | Error::Decoding(msg) | Error::Custom(msg) => {
                Error::Encoding(msg)
            }
            other => other,
        }
    }

    /// Returns `true` for errors that mean the payload itself is corrupt.
    #[must_use]
    pub const fn is_decoding(&self) -> bool {
        matches!(self, Error::Decoding(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::io(&e.to_string())
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

impl serde::de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
