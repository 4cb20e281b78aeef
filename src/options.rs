//! Configuration options for the binary codecs.
//!
//! - [`DocOptions`]: buffer settings for the document codec
//! - [`CompactOptions`]: string, count and buffer settings for the compact codec
//!
//! Both are plain data with serde derives, so they can be embedded in an application's
//! configuration file.
//!
//! ## Examples
//!
//! ```rust
//! use datacodec::{CompactCodec, CompactOptions, DataCodec, doc};
//!
//! let options = CompactOptions::new()
//!     .with_collection_count(true)
//!     .with_short_string_length(true);
//! let codec = CompactCodec::with_options(options);
//!
//! let map = doc!({"k": "v"}).as_map().cloned().unwrap();
//! let bytes = codec.serialize_map(&map).unwrap();
//! assert_eq!(codec.deserialize_map(&bytes).unwrap(), map);
//! ```

use crate::buffer::MIN_BLOCK_SIZE;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration for [`DocCodec`](crate::DocCodec).
///
/// # Examples
///
/// ```rust
/// use datacodec::DocOptions;
///
/// let options = DocOptions::new().with_buffer_size(64).with_chunked_input(true);
/// assert_eq!(options.buffer_size, Some(64));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocOptions {
    /// Block size of the chunked buffer. `None` uses the buffer's default.
    pub buffer_size: Option<usize>,
    /// Copy input into blocks of `buffer_size` instead of wrapping it as one block.
    pub chunked_input: bool,
}

impl DocOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_chunked_input(mut self, chunked: bool) -> Self {
        self.chunked_input = chunked;
        self
    }
}

impl fmt::Display for DocOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bufferSize={}, chunkedInput={}",
            DisplaySize(self.buffer_size),
            self.chunked_input
        )
    }
}

/// Configuration for [`CompactCodec`](crate::CompactCodec).
///
/// The defaults write length-prefixed strings and no collection counts.
///
/// # Examples
///
/// ```rust
/// use datacodec::CompactOptions;
///
/// let options = CompactOptions::new();
/// assert!(options.encode_string_length);
/// assert!(!options.encode_collection_count);
/// assert!(!options.short_string_length);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompactOptions {
    /// Prefix strings with their length instead of scanning for a terminator.
    pub encode_string_length: bool,
    /// Prefix maps and lists with their entry count.
    pub encode_collection_count: bool,
    /// Use a 16-bit length prefix for length-prefixed strings that fit.
    pub short_string_length: bool,
    /// Block size of the chunked buffer. `None` uses the buffer's default.
    pub buffer_size: Option<usize>,
    /// Copy input into blocks of `buffer_size` instead of wrapping it as one block.
    pub chunked_input: bool,
}

impl Default for CompactOptions {
    fn default() -> Self {
        CompactOptions {
            encode_string_length: true,
            encode_collection_count: false,
            short_string_length: false,
            buffer_size: None,
            chunked_input: false,
        }
    }
}

impl CompactOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_string_length(mut self, enabled: bool) -> Self {
        self.encode_string_length = enabled;
        self
    }

    #[must_use]
    pub fn with_collection_count(mut self, enabled: bool) -> Self {
        self.encode_collection_count = enabled;
        self
    }

    /// Enables the 16-bit string length prefix.
    ///
    /// ```rust
    /// use datacodec::CompactOptions;
    ///
    /// let options = CompactOptions::new().with_short_string_length(true);
    /// assert!(options.short_string_length);
    /// ```
    #[must_use]
    pub fn with_short_string_length(mut self, enabled: bool) -> Self {
        self.short_string_length = enabled;
        self
    }

    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = Some(size);
        self
    }

    #[must_use]
    pub fn with_chunked_input(mut self, chunked: bool) -> Self {
        self.chunked_input = chunked;
        self
    }
}

impl fmt::Display for CompactOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "encodeStringLength={}, encodeCollectionCount={}, shortStringLength={}, \
             bufferSize={}, chunkedInput={}",
            self.encode_string_length,
            self.encode_collection_count,
            self.short_string_length,
            DisplaySize(self.buffer_size),
            self.chunked_input
        )
    }
}

/// Checks a configured block size against the buffer minimum.
pub(crate) fn check_buffer_size(size: Option<usize>) -> Result<()> {
    match size {
        Some(size) if size < MIN_BLOCK_SIZE => Err(Error::illegal_argument(format!(
            "Buffer size {} is below the minimum of {}",
            size, MIN_BLOCK_SIZE
        ))),
        _ => Ok(()),
    }
}

struct DisplaySize(Option<usize>);

impl fmt::Display for DisplaySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(size) => write!(f, "{}", size),
            None => write!(f, "default"),
        }
    }
}
