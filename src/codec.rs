//! The contract shared by the binary codecs.
//!
//! A [`DataCodec`] turns a top-level [`DocMap`] or [`DocList`] into bytes and back. Codecs
//! implement four buffer-level methods; slices, writers and readers are handled by the
//! provided methods on top of them.
//!
//! ```rust
//! use datacodec::{doc, CompactCodec, DataCodec, DocCodec};
//!
//! let map = doc!({"a": 1}).as_map().cloned().unwrap();
//! let codecs: Vec<Box<dyn DataCodec>> =
//!     vec![Box::new(DocCodec::new()), Box::new(CompactCodec::new())];
//! for codec in &codecs {
//!     let bytes = codec.serialize_map(&map).unwrap();
//!     assert_eq!(codec.deserialize_map(&bytes).unwrap(), map);
//! }
//! ```

use crate::buffer::{ChunkedBuffer, Endian, DEFAULT_BLOCK_SIZE};
use crate::options::check_buffer_size;
use crate::{DocList, DocMap, Error, Result};
use std::io;

/// How a codec lays out its buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferOptions {
    pub order: Endian,
    /// Block size. `None` uses [`DEFAULT_BLOCK_SIZE`].
    pub buffer_size: Option<usize>,
    /// Split input slices across blocks of `buffer_size` instead of wrapping them whole.
    pub chunked_input: bool,
}

impl Default for BufferOptions {
    fn default() -> Self {
        BufferOptions {
            order: Endian::Little,
            buffer_size: None,
            chunked_input: false,
        }
    }
}

impl BufferOptions {
    /// Creates an empty buffer to encode into.
    pub fn output_buffer(&self) -> Result<ChunkedBuffer<'static>> {
        match self.buffer_size {
            Some(size) => ChunkedBuffer::with_block_size(self.order, size),
            None => Ok(ChunkedBuffer::with_order(self.order)),
        }
    }

    /// Creates a buffer reading `bytes`.
    pub fn input_buffer<'a>(&self, bytes: &'a [u8]) -> Result<ChunkedBuffer<'a>> {
        if self.chunked_input {
            let size = self.buffer_size.unwrap_or(DEFAULT_BLOCK_SIZE);
            return Ok(ChunkedBuffer::chunked(self.order, bytes, size)?);
        }
        check_buffer_size(self.buffer_size)?;
        Ok(ChunkedBuffer::wrap(self.order, bytes))
    }
}

/// A binary codec for top-level maps and lists.
///
/// Implementations report malformed input as [`Error::Decoding`] and unencodable documents
/// as [`Error::Encoding`]. Buffer faults never escape untranslated.
pub trait DataCodec {
    /// Writes `map` at the buffer's cursor.
    fn encode_map(&self, map: &DocMap, buffer: &mut ChunkedBuffer<'_>) -> Result<()>;

    /// Writes `list` at the buffer's cursor.
    fn encode_list(&self, list: &DocList, buffer: &mut ChunkedBuffer<'_>) -> Result<()>;

    /// Reads one map from the buffer's cursor.
    fn decode_map(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<DocMap>;

    /// Reads one list from the buffer's cursor.
    fn decode_list(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<DocList>;

    /// Buffer layout used by the provided methods.
    fn buffer_options(&self) -> BufferOptions {
        BufferOptions::default()
    }

    /// Encodes `map` into a byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if the map cannot be represented, or
    /// [`Error::IllegalArgument`] for an invalid buffer size.
    fn serialize_map(&self, map: &DocMap) -> Result<Vec<u8>> {
        let mut buffer = self.buffer_options().output_buffer()?;
        self.encode_map(map, &mut buffer)?;
        Ok(buffer.into_bytes())
    }

    /// Encodes `list` into a byte vector.
    fn serialize_list(&self, list: &DocList) -> Result<Vec<u8>> {
        let mut buffer = self.buffer_options().output_buffer()?;
        self.encode_list(list, &mut buffer)?;
        Ok(buffer.into_bytes())
    }

    /// Decodes a map from `bytes`. The map must span the whole input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] for malformed or trailing input.
    fn deserialize_map(&self, bytes: &[u8]) -> Result<DocMap> {
        let mut buffer = self.buffer_options().input_buffer(bytes)?;
        let map = self.decode_map(&mut buffer)?;
        expect_exhausted(&buffer)?;
        Ok(map)
    }

    /// Decodes a list from `bytes`. The list must span the whole input.
    fn deserialize_list(&self, bytes: &[u8]) -> Result<DocList> {
        let mut buffer = self.buffer_options().input_buffer(bytes)?;
        let list = self.decode_list(&mut buffer)?;
        expect_exhausted(&buffer)?;
        Ok(list)
    }

    /// Encodes `map` and writes it to `out`.
    fn write_map(&self, map: &DocMap, out: &mut dyn io::Write) -> Result<()> {
        let mut buffer = self.buffer_options().output_buffer()?;
        self.encode_map(map, &mut buffer)?;
        buffer.write_to(out)
    }

    /// Encodes `list` and writes it to `out`.
    fn write_list(&self, list: &DocList, out: &mut dyn io::Write) -> Result<()> {
        let mut buffer = self.buffer_options().output_buffer()?;
        self.encode_list(list, &mut buffer)?;
        buffer.write_to(out)
    }

    /// Reads `input` to its end and decodes one map from it.
    fn read_map(&self, input: &mut dyn io::Read) -> Result<DocMap> {
        let mut buffer = read_all(self.buffer_options(), input)?;
        let map = self.decode_map(&mut buffer)?;
        expect_exhausted(&buffer)?;
        Ok(map)
    }

    /// Reads `input` to its end and decodes one list from it.
    fn read_list(&self, input: &mut dyn io::Read) -> Result<DocList> {
        let mut buffer = read_all(self.buffer_options(), input)?;
        let list = self.decode_list(&mut buffer)?;
        expect_exhausted(&buffer)?;
        Ok(list)
    }
}

fn read_all(options: BufferOptions, input: &mut dyn io::Read) -> Result<ChunkedBuffer<'static>> {
    let mut buffer = options.output_buffer()?;
    let read = buffer.read_from(input)?;
    log::debug!("read {} bytes from stream into {} blocks", read, buffer.block_count());
    buffer.rewind();
    Ok(buffer)
}

fn expect_exhausted(buffer: &ChunkedBuffer<'_>) -> Result<()> {
    match buffer.remaining() {
        0 => Ok(()),
        n => Err(Error::decoding(format!(
            "{} trailing bytes after top-level value",
            n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_buffer_modes() {
        let bytes = [0u8; 40];

        let options = BufferOptions {
            buffer_size: Some(16),
            chunked_input: true,
            ..Default::default()
        };
        assert_eq!(options.input_buffer(&bytes).unwrap().block_count(), 3);

        let options = BufferOptions {
            chunked_input: false,
            ..options
        };
        assert_eq!(options.input_buffer(&bytes).unwrap().block_count(), 1);
    }

    #[test]
    fn test_small_buffer_size_rejected() {
        let options = BufferOptions {
            buffer_size: Some(4),
            ..Default::default()
        };
        assert!(matches!(
            options.output_buffer(),
            Err(Error::IllegalArgument(_))
        ));
        assert!(matches!(
            options.input_buffer(b"x"),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_trailing_bytes() {
        let buffer = ChunkedBuffer::wrap(Endian::Little, b"xy");
        assert!(matches!(expect_exhausted(&buffer), Err(Error::Decoding(_))));
    }
}
