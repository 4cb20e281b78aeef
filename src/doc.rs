//! The document codec.
//!
//! Every value is tagged and every map or list body is prefixed with its byte length. See
//! [`wire`](crate::wire) for the layout.
//!
//! Lengths are not known until a body has been written, so the encoder writes a zero
//! placeholder, records its [`Position`], and backpatches the real length when the body
//! closes. Open bodies are kept on a stack, one entry per nesting level.
//!
//! Decoding is driven by the declared lengths: entries are read until the body's last byte
//! is reached, which must be `END`.
//!
//! ```rust
//! use datacodec::{doc, DataCodec, DocCodec};
//!
//! let map = doc!({"a": 1, "b": [true, null]}).as_map().cloned().unwrap();
//! let bytes = DocCodec::new().serialize_map(&map).unwrap();
//! assert_eq!(bytes.len(), 23);
//! assert_eq!(DocCodec::new().deserialize_map(&bytes).unwrap(), map);
//! ```

use crate::buffer::{ChunkedBuffer, Endian, Position};
use crate::codec::{BufferOptions, DataCodec};
use crate::visit::{self, KeyOrder, Visitor, MAX_DEPTH};
use crate::wire::doc as tag;
use crate::{ByteString, DocList, DocMap, DocOptions, Error, Result, Value};
use std::fmt;

/// Codec for the length-prefixed document format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocCodec {
    options: DocOptions,
    sorted_keys: bool,
}

impl DocCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: DocOptions) -> Self {
        DocCodec {
            options,
            sorted_keys: false,
        }
    }

    /// Writes map entries in ascending key order instead of insertion order.
    #[must_use]
    pub fn with_sorted_keys(mut self, sorted: bool) -> Self {
        self.sorted_keys = sorted;
        self
    }

    #[must_use]
    pub fn options(&self) -> &DocOptions {
        &self.options
    }

    fn key_order(&self) -> KeyOrder {
        if self.sorted_keys {
            KeyOrder::Sorted
        } else {
            KeyOrder::Insertion
        }
    }

    fn encoder<'b, 'a>(&self, buffer: &'b mut ChunkedBuffer<'a>) -> DocEncoder<'b, 'a> {
        DocEncoder {
            buffer,
            open: Vec::new(),
            key_order: self.key_order(),
        }
    }
}

impl fmt::Display for DocCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocCodec({}, sortedKeys={})", self.options, self.sorted_keys)
    }
}

impl DataCodec for DocCodec {
    fn encode_map(&self, map: &DocMap, buffer: &mut ChunkedBuffer<'_>) -> Result<()> {
        let start = buffer.len();
        visit::traverse_map(map, &mut self.encoder(buffer)).map_err(encode_failed)?;
        log::debug!(
            "doc: encoded map of {} entries into {} bytes",
            map.len(),
            buffer.len() - start
        );
        Ok(())
    }

    fn encode_list(&self, list: &DocList, buffer: &mut ChunkedBuffer<'_>) -> Result<()> {
        let start = buffer.len();
        visit::traverse_list(list, &mut self.encoder(buffer)).map_err(encode_failed)?;
        log::debug!(
            "doc: encoded list of {} items into {} bytes",
            list.len(),
            buffer.len() - start
        );
        Ok(())
    }

    fn decode_map(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<DocMap> {
        let map = DocParser::new(buffer)
            .parse_map_body()
            .map_err(decode_failed)?;
        log::debug!("doc: decoded map of {} entries", map.len());
        Ok(map)
    }

    fn decode_list(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<DocList> {
        let list = DocParser::new(buffer)
            .parse_list_body()
            .map_err(decode_failed)?;
        log::debug!("doc: decoded list of {} items", list.len());
        Ok(list)
    }

    fn buffer_options(&self) -> BufferOptions {
        BufferOptions {
            order: Endian::Little,
            buffer_size: self.options.buffer_size,
            chunked_input: self.options.chunked_input,
        }
    }
}

fn encode_failed(err: Error) -> Error {
    let err = err.into_encoding();
    log::debug!("doc: encoding failed: {}", err);
    err
}

fn decode_failed(err: Error) -> Error {
    let err = err.into_decoding();
    log::debug!("doc: decoding failed: {}", err);
    err
}

fn length_prefix(len: usize, what: &str) -> Result<i32> {
    i32::try_from(len)
        .map_err(|_| Error::encoding(format!("{} of {} bytes exceeds a 32-bit length", what, len)))
}

struct DocEncoder<'b, 'a> {
    buffer: &'b mut ChunkedBuffer<'a>,
    /// Placeholder positions of bodies still being written.
    open: Vec<Position>,
    key_order: KeyOrder,
}

impl DocEncoder<'_, '_> {
    fn at_top(&self) -> bool {
        self.open.is_empty()
    }

    fn start_body(&mut self, composite_tag: u8) {
        if !self.at_top() {
            self.buffer.put_u8(composite_tag);
        }
        self.open.push(self.buffer.position());
        self.buffer.put_i32(0);
    }

    fn end_body(&mut self) -> Result<()> {
        self.buffer.put_u8(tag::END);
        let start = self
            .open
            .pop()
            .ok_or_else(|| Error::encoding("Body closed without being opened"))?;
        let end = self.buffer.position();
        let len = length_prefix(self.buffer.offset(start, end)?, "Body")?;

        self.buffer.set_position(start)?;
        self.buffer.put_i32(len);
        self.buffer.set_position(end)
    }

    fn empty_body(&mut self, empty_tag: u8) {
        if self.at_top() {
            self.buffer.put_i32(tag::EMPTY_BODY_LEN);
            self.buffer.put_u8(tag::END);
        } else {
            self.buffer.put_u8(empty_tag);
        }
    }
}

impl Visitor for DocEncoder<'_, '_> {
    fn key_order(&self) -> KeyOrder {
        self.key_order
    }

    fn visit_null(&mut self) -> Result<()> {
        self.buffer.put_u8(tag::NULL);
        Ok(())
    }

    fn visit_bool(&mut self, value: bool) -> Result<()> {
        self.buffer.put_u8(tag::BOOL);
        self.buffer.put_u8(u8::from(value));
        Ok(())
    }

    fn visit_i32(&mut self, value: i32) -> Result<()> {
        self.buffer.put_u8(tag::INT32);
        self.buffer.put_i32(value);
        Ok(())
    }

    fn visit_i64(&mut self, value: i64) -> Result<()> {
        self.buffer.put_u8(tag::INT64);
        self.buffer.put_i64(value);
        Ok(())
    }

    fn visit_f32(&mut self, value: f32) -> Result<()> {
        self.visit_f64(f64::from(value))
    }

    fn visit_f64(&mut self, value: f64) -> Result<()> {
        self.buffer.put_u8(tag::DOUBLE);
        self.buffer.put_f64(value);
        Ok(())
    }

    fn visit_str(&mut self, value: &str) -> Result<()> {
        let len = length_prefix(value.len() + 1, "String")?;
        self.buffer.put_u8(tag::STRING);
        self.buffer.put_i32(len);
        self.buffer.put_utf8_cstring(value);
        Ok(())
    }

    fn visit_bytes(&mut self, value: &ByteString) -> Result<()> {
        let len = length_prefix(value.len(), "Binary value")?;
        self.buffer.put_u8(tag::BINARY);
        self.buffer.put_i32(len);
        self.buffer.put_u8(tag::BINARY_SUBTYPE);
        self.buffer.put_byte_string(value);
        Ok(())
    }

    fn empty_map(&mut self) -> Result<()> {
        self.empty_body(tag::MAP_EMPTY);
        Ok(())
    }

    fn start_map(&mut self, _map: &DocMap) -> Result<()> {
        self.start_body(tag::MAP);
        Ok(())
    }

    fn key(&mut self, key: &str) -> Result<()> {
        if key.contains('\0') {
            return Err(Error::encoding(format!(
                "Key {:?} contains a NUL byte",
                key
            )));
        }
        self.buffer.put_utf8_cstring(key);
        Ok(())
    }

    fn end_map(&mut self) -> Result<()> {
        self.end_body()
    }

    fn empty_list(&mut self) -> Result<()> {
        self.empty_body(tag::LIST_EMPTY);
        Ok(())
    }

    fn start_list(&mut self, _list: &DocList) -> Result<()> {
        self.start_body(tag::LIST);
        Ok(())
    }

    fn end_list(&mut self) -> Result<()> {
        self.end_body()
    }
}

struct DocParser<'b, 'a> {
    buffer: &'b mut ChunkedBuffer<'a>,
    depth: usize,
}

impl<'b, 'a> DocParser<'b, 'a> {
    fn new(buffer: &'b mut ChunkedBuffer<'a>) -> Self {
        DocParser { buffer, depth: 0 }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(Error::decoding(format!(
                "Nesting depth exceeds the limit of {}",
                MAX_DEPTH
            )));
        }
        Ok(())
    }

    /// Reads a body's length prefix and returns it with the body's start position.
    fn open_body(&mut self) -> Result<(Position, usize)> {
        self.enter()?;
        let start = self.buffer.position();
        let len = self.buffer.get_i32()?;
        if len < tag::EMPTY_BODY_LEN {
            return Err(Error::decoding(format!("Invalid body length {}", len)));
        }
        let len = len as usize;
        let available = self.buffer.remaining() + 4;
        if len > available {
            return Err(Error::decoding(format!(
                "Body length {} exceeds the {} bytes available",
                len, available
            )));
        }
        Ok((start, len))
    }

    /// Returns `true` while entries remain before the body's `END` byte.
    fn has_entries(&self, start: Position, len: usize) -> Result<bool> {
        let consumed = self.buffer.offset(start, self.buffer.position())?;
        Ok(consumed < len - 1)
    }

    fn close_body(&mut self, start: Position, len: usize) -> Result<()> {
        let end = self.buffer.get_u8()?;
        if end != tag::END {
            return Err(Error::decoding(format!(
                "Expected end of body, found 0x{:02x}",
                end
            )));
        }
        let consumed = self.buffer.offset(start, self.buffer.position())?;
        if consumed != len {
            return Err(Error::decoding(format!(
                "Body declared {} bytes but spans {}",
                len, consumed
            )));
        }
        self.depth -= 1;
        Ok(())
    }

    fn parse_map_body(&mut self) -> Result<DocMap> {
        let (start, len) = self.open_body()?;
        let mut map = DocMap::new();
        while self.has_entries(start, len)? {
            let key = self.buffer.get_utf8_cstring()?;
            let value_tag = self.buffer.get_u8()?;
            let value = self.parse_value(value_tag)?;
            map.insert(key, value);
        }
        self.close_body(start, len)?;
        Ok(map)
    }

    fn parse_list_body(&mut self) -> Result<DocList> {
        let (start, len) = self.open_body()?;
        let mut list = DocList::new();
        while self.has_entries(start, len)? {
            let value_tag = self.buffer.get_u8()?;
            list.push(self.parse_value(value_tag)?);
        }
        self.close_body(start, len)?;
        Ok(list)
    }

    fn parse_value(&mut self, value_tag: u8) -> Result<Value> {
        let value = match value_tag {
            tag::DOUBLE => Value::Float64(self.buffer.get_f64()?),
            tag::STRING => {
                let len = self.buffer.get_i32()?;
                if len <= 0 {
                    return Err(Error::decoding(format!("Invalid string length {}", len)));
                }
                Value::Str(self.buffer.get_utf8_cstring_len(len as usize)?)
            }
            tag::MAP => Value::Map(self.parse_map_body()?),
            tag::LIST => Value::List(self.parse_list_body()?),
            tag::BINARY => {
                let len = self.buffer.get_i32()?;
                if len < 0 {
                    return Err(Error::decoding(format!("Invalid binary length {}", len)));
                }
                let _subtype = self.buffer.get_u8()?;
                Value::Bytes(self.buffer.get_byte_string(len as usize)?)
            }
            tag::BOOL => Value::Bool(self.buffer.get_u8()? != 0),
            tag::NULL => Value::Null,
            tag::INT32 => Value::Int32(self.buffer.get_i32()?),
            tag::INT64 => Value::Int64(self.buffer.get_i64()?),
            tag::MAP_EMPTY => Value::Map(DocMap::new()),
            tag::LIST_EMPTY => Value::List(DocList::new()),
            other => {
                return Err(Error::decoding(format!(
                    "Illegal element code 0x{:02x}",
                    other
                )))
            }
        };
        Ok(value)
    }
}
