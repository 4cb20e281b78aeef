//! The compact codec.
//!
//! Map keys are interned per call: the encoder hands out indices from 1 in the order keys
//! are first written, and the decoder rebuilds the same table as it reads. Repeated keys
//! therefore cost one or two bytes each. See [`wire`](crate::wire) for the layout.
//!
//! ```rust
//! use datacodec::{doc, CompactCodec, DataCodec, Value};
//!
//! let list = vec![doc!({"name": "a"}), doc!({"name": "b"})];
//! let codec = CompactCodec::new();
//! let bytes = codec.serialize_list(&list).unwrap();
//!
//! // "name" is spelled out once.
//! assert_eq!(bytes.windows(4).filter(|w| w == b"name").count(), 1);
//! assert_eq!(codec.deserialize_list(&bytes).unwrap(), list);
//! ```

use crate::buffer::{ChunkedBuffer, Endian};
use crate::codec::{BufferOptions, DataCodec};
use crate::visit::{self, KeyOrder, Visitor, MAX_DEPTH};
use crate::wire::compact as tag;
use crate::{ByteString, CompactOptions, DocList, DocMap, Error, Result, Value};
use indexmap::IndexSet;
use std::fmt;

/// Codec for the key-interning compact format.
///
/// # Examples
///
/// ```rust
/// use datacodec::{CompactCodec, CompactOptions};
///
/// let codec = CompactCodec::with_options(CompactOptions::new().with_collection_count(true));
/// assert!(codec.options().encode_collection_count);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompactCodec {
    options: CompactOptions,
    sorted_keys: bool,
}

impl CompactCodec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_options(options: CompactOptions) -> Self {
        CompactCodec {
            options,
            sorted_keys: false,
        }
    }

    /// Writes map entries in ascending key order instead of insertion order.
    ///
    /// Key indices are then assigned in that order too, so equal documents always produce
    /// identical bytes.
    #[must_use]
    pub fn with_sorted_keys(mut self, sorted: bool) -> Self {
        self.sorted_keys = sorted;
        self
    }

    #[must_use]
    pub fn options(&self) -> &CompactOptions {
        &self.options
    }

    fn encoder<'o, 'b, 'a>(
        &'o self,
        buffer: &'b mut ChunkedBuffer<'a>,
    ) -> CompactEncoder<'o, 'b, 'a> {
        CompactEncoder {
            buffer,
            options: &self.options,
            keys: IndexSet::new(),
            key_order: if self.sorted_keys {
                KeyOrder::Sorted
            } else {
                KeyOrder::Insertion
            },
        }
    }

    fn decode_value(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<Value> {
        let mut parser = CompactParser::new(buffer);
        parser.expect_header()?;
        let value_tag = parser.buffer.get_u8()?;
        let value = parser
            .parse_value(value_tag)?
            .ok_or_else(|| Error::decoding("Unexpected end of list marker at the top level"))?;
        log::debug!(
            "compact: decoded {} with {} interned keys",
            value.type_name(),
            parser.key_count()
        );
        Ok(value)
    }
}

impl fmt::Display for CompactCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CompactCodec({}, sortedKeys={})",
            self.options, self.sorted_keys
        )
    }
}

impl DataCodec for CompactCodec {
    fn encode_map(&self, map: &DocMap, buffer: &mut ChunkedBuffer<'_>) -> Result<()> {
        let start = buffer.len();
        let mut encoder = self.encoder(buffer);
        encoder.put_header();
        visit::traverse_map(map, &mut encoder).map_err(encode_failed)?;
        let keys = encoder.keys.len();
        log::debug!(
            "compact: encoded map of {} entries into {} bytes with {} interned keys",
            map.len(),
            buffer.len() - start,
            keys
        );
        Ok(())
    }

    fn encode_list(&self, list: &DocList, buffer: &mut ChunkedBuffer<'_>) -> Result<()> {
        let start = buffer.len();
        let mut encoder = self.encoder(buffer);
        encoder.put_header();
        visit::traverse_list(list, &mut encoder).map_err(encode_failed)?;
        let keys = encoder.keys.len();
        log::debug!(
            "compact: encoded list of {} items into {} bytes with {} interned keys",
            list.len(),
            buffer.len() - start,
            keys
        );
        Ok(())
    }

    fn decode_map(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<DocMap> {
        match self.decode_value(buffer).map_err(decode_failed)? {
            Value::Map(map) => Ok(map),
            other => Err(decode_failed(Error::decoding(format!(
                "Expected a map at the top level, found {}",
                other.type_name()
            )))),
        }
    }

    fn decode_list(&self, buffer: &mut ChunkedBuffer<'_>) -> Result<DocList> {
        match self.decode_value(buffer).map_err(decode_failed)? {
            Value::List(list) => Ok(list),
            other => Err(decode_failed(Error::decoding(format!(
                "Expected a list at the top level, found {}",
                other.type_name()
            )))),
        }
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
    log::debug!("compact: encoding failed: {}", err);
    err
}

fn decode_failed(err: Error) -> Error {
    let err = err.into_decoding();
    log::debug!("compact: decoding failed: {}", err);
    err
}

struct CompactEncoder<'o, 'b, 'a> {
    buffer: &'b mut ChunkedBuffer<'a>,
    options: &'o CompactOptions,
    /// Keys written so far. A key's wire index is its position plus one.
    keys: IndexSet<String>,
    key_order: KeyOrder,
}

impl CompactEncoder<'_, '_, '_> {
    fn put_header(&mut self) {
        self.buffer.put_slice(&tag::HEADER);
    }

    fn put_count(&mut self, len: usize) -> Result<()> {
        let count = u32::try_from(len)
            .map_err(|_| Error::encoding(format!("Collection of {} entries is too large", len)))?;
        self.buffer.put_var_u32(count);
        Ok(())
    }
}

fn wire_index(position: usize) -> Result<i32> {
    i32::try_from(position + 1)
        .map_err(|_| Error::encoding("Too many distinct keys for the key dictionary"))
}

impl Visitor for CompactEncoder<'_, '_, '_> {
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
        self.buffer.put_u8(tag::FLOAT32);
        self.buffer.put_f32(value);
        Ok(())
    }

    fn visit_f64(&mut self, value: f64) -> Result<()> {
        self.buffer.put_u8(tag::FLOAT64);
        self.buffer.put_f64(value);
        Ok(())
    }

    fn visit_str(&mut self, value: &str) -> Result<()> {
        if value.is_empty() {
            self.buffer.put_u8(tag::STRING_EMPTY);
            return Ok(());
        }
        // A NUL would end a terminator-scanned string early.
        if !self.options.encode_string_length && !value.contains('\0') {
            self.buffer.put_u8(tag::STRING);
            self.buffer.put_utf8_cstring(value);
            return Ok(());
        }

        let len = value.len() + 1;
        match i16::try_from(len) {
            Ok(short) if self.options.short_string_length => {
                self.buffer.put_u8(tag::STRING_LEN2);
                self.buffer.put_i16(short);
            }
            _ => {
                let long = i32::try_from(len).map_err(|_| {
                    Error::encoding(format!("String of {} bytes exceeds a 32-bit length", len))
                })?;
                self.buffer.put_u8(tag::STRING_LEN4);
                self.buffer.put_i32(long);
            }
        }
        self.buffer.put_utf8_cstring(value);
        Ok(())
    }

    fn visit_bytes(&mut self, value: &ByteString) -> Result<()> {
        let len = i32::try_from(value.len()).map_err(|_| {
            Error::encoding(format!(
                "Binary value of {} bytes exceeds a 32-bit length",
                value.len()
            ))
        })?;
        self.buffer.put_u8(tag::BINARY);
        self.buffer.put_i32(len);
        self.buffer.put_byte_string(value);
        Ok(())
    }

    fn empty_map(&mut self) -> Result<()> {
        self.buffer.put_u8(tag::MAP_EMPTY);
        Ok(())
    }

    fn start_map(&mut self, map: &DocMap) -> Result<()> {
        if self.options.encode_collection_count {
            self.buffer.put_u8(tag::MAP_WITH_COUNT);
            self.put_count(map.len())
        } else {
            self.buffer.put_u8(tag::MAP);
            Ok(())
        }
    }

    fn key(&mut self, key: &str) -> Result<()> {
        if key.contains('\0') {
            return Err(Error::encoding(format!(
                "Key {:?} contains a NUL byte",
                key
            )));
        }
        if let Some(position) = self.keys.get_index_of(key) {
            self.buffer.put_var_i32(wire_index(position)?);
            return Ok(());
        }

        let index = wire_index(self.keys.len())?;
        self.keys.insert(key.to_string());
        self.buffer.put_var_i32(-index);
        self.buffer.put_utf8_cstring(key);
        Ok(())
    }

    fn end_map(&mut self) -> Result<()> {
        self.buffer.put_var_i32(tag::END_OF_MAP);
        Ok(())
    }

    fn empty_list(&mut self) -> Result<()> {
        self.buffer.put_u8(tag::LIST_EMPTY);
        Ok(())
    }

    fn start_list(&mut self, list: &DocList) -> Result<()> {
        if self.options.encode_collection_count {
            self.buffer.put_u8(tag::LIST_WITH_COUNT);
            self.put_count(list.len())
        } else {
            self.buffer.put_u8(tag::LIST);
            Ok(())
        }
    }

    fn end_list(&mut self) -> Result<()> {
        self.buffer.put_u8(tag::LIST_END);
        Ok(())
    }
}

struct CompactParser<'b, 'a> {
    buffer: &'b mut ChunkedBuffer<'a>,
    /// Keys by wire index. Slot 0 is never used.
    keys: Vec<Option<String>>,
    next_key: usize,
    depth: usize,
}

impl<'b, 'a> CompactParser<'b, 'a> {
    fn new(buffer: &'b mut ChunkedBuffer<'a>) -> Self {
        CompactParser {
            buffer,
            keys: vec![None; tag::INITIAL_KEY_SLOTS],
            next_key: 1,
            depth: 0,
        }
    }

    fn key_count(&self) -> usize {
        self.next_key - 1
    }

    fn expect_header(&mut self) -> Result<()> {
        let mut header = [0u8; 8];
        self.buffer.get_slice(&mut header)?;
        if header != tag::HEADER {
            return Err(Error::decoding(format!(
                "Expected header {:02x?} but got {:02x?}",
                tag::HEADER,
                header
            )));
        }
        Ok(())
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

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn read_count(&mut self, with_count: bool) -> Result<Option<usize>> {
        if with_count {
            Ok(Some(self.buffer.get_var_u32()? as usize))
        } else {
            Ok(None)
        }
    }

    /// Parses the value introduced by `value_tag`. Returns `None` for the end-of-list marker.
    fn parse_value(&mut self, value_tag: u8) -> Result<Option<Value>> {
        let value = match value_tag {
            tag::MAP_EMPTY => Value::Map(DocMap::new()),
            tag::MAP => Value::Map(self.parse_map(false)?),
            tag::MAP_WITH_COUNT => Value::Map(self.parse_map(true)?),
            tag::LIST_EMPTY => Value::List(DocList::new()),
            tag::LIST => Value::List(self.parse_list(false)?),
            tag::LIST_WITH_COUNT => Value::List(self.parse_list(true)?),
            tag::INT32 => Value::Int32(self.buffer.get_i32()?),
            tag::INT64 => Value::Int64(self.buffer.get_i64()?),
            tag::FLOAT32 => Value::Float32(self.buffer.get_f32()?),
            tag::FLOAT64 => Value::Float64(self.buffer.get_f64()?),
            tag::STRING_EMPTY => Value::Str(String::new()),
            tag::STRING => Value::Str(self.buffer.get_utf8_cstring()?),
            tag::STRING_LEN4 => {
                let len = self.buffer.get_i32()?;
                Value::Str(self.string_with_length(len)?)
            }
            tag::STRING_LEN2 => {
                let len = self.buffer.get_i16()?;
                Value::Str(self.string_with_length(i32::from(len))?)
            }
            tag::BOOL => Value::Bool(self.buffer.get_u8()? != 0),
            tag::BINARY => {
                let len = self.buffer.get_i32()?;
                if len < 0 {
                    return Err(Error::decoding(format!("Invalid binary length {}", len)));
                }
                Value::Bytes(self.buffer.get_byte_string(len as usize)?)
            }
            tag::NULL => Value::Null,
            tag::LIST_END => return Ok(None),
            other => {
                return Err(Error::decoding(format!(
                    "Illegal element code 0x{:02x}",
                    other
                )))
            }
        };
        Ok(Some(value))
    }

    fn string_with_length(&mut self, len: i32) -> Result<String> {
        if len <= 0 {
            return Err(Error::decoding(format!(
                "String length should be positive, got {}",
                len
            )));
        }
        self.buffer.get_utf8_cstring_len(len as usize)
    }

    fn parse_list(&mut self, with_count: bool) -> Result<DocList> {
        self.enter()?;
        let count = self.read_count(with_count)?;
        let mut list = DocList::with_capacity(self.capacity_hint(count));
        loop {
            let value_tag = self.buffer.get_u8()?;
            match self.parse_value(value_tag)? {
                Some(value) => list.push(value),
                None => break,
            }
        }
        if let Some(count) = count {
            if count != list.len() {
                return Err(Error::decoding(format!(
                    "List declared {} items but holds {}",
                    count,
                    list.len()
                )));
            }
        }
        self.leave();
        Ok(list)
    }

    fn parse_map(&mut self, with_count: bool) -> Result<DocMap> {
        self.enter()?;
        let count = self.read_count(with_count)?;
        let mut map = DocMap::with_capacity(self.capacity_hint(count));
        let mut entries = 0;
        loop {
            let index = self.buffer.get_var_i32()?;
            if index == tag::END_OF_MAP {
                break;
            }
            let key = self.resolve_key(index)?;
            let value_tag = self.buffer.get_u8()?;
            let value = self
                .parse_value(value_tag)?
                .ok_or_else(|| Error::decoding("Unexpected end of list marker in a map"))?;
            map.insert(key, value);
            entries += 1;
        }
        if let Some(count) = count {
            if count != entries {
                return Err(Error::decoding(format!(
                    "Map declared {} entries but holds {}",
                    count, entries
                )));
            }
        }
        self.leave();
        Ok(map)
    }

    /// Declared counts are untrusted, so preallocation is bounded by the input left.
    fn capacity_hint(&self, count: Option<usize>) -> usize {
        count.unwrap_or(0).min(self.buffer.remaining())
    }

    fn resolve_key(&mut self, index: i32) -> Result<String> {
        if index > 0 {
            return self
                .keys
                .get(index as usize)
                .and_then(Clone::clone)
                .ok_or_else(|| {
                    Error::decoding(format!("Key index {} has not been defined", index))
                });
        }

        let index = index.unsigned_abs() as usize;
        if index != self.next_key {
            return Err(Error::decoding(format!(
                "Received new key index {} but expecting {}",
                index, self.next_key
            )));
        }
        self.next_key += 1;
        while index >= self.keys.len() {
            let grown = self.keys.len() * 2;
            log::trace!("compact: growing key table to {} slots", grown);
            self.keys.resize(grown, None);
        }
        let key = self.buffer.get_utf8_cstring()?;
        self.keys[index] = Some(key.clone());
        Ok(key)
    }
}
