//! # datacodec
//!
//! A schema-less document model with two binary codecs built on a growable chunked buffer.
//!
//! ## What is in the box?
//!
//! - **Document model**: [`Value`] is null, boolean, 32/64-bit integers and floats, UTF-8
//!   strings, opaque [`ByteString`]s, ordered [`DocMap`]s and [`DocList`]s. Nothing else can
//!   be represented.
//! - **[`ChunkedBuffer`]**: a list of fixed-size blocks with a cursor, little or big endian,
//!   with varints, C strings and in-place backpatching through [`Position`]s.
//! - **[`DocCodec`]**: a self-describing format. Every value is tagged and every map or list
//!   carries its byte length.
//! - **[`CompactCodec`]**: a denser format that interns map keys, so a key repeated across
//!   thousands of records is spelled out once.
//!
//! Both codecs implement [`DataCodec`] and can be used interchangeably, including as
//! `Box<dyn DataCodec>`.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! datacodec = "0.1"
//! ```
//!
//! ### Round trip a document
//!
//! ```rust
//! use datacodec::{doc, from_doc_bytes, to_doc_bytes};
//!
//! let value = doc!({
//!     "name": "Alice",
//!     "age": 30,
//!     "tags": ["admin", "user"]
//! });
//! let map = value.as_map().unwrap();
//!
//! let bytes = to_doc_bytes(map).unwrap();
//! assert_eq!(&from_doc_bytes(&bytes).unwrap(), map);
//! ```
//!
//! ### Interning repeated keys
//!
//! ```rust
//! use datacodec::{doc, CompactCodec, DataCodec, DocCodec};
//!
//! let records: Vec<_> = (0..100).map(|i| doc!({"identifier": i, "description": "x"})).collect();
//!
//! let doc_len = DocCodec::new().serialize_list(&records).unwrap().len();
//! let compact_len = CompactCodec::new().serialize_list(&records).unwrap().len();
//! assert!(compact_len < doc_len);
//! ```
//!
//! ### Streaming
//!
//! ```rust
//! use datacodec::{doc, CompactCodec, DataCodec};
//!
//! let map = doc!({"k": [1, 2, 3]}).as_map().cloned().unwrap();
//! let codec = CompactCodec::new();
//!
//! let mut out = Vec::new();
//! codec.write_map(&map, &mut out).unwrap();
//! let back = codec.read_map(&mut out.as_slice()).unwrap();
//! assert_eq!(back, map);
//! ```
//!
//! ## Errors
//!
//! Malformed input is always reported as [`Error::Decoding`], and documents that cannot be
//! written (nesting deeper than [`MAX_DEPTH`], keys containing NUL, lengths beyond 32 bits)
//! as [`Error::Encoding`]. A failed decode never yields a partial document.
//!
//! ## Logging
//!
//! The codecs report sizes and failures through the [`log`] facade at `debug` level, and
//! block and key-table growth at `trace` level. No logger is installed by this crate.
//!
//! ## Safety Guarantees
//!
//! - No `unsafe` code blocks
//! - Declared lengths and counts are checked against the remaining input before allocating
//! - No panics in public API (except for logic errors that indicate bugs)
//!
//! ## Examples
//!
//! See the `demos/` directory:
//!
//! - **`simple.rs`** - Encoding and decoding a document with both codecs
//! - **`compact_keys.rs`** - How key interning shrinks repetitive data
//! - **`streaming.rs`** - Writers, readers and chunked buffers
//!
//! Run any demo with: `cargo run --example <name>`

pub mod buffer;
pub mod bytes;
pub mod codec;
pub mod compact;
pub mod doc;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod value;
pub mod visit;
pub mod wire;

pub use buffer::{ChunkedBuffer, Endian, MalformedPolicy, Position};
pub use bytes::ByteString;
pub use codec::{BufferOptions, DataCodec};
pub use compact::CompactCodec;
pub use doc::DocCodec;
pub use error::{Error, Result};
pub use map::DocMap;
pub use options::{CompactOptions, DocOptions};
pub use value::{DocList, Value};
pub use visit::{KeyOrder, Visitor, MAX_DEPTH};

/// Encodes a map in the document format with default options.
///
/// # Examples
///
/// ```rust
/// use datacodec::{to_doc_bytes, DocMap};
///
/// assert_eq!(to_doc_bytes(&DocMap::new()).unwrap(), vec![5, 0, 0, 0, 0]);
/// ```
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the map cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_doc_bytes(map: &DocMap) -> Result<Vec<u8>> {
    DocCodec::new().serialize_map(map)
}

/// Decodes a map in the document format with default options.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if `bytes` is not exactly one well-formed map.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_doc_bytes(bytes: &[u8]) -> Result<DocMap> {
    DocCodec::new().deserialize_map(bytes)
}

/// Encodes a map in the compact format with default options.
///
/// # Examples
///
/// ```rust
/// use datacodec::{doc, to_compact_bytes};
///
/// let map = doc!({"a": null}).as_map().cloned().unwrap();
/// let bytes = to_compact_bytes(&map).unwrap();
/// assert!(bytes.starts_with(b"#!PSON1\n"));
/// ```
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the map cannot be represented.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_compact_bytes(map: &DocMap) -> Result<Vec<u8>> {
    CompactCodec::new().serialize_map(map)
}

/// Decodes a map in the compact format with default options.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if `bytes` is not exactly one well-formed map.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_compact_bytes(bytes: &[u8]) -> Result<DocMap> {
    CompactCodec::new().deserialize_map(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn sample() -> DocMap {
        match doc!({
            "id": 123,
            "name": "Alice",
            "active": true,
            "tags": ["admin", "user"],
            "profile": {"score": 9.5, "avatar": null}
        }) {
            Value::Map(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_doc_round_trip() {
        let map = sample();
        let bytes = to_doc_bytes(&map).unwrap();
        assert_eq!(from_doc_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn test_compact_round_trip() {
        let map = sample();
        let bytes = to_compact_bytes(&map).unwrap();
        assert_eq!(from_compact_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn test_formats_are_not_interchangeable() {
        let map = sample();
        assert!(from_compact_bytes(&to_doc_bytes(&map).unwrap()).is_err());
        assert!(from_doc_bytes(&to_compact_bytes(&map).unwrap()).is_err());
    }

    #[test]
    fn test_trait_objects() {
        let map = sample();
        let codecs: Vec<Box<dyn DataCodec>> = vec![
            Box::new(DocCodec::new().with_sorted_keys(true)),
            Box::new(CompactCodec::with_options(
                CompactOptions::new().with_collection_count(true),
            )),
        ];
        for codec in &codecs {
            let mut out = Vec::new();
            codec.write_map(&map, &mut out).unwrap();
            assert_eq!(codec.read_map(&mut out.as_slice()).unwrap(), map);
        }
    }
}
