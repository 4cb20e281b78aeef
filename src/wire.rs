//! Wire formats
//!
//! This module documents the two binary formats implemented by this library and defines
//! their tag bytes. All multi-byte integers and floats are little-endian.
//!
//! # Document format
//!
//! Self-describing: every value carries a one-byte tag, and every map or list body carries
//! its own byte length, so a reader can skip a composite without parsing it. No state is
//! shared between values.
//!
//! ```text
//! value  := tag payload
//! MAP    := length:i32 (utf8_cstring value)* END
//! LIST   := length:i32 (value)* END
//! STRING := length:i32 utf8_bytes[length-1] 0x00
//! BINARY := length:i32 subtype:u8 raw_bytes[length]
//! ```
//!
//! | Tag | Byte | Payload |
//! |-----|------|---------|
//! | `END` | `0x00` | none, closes a body |
//! | `DOUBLE` | `0x01` | `f64` (32-bit floats are widened) |
//! | `STRING` | `0x02` | `i32` length (bytes + 1), bytes, `0x00` |
//! | `MAP` | `0x03` | body |
//! | `LIST` | `0x04` | body |
//! | `BINARY` | `0x05` | `i32` length, subtype `0x00`, bytes |
//! | `BOOL` | `0x08` | one byte, non-zero is true |
//! | `NULL` | `0x0A` | none |
//! | `INT32` | `0x10` | `i32` |
//! | `INT64` | `0x12` | `i64` |
//! | `MAP_EMPTY` | `0x13` | none |
//! | `LIST_EMPTY` | `0x14` | none |
//!
//! A body's length counts every byte of the body: the four length bytes, the entries and
//! the terminating `END`. The smallest body is therefore `05 00 00 00 00`.
//!
//! The top-level map or list is written as a bare body with no tag in front. Nested empty
//! composites are written as a single `MAP_EMPTY` or `LIST_EMPTY` tag.
//!
//! ## Example
//!
//! `{"a": 1, "b": [true, null]}` encodes as:
//!
//! ```text
//! 17 00 00 00                 body length 23
//! 61 00  10  01 00 00 00      "a" INT32 1
//! 62 00  04                   "b" LIST
//!        08 00 00 00          list body length 8
//!        08 01                BOOL true
//!        0a                   NULL
//!        00                   END of list
//! 00                          END of map
//! ```
//!
//! # Compact format
//!
//! An 8-byte header `#!PSON1\n` followed by one tagged value. Map keys are interned: the
//! first time a key appears it is written in full together with a fresh index, and every
//! later occurrence is written as that index alone.
//!
//! | Tag | Byte | Payload |
//! |-----|------|---------|
//! | `NULL` | `0` | none |
//! | `BOOL` | `1` | one byte |
//! | `INT32` | `2` | `i32` |
//! | `INT64` | `3` | `i64` |
//! | `FLOAT32` | `4` | `f32` |
//! | `FLOAT64` | `5` | `f64` |
//! | `BINARY` | `6` | `i32` length, bytes |
//! | `STRING_EMPTY` | `8` | none |
//! | `STRING` | `9` | bytes, `0x00` |
//! | `STRING_LEN4` | `10` | `i32` length (bytes + 1), bytes, `0x00` |
//! | `STRING_LEN2` | `11` | `i16` length (bytes + 1), bytes, `0x00` |
//! | `LIST_EMPTY` | `16` | none |
//! | `LIST` | `17` | values, `LIST_END` |
//! | `LIST_WITH_COUNT` | `18` | varint count, values, `LIST_END` |
//! | `MAP_EMPTY` | `32` | none |
//! | `MAP` | `33` | entries, varint `0` |
//! | `MAP_WITH_COUNT` | `34` | varint count, entries, varint `0` |
//! | `LIST_END` | `0xFF` | none |
//!
//! ## Map entries
//!
//! Each entry starts with a zigzag varint key index:
//!
//! - `-n` introduces key number `n`; the key follows as a NUL-terminated string. Numbers are
//!   handed out from 1 in the order keys are first met, so `n` must be exactly one more than
//!   the previous new key.
//! - `+n` repeats key number `n`.
//! - `0` ends the map.
//!
//! The value follows the key. Keys may not contain `0x00`.
//!
//! ## Varints
//!
//! Seven bits per byte, least significant group first, high bit **set on the last byte**.
//! Signed values are zigzag mapped first, so `0` is `80`, `-1` is `81` and `1` is `82`.

/// Tag bytes of the document format.
pub mod doc {
    pub const END: u8 = 0x00;
    pub const DOUBLE: u8 = 0x01;
    pub const STRING: u8 = 0x02;
    pub const MAP: u8 = 0x03;
    pub const LIST: u8 = 0x04;
    pub const BINARY: u8 = 0x05;
    pub const BOOL: u8 = 0x08;
    pub const NULL: u8 = 0x0A;
    pub const INT32: u8 = 0x10;
    pub const INT64: u8 = 0x12;
    pub const MAP_EMPTY: u8 = 0x13;
    pub const LIST_EMPTY: u8 = 0x14;

    /// Subtype byte written before binary payloads.
    pub const BINARY_SUBTYPE: u8 = 0x00;

    /// Length of an empty body: the length field plus `END`.
    pub const EMPTY_BODY_LEN: i32 = 5;
}

/// Tag bytes of the compact format.
pub mod compact {
    pub const HEADER: [u8; 8] = *b"#!PSON1\n";

    pub const NULL: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INT32: u8 = 2;
    pub const INT64: u8 = 3;
    pub const FLOAT32: u8 = 4;
    pub const FLOAT64: u8 = 5;
    pub const BINARY: u8 = 6;
    pub const STRING_EMPTY: u8 = 8;
    pub const STRING: u8 = 9;
    pub const STRING_LEN4: u8 = 10;
    pub const STRING_LEN2: u8 = 11;
    pub const LIST_EMPTY: u8 = 16;
    pub const LIST: u8 = 17;
    pub const LIST_WITH_COUNT: u8 = 18;
    pub const MAP_EMPTY: u8 = 32;
    pub const MAP: u8 = 33;
    pub const MAP_WITH_COUNT: u8 = 34;
    pub const LIST_END: u8 = 0xFF;

    /// Key index that closes a map.
    pub const END_OF_MAP: i32 = 0;

    /// Initial number of slots in a decoder's key table.
    pub const INITIAL_KEY_SLOTS: usize = 100;
}
