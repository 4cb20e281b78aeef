//! Encoding and decoding a document with both codecs.
//!
//! Run with: cargo run --example simple

use datacodec::{doc, CompactCodec, DataCodec, DocCodec, Value};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let value = doc!({
        "id": 42,
        "name": "Alice Johnson",
        "email": "alice@example.com",
        "scores": [9.5, 7.25],
        "manager": null
    });
    let map = value.as_map().ok_or("not a map")?;
    println!("Document: {}\n", value);

    let doc_bytes = DocCodec::new().serialize_map(map)?;
    println!("Document format ({} bytes): {:02x?}\n", doc_bytes.len(), doc_bytes);

    let compact_bytes = CompactCodec::new().serialize_map(map)?;
    println!(
        "Compact format ({} bytes): {:02x?}\n",
        compact_bytes.len(),
        compact_bytes
    );

    let back = DocCodec::new().deserialize_map(&doc_bytes)?;
    assert_eq!(&back, map);
    let back = CompactCodec::new().deserialize_map(&compact_bytes)?;
    assert_eq!(&back, map);
    println!("✓ Round-trip successful");

    // Kinds survive exactly, including the integer width.
    let big = Value::from(1i64 << 40);
    println!("{} is stored as {}", big, big.type_name());

    Ok(())
}
