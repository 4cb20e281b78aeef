//! How key interning shrinks repetitive data.
//!
//! Run with: cargo run --example compact_keys

use datacodec::{doc, CompactCodec, CompactOptions, DataCodec, DocCodec, DocList};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let records: DocList = (0..1000)
        .map(|i| {
            doc!({
                "customer_identifier": i,
                "customer_display_name": (format!("Customer {}", i)),
                "subscription_active": (i % 3 == 0),
                "preferred_language": "en"
            })
        })
        .collect();

    let doc_len = DocCodec::new().serialize_list(&records)?.len();
    println!("Document format:           {:>7} bytes", doc_len);

    let variants = [
        ("compact (defaults)", CompactOptions::new()),
        (
            "compact (short strings)",
            CompactOptions::new().with_short_string_length(true),
        ),
        (
            "compact (terminated)",
            CompactOptions::new().with_string_length(false),
        ),
        (
            "compact (with counts)",
            CompactOptions::new().with_collection_count(true),
        ),
    ];

    for (label, options) in variants {
        let codec = CompactCodec::with_options(options);
        let bytes = codec.serialize_list(&records)?;
        let saved = 100.0 * (1.0 - bytes.len() as f64 / doc_len as f64);
        println!("{:<27}{:>7} bytes ({:.1}% smaller)", format!("{}:", label), bytes.len(), saved);
        assert_eq!(codec.deserialize_list(&bytes)?, records);
    }

    Ok(())
}
