use datacodec::{
    doc, ByteString, CompactCodec, CompactOptions, DataCodec, DocCodec, DocList, DocMap,
    DocOptions, Error, Value,
};
use std::io;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn map_of(value: Value) -> DocMap {
    match value {
        Value::Map(map) => map,
        other => panic!("Expected map, got {:?}", other),
    }
}

fn user(id: i32, name: &str) -> Value {
    doc!({
        "id": id,
        "name": name,
        "active": (id % 2 == 0),
        "tags": ["admin", "developer"],
        "address": {"city": "Paris", "zip": null}
    })
}

fn order() -> DocMap {
    let mut items = DocList::new();
    for i in 0..20i32 {
        items.push(doc!({
            "sku": (format!("WIDGET-{:03}", i)),
            "price": (9.99 + f64::from(i)),
            "quantity": i,
            "serial": (Value::Int64(1_000_000_000_000 + i64::from(i))),
            "thumbnail": (ByteString::from(vec![i as u8; 16]))
        }));
    }

    let mut map = DocMap::new();
    map.insert("order_id", Value::from(12345));
    map.insert("customer", user(7, "Alice"));
    map.insert("items", Value::List(items));
    map.insert("notes", Value::from(""));
    map.insert("empty_map", Value::Map(DocMap::new()));
    map.insert("empty_list", Value::List(vec![]));
    map
}

/// Every option combination of both codecs.
fn all_codecs() -> Vec<Box<dyn DataCodec>> {
    let mut codecs: Vec<Box<dyn DataCodec>> = Vec::new();
    for chunked in [false, true] {
        for sorted in [false, true] {
            codecs.push(Box::new(
                DocCodec::with_options(
                    DocOptions::new()
                        .with_buffer_size(32)
                        .with_chunked_input(chunked),
                )
                .with_sorted_keys(sorted),
            ));
        }
    }
    for string_length in [false, true] {
        for count in [false, true] {
            for short in [false, true] {
                for chunked in [false, true] {
                    let options = CompactOptions::new()
                        .with_string_length(string_length)
                        .with_collection_count(count)
                        .with_short_string_length(short)
                        .with_buffer_size(16)
                        .with_chunked_input(chunked);
                    codecs.push(Box::new(CompactCodec::with_options(options)));
                }
            }
        }
    }
    codecs
}

#[test]
fn test_round_trip_all_configurations() {
    init_logging();
    let map = order();
    let list = vec![user(1, "a"), Value::Null, Value::from("x"), user(2, "b")];

    for codec in all_codecs() {
        let bytes = codec.serialize_map(&map).unwrap();
        assert_eq!(codec.deserialize_map(&bytes).unwrap(), map);

        let bytes = codec.serialize_list(&list).unwrap();
        assert_eq!(codec.deserialize_list(&bytes).unwrap(), list);
    }
}

#[test]
fn test_streaming_all_configurations() {
    init_logging();
    let map = order();

    for codec in all_codecs() {
        let mut out = Vec::new();
        codec.write_map(&map, &mut out).unwrap();
        assert_eq!(out, codec.serialize_map(&map).unwrap());

        let back = codec.read_map(&mut io::Cursor::new(&out)).unwrap();
        assert_eq!(back, map);
    }
}

#[test]
fn test_doc_scenario() {
    let map = map_of(doc!({"a": 1, "b": [true, null]}));
    let bytes = DocCodec::new().serialize_map(&map).unwrap();
    assert_eq!(bytes.len(), 23);
    assert_eq!(&bytes[..4], &[23, 0, 0, 0]);

    let back = DocCodec::new().deserialize_map(&bytes).unwrap();
    assert_eq!(back.get("a"), Some(&Value::Int32(1)));
    assert_eq!(
        back.get("b"),
        Some(&Value::List(vec![Value::Bool(true), Value::Null]))
    );
}

#[test]
fn test_compact_is_smaller_for_repeated_keys() {
    let records: DocList = (0..200).map(|i| user(i, "someone")).collect();
    let doc_len = DocCodec::new().serialize_list(&records).unwrap().len();
    let compact_len = CompactCodec::new().serialize_list(&records).unwrap().len();
    assert!(
        compact_len * 10 < doc_len * 9,
        "compact {} vs doc {}",
        compact_len,
        doc_len
    );
}

#[test]
fn test_insertion_order_survives_round_trip() {
    let map = map_of(doc!({"zeta": 1, "alpha": 2, "mid": 3}));
    for codec in all_codecs() {
        let bytes = codec.serialize_map(&map).unwrap();
        let back = codec.deserialize_map(&bytes).unwrap();
        assert_eq!(back, map);
    }

    let back = DocCodec::new()
        .deserialize_map(&DocCodec::new().serialize_map(&map).unwrap())
        .unwrap();
    assert_eq!(back.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);

    let sorted = DocCodec::new().with_sorted_keys(true);
    let back = sorted
        .deserialize_map(&sorted.serialize_map(&map).unwrap())
        .unwrap();
    assert_eq!(back.keys().collect::<Vec<_>>(), vec!["alpha", "mid", "zeta"]);
}

#[test]
fn test_duplicate_keys_last_write_wins() {
    // Two entries for "k" in one document body.
    let bytes = [
        &[19u8, 0, 0, 0][..],
        &[b'k', 0, 0x10, 1, 0, 0, 0],
        &[b'k', 0, 0x10, 2, 0, 0, 0],
        &[0],
    ]
    .concat();
    let map = DocCodec::new().deserialize_map(&bytes).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(map.get("k"), Some(&Value::Int32(2)));
}

#[test]
fn test_trailing_bytes_rejected() {
    let map = map_of(doc!({"a": 1}));
    for codec in all_codecs() {
        let mut bytes = codec.serialize_map(&map).unwrap();
        bytes.push(0);
        assert!(matches!(
            codec.deserialize_map(&bytes),
            Err(Error::Decoding(_))
        ));
    }
}

#[test]
fn test_truncation_always_decoding_error() {
    let map = order();
    for codec in all_codecs() {
        let bytes = codec.serialize_map(&map).unwrap();
        for cut in (0..bytes.len()).step_by(7) {
            match codec.deserialize_map(&bytes[..cut]) {
                Err(Error::Decoding(_)) => {}
                other => panic!("cut at {} of {}: {:?}", cut, bytes.len(), other),
            }
        }
    }
}

#[test]
fn test_invalid_buffer_size() {
    let map = map_of(doc!({"a": 1}));
    let codec = DocCodec::with_options(DocOptions::new().with_buffer_size(8));
    assert!(matches!(
        codec.serialize_map(&map),
        Err(Error::IllegalArgument(_))
    ));

    let codec = CompactCodec::with_options(CompactOptions::new().with_buffer_size(8));
    assert!(matches!(
        codec.deserialize_map(b"#!PSON1\n\x20"),
        Err(Error::IllegalArgument(_))
    ));
}

struct FailingReader;

impl io::Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "connection reset"))
    }
}

struct FailingWriter;

impl io::Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_stream_errors_are_io() {
    let map = map_of(doc!({"a": 1}));
    for codec in all_codecs() {
        match codec.read_map(&mut FailingReader) {
            Err(Error::Io(msg)) => assert!(msg.contains("connection reset")),
            other => panic!("Expected I/O error, got {:?}", other),
        }
        assert!(matches!(
            codec.write_map(&map, &mut FailingWriter),
            Err(Error::Io(_))
        ));
    }
}

#[test]
fn test_key_with_nul_is_encoding_error() {
    let mut map = DocMap::new();
    map.insert("a\0b", Value::Null);
    for codec in all_codecs() {
        assert!(matches!(
            codec.serialize_map(&map),
            Err(Error::Encoding(_))
        ));
    }
}

#[test]
fn test_serde_json_interop() {
    let map = order();
    let json = serde_json::to_string(&Value::Map(map.clone())).unwrap();
    let back: Value = serde_json::from_str(&json).unwrap();
    let back = map_of(back);

    assert_eq!(back.get("order_id"), map.get("order_id"));
    assert_eq!(back.get("customer"), map.get("customer"));

    // JSON has no byte strings, so binary values come back as lists of numbers.
    let items = back.get("items").and_then(Value::as_list).unwrap();
    let first = items[0].as_map().unwrap();
    assert!(first.get("thumbnail").map_or(false, Value::is_list));
    assert_eq!(first.get("serial"), Some(&Value::Int64(1_000_000_000_000)));
}

#[test]
fn test_json_document_through_codecs() {
    let json = r#"{"name": "widget", "dims": [1.5, 2, 3], "meta": {"big": 9007199254740993}}"#;
    let map: DocMap = serde_json::from_str(json).unwrap();
    assert_eq!(
        map.get("meta").and_then(Value::as_map).and_then(|m| m.get("big")),
        Some(&Value::Int64(9_007_199_254_740_993))
    );

    for codec in all_codecs() {
        let bytes = codec.serialize_map(&map).unwrap();
        assert_eq!(codec.deserialize_map(&bytes).unwrap(), map);
    }
}
