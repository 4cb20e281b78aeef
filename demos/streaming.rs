//! Writers, readers and chunked buffers.
//!
//! Run with: cargo run --example streaming

use datacodec::{
    doc, ChunkedBuffer, CompactCodec, CompactOptions, DataCodec, DocCodec, DocOptions, Endian,
};
use std::error::Error;
use std::io::Cursor;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let map = doc!({
        "event": "login",
        "user": {"id": 7, "roles": ["admin"]},
        "payload": [1, 2, 3]
    })
    .as_map()
    .cloned()
    .ok_or("not a map")?;

    // Small blocks force the encoder to spread its output over several blocks.
    let codec = DocCodec::with_options(DocOptions::new().with_buffer_size(16));
    let mut buffer = ChunkedBuffer::with_block_size(Endian::Little, 16)?;
    codec.encode_map(&map, &mut buffer)?;
    println!("{:?}", buffer);

    buffer.rewind();
    let back = codec.decode_map(&mut buffer)?;
    assert_eq!(back, map);

    // Any io::Write and io::Read work as a sink and a source.
    let codec = CompactCodec::with_options(CompactOptions::new().with_chunked_input(true));
    let mut sink = Vec::new();
    codec.write_map(&map, &mut sink)?;
    println!("Wrote {} bytes", sink.len());

    let back = codec.read_map(&mut Cursor::new(sink))?;
    assert_eq!(back, map);
    println!("✓ Stream round-trip successful");

    Ok(())
}
