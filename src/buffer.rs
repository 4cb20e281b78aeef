//! Growable chunked byte buffer.
//!
//! A [`ChunkedBuffer`] is an ordered list of fixed-capacity blocks with a single cursor. It is
//! the write sink of both encoders and the read source of both decoders.
//!
//! ## Writing
//!
//! Writes append at the cursor. When the current block cannot hold a primitive, a new block
//! of `max(block_size, len)` bytes is appended, so a primitive written at the end of the
//! data never straddles two blocks. Writes never fail for lack of capacity.
//!
//! A [`Position`] captured with [`ChunkedBuffer::position`] can be restored later to
//! overwrite bytes in place, which is how length prefixes are backpatched:
//!
//! ```rust
//! use datacodec::{ChunkedBuffer, Endian};
//!
//! let mut buffer = ChunkedBuffer::with_order(Endian::Little);
//! let start = buffer.position();
//! buffer.put_i32(0); // placeholder
//! buffer.put_slice(b"payload");
//! let end = buffer.position();
//!
//! let length = buffer.offset(start, end).unwrap();
//! buffer.set_position(start).unwrap();
//! buffer.put_i32(length as i32);
//! buffer.set_position(end).unwrap();
//!
//! assert_eq!(&buffer.to_bytes()[..4], &[11, 0, 0, 0]);
//! ```
//!
//! ## Reading
//!
//! Reads consume from the cursor and cross block boundaries transparently. Reading past the
//! end fails with [`Error::BufferUnderflow`](crate::Error::BufferUnderflow).
//!
//! ## Varints
//!
//! [`put_var_u32`](ChunkedBuffer::put_var_u32) stores seven bits per byte, least significant
//! group first. The high bit is set on the **last** byte of the encoding and clear on every
//! byte before it. This is the reverse of the protobuf convention.

use crate::{ByteString, Error, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

/// Block size used when none is configured.
pub const DEFAULT_BLOCK_SIZE: usize = 8192;

/// Smallest block size a buffer accepts.
pub const MIN_BLOCK_SIZE: usize = 16;

/// Longest accepted varint encoding of a 32-bit value.
const MAX_VARINT_LEN: usize = 5;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Byte order for multi-byte primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
}

impl Endian {
    /// The byte order of the target platform.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }
}

impl Default for Endian {
    fn default() -> Self {
        Endian::native()
    }
}

/// What to do with malformed UTF-8 when decoding strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Substitute U+FFFD for each malformed sequence.
    #[default]
    Replace,
    /// Fail with a decoding error.
    Reject,
}

/// A cursor location inside one particular [`ChunkedBuffer`].
///
/// Positions remember the buffer that produced them. Handing one to another buffer fails
/// with [`Error::IllegalArgument`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    buffer: u64,
    block: usize,
    offset: usize,
}

struct Block<'a> {
    data: Cow<'a, [u8]>,
    filled: usize,
}

impl Block<'static> {
    fn owned(capacity: usize) -> Self {
        Block {
            data: Cow::Owned(vec![0; capacity]),
            filled: 0,
        }
    }
}

impl<'a> Block<'a> {
    #[inline]
    fn capacity(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn written(&self) -> &[u8] {
        &self.data[..self.filled]
    }
}

/// An ordered sequence of byte blocks with a read/write cursor.
///
/// The lifetime is that of wrapped caller bytes. Buffers that own all their blocks are
/// `ChunkedBuffer<'static>`. Wrapped bytes are copied only if they are written to.
pub struct ChunkedBuffer<'a> {
    id: u64,
    order: Endian,
    block_size: usize,
    policy: MalformedPolicy,
    blocks: Vec<Block<'a>>,
    current: usize,
    pos: usize,
}

impl ChunkedBuffer<'static> {
    /// Creates an empty buffer with native byte order and the default block size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_order(Endian::native())
    }

    /// Creates an empty buffer with the given byte order and the default block size.
    #[must_use]
    pub fn with_order(order: Endian) -> Self {
        Self::build(order, DEFAULT_BLOCK_SIZE, vec![Block::owned(DEFAULT_BLOCK_SIZE)])
    }

    /// Creates an empty buffer whose blocks hold `block_size` bytes.
    ///
    /// Fails with [`Error::IllegalArgument`] when `block_size` is below [`MIN_BLOCK_SIZE`].
    pub fn with_block_size(order: Endian, block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        Ok(Self::build(order, block_size, vec![Block::owned(block_size)]))
    }

    /// Takes ownership of `bytes` as a single readable block.
    #[must_use]
    pub fn from_vec(order: Endian, bytes: Vec<u8>) -> Self {
        let filled = bytes.len();
        let block = Block {
            data: Cow::Owned(bytes),
            filled,
        };
        Self::build(order, DEFAULT_BLOCK_SIZE, vec![block])
    }

    /// Copies `bytes` into blocks of `block_size` bytes each and rewinds.
    ///
    /// ```rust
    /// use datacodec::{ChunkedBuffer, Endian};
    ///
    /// let bytes = [1, 0, 0, 0, 2, 0, 0, 0];
    /// let mut buffer = ChunkedBuffer::chunked(Endian::Little, &bytes, 16).unwrap();
    /// assert_eq!(buffer.get_i32().unwrap(), 1);
    /// assert_eq!(buffer.get_i32().unwrap(), 2);
    /// ```
    pub fn chunked(order: Endian, bytes: &[u8], block_size: usize) -> Result<Self> {
        check_block_size(block_size)?;
        let mut blocks: Vec<Block<'static>> = bytes
            .chunks(block_size)
            .map(|chunk| Block {
                data: Cow::Owned(chunk.to_vec()),
                filled: chunk.len(),
            })
            .collect();
        if blocks.is_empty() {
            blocks.push(Block::owned(block_size));
        }
        Ok(Self::build(order, block_size, blocks))
    }
}

impl<'a> ChunkedBuffer<'a> {
    /// Borrows `bytes` as a single readable block without copying.
    ///
    /// ```rust
    /// use datacodec::{ChunkedBuffer, Endian};
    ///
    /// let mut buffer = ChunkedBuffer::wrap(Endian::Big, &[0x00, 0x2a]);
    /// assert_eq!(buffer.get_i16().unwrap(), 42);
    /// ```
    #[must_use]
    pub fn wrap(order: Endian, bytes: &'a [u8]) -> Self {
        let block = Block {
            data: Cow::Borrowed(bytes),
            filled: bytes.len(),
        };
        Self::build(order, DEFAULT_BLOCK_SIZE, vec![block])
    }

    fn build(order: Endian, block_size: usize, blocks: Vec<Block<'a>>) -> Self {
        ChunkedBuffer {
            id: NEXT_BUFFER_ID.fetch_add(1, AtomicOrdering::Relaxed),
            order,
            block_size,
            policy: MalformedPolicy::default(),
            blocks,
            current: 0,
            pos: 0,
        }
    }

    /// Sets how malformed UTF-8 is handled by the string getters.
    #[must_use]
    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn order(&self) -> Endian {
        self.order
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn malformed_policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Number of blocks currently allocated.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Total number of bytes written across all blocks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.iter().map(|b| b.filled).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes readable from the cursor to the end of the data.
    #[must_use]
    pub fn remaining(&self) -> usize {
        let here = self.blocks[self.current].filled.saturating_sub(self.pos);
        here + self.blocks[self.current + 1..]
            .iter()
            .map(|b| b.filled)
            .sum::<usize>()
    }

    /// Moves the cursor back to the first byte.
    pub fn rewind(&mut self) {
        self.current = 0;
        self.pos = 0;
    }

    // ---- cursor management ----

    /// Captures the cursor.
    #[must_use]
    pub fn position(&self) -> Position {
        let (block, offset) = self.normalize(self.current, self.pos);
        Position {
            buffer: self.id,
            block,
            offset,
        }
    }

    /// Restores a cursor captured from this buffer.
    ///
    /// A position at the end of a block's data that has a following block resolves to the
    /// start of that following block.
    pub fn set_position(&mut self, position: Position) -> Result<()> {
        self.validate(&position)?;
        let (block, offset) = self.normalize(position.block, position.offset);
        self.current = block;
        self.pos = offset;
        Ok(())
    }

    /// Orders two positions of this buffer.
    ///
    /// ```rust
    /// use datacodec::{ChunkedBuffer, Endian};
    /// use std::cmp::Ordering;
    ///
    /// let mut buffer = ChunkedBuffer::new();
    /// let a = buffer.position();
    /// buffer.put_u8(1);
    /// let b = buffer.position();
    /// assert_eq!(buffer.compare(a, b).unwrap(), Ordering::Less);
    /// ```
    pub fn compare(&self, a: Position, b: Position) -> Result<Ordering> {
        self.validate(&a)?;
        self.validate(&b)?;
        let a = self.normalize(a.block, a.offset);
        let b = self.normalize(b.block, b.offset);
        Ok(a.cmp(&b))
    }

    /// Number of bytes between `start` and `end`.
    ///
    /// Fails with [`Error::IllegalArgument`] for foreign positions or when `start` comes
    /// after `end`.
    pub fn offset(&self, start: Position, end: Position) -> Result<usize> {
        if self.compare(start, end)? == Ordering::Greater {
            return Err(Error::illegal_argument(format!(
                "Start position {:?} is after end position {:?}",
                start, end
            )));
        }
        let (start_block, start_offset) = self.normalize(start.block, start.offset);
        let (end_block, end_offset) = self.normalize(end.block, end.offset);

        if start_block == end_block {
            return Ok(end_offset - start_offset);
        }
        let middle: usize = self.blocks[start_block + 1..end_block]
            .iter()
            .map(|b| b.filled)
            .sum();
        Ok(self.blocks[start_block].filled - start_offset + middle + end_offset)
    }

    fn validate(&self, position: &Position) -> Result<()> {
        if position.buffer != self.id {
            return Err(Error::illegal_argument(
                "Position does not apply to this buffer",
            ));
        }
        match self.blocks.get(position.block) {
            Some(block) if position.offset <= block.filled => Ok(()),
            _ => Err(Error::illegal_argument(format!(
                "Position {:?} lies outside the written data",
                position
            ))),
        }
    }

    fn normalize(&self, mut block: usize, mut offset: usize) -> (usize, usize) {
        while block + 1 < self.blocks.len() && offset >= self.blocks[block].filled {
            block += 1;
            offset = 0;
        }
        (block, offset)
    }

    #[inline]
    fn is_last_block(&self) -> bool {
        self.current + 1 == self.blocks.len()
    }

    #[inline]
    fn at_append_point(&self) -> bool {
        self.is_last_block() && self.pos == self.blocks[self.current].filled
    }

    /// Writable bytes in the current block. Only the last block may grow into its spare
    /// capacity; earlier blocks can only be overwritten.
    fn write_room(&self) -> usize {
        let block = &self.blocks[self.current];
        let limit = if self.is_last_block() {
            block.capacity()
        } else {
            block.filled
        };
        limit.saturating_sub(self.pos)
    }

    fn read_room(&self) -> usize {
        self.blocks[self.current].filled.saturating_sub(self.pos)
    }

    fn next_block(&mut self) {
        self.current += 1;
        self.pos = 0;
    }

    fn grow(&mut self, min: usize) {
        let size = self.block_size.max(min);
        log::trace!(
            "buffer {}: allocating block {} of {} bytes",
            self.id,
            self.blocks.len(),
            size
        );
        self.blocks.push(Block::owned(size));
        self.current = self.blocks.len() - 1;
        self.pos = 0;
    }

    // ---- writing ----

    /// Writes bytes at the cursor, overwriting existing data or appending past its end.
    pub fn put_slice(&mut self, mut src: &[u8]) {
        while !src.is_empty() {
            let room = self.write_room();
            if room == 0 {
                if self.is_last_block() {
                    self.grow(src.len());
                } else {
                    self.next_block();
                }
                continue;
            }
            let n = room.min(src.len());
            let pos = self.pos;
            let block = &mut self.blocks[self.current];
            block.data.to_mut()[pos..pos + n].copy_from_slice(&src[..n]);
            block.filled = block.filled.max(pos + n);
            self.pos += n;
            src = &src[n..];
        }
    }

    /// Writes a primitive so that it lands in a single block when appended.
    fn put_primitive(&mut self, bytes: &[u8]) {
        if self.at_append_point() && self.write_room() < bytes.len() {
            self.grow(bytes.len());
        }
        self.put_slice(bytes);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.put_primitive(&[value]);
    }

    pub fn put_i16(&mut self, value: i16) {
        let mut bytes = [0u8; 2];
        match self.order {
            Endian::Big => BigEndian::write_i16(&mut bytes, value),
            Endian::Little => LittleEndian::write_i16(&mut bytes, value),
        }
        self.put_primitive(&bytes);
    }

    pub fn put_i32(&mut self, value: i32) {
        let mut bytes = [0u8; 4];
        match self.order {
            Endian::Big => BigEndian::write_i32(&mut bytes, value),
            Endian::Little => LittleEndian::write_i32(&mut bytes, value),
        }
        self.put_primitive(&bytes);
    }

    pub fn put_i64(&mut self, value: i64) {
        let mut bytes = [0u8; 8];
        match self.order {
            Endian::Big => BigEndian::write_i64(&mut bytes, value),
            Endian::Little => LittleEndian::write_i64(&mut bytes, value),
        }
        self.put_primitive(&bytes);
    }

    pub fn put_f32(&mut self, value: f32) {
        let mut bytes = [0u8; 4];
        match self.order {
            Endian::Big => BigEndian::write_f32(&mut bytes, value),
            Endian::Little => LittleEndian::write_f32(&mut bytes, value),
        }
        self.put_primitive(&bytes);
    }

    pub fn put_f64(&mut self, value: f64) {
        let mut bytes = [0u8; 8];
        match self.order {
            Endian::Big => BigEndian::write_f64(&mut bytes, value),
            Endian::Little => LittleEndian::write_f64(&mut bytes, value),
        }
        self.put_primitive(&bytes);
    }

    pub fn put_byte_string(&mut self, value: &ByteString) {
        self.put_slice(value.as_slice());
    }

    /// Writes an unsigned varint. See the [module docs](self) for the byte layout.
    ///
    /// ```rust
    /// use datacodec::ChunkedBuffer;
    ///
    /// let mut buffer = ChunkedBuffer::new();
    /// buffer.put_var_u32(300);
    /// assert_eq!(buffer.to_bytes(), vec![0x2c, 0x82]);
    /// ```
    pub fn put_var_u32(&mut self, value: u32) {
        let mut bytes = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        let mut rest = value;
        loop {
            let group = (rest & 0x7f) as u8;
            rest >>= 7;
            if rest == 0 {
                bytes[len] = group | 0x80;
                len += 1;
                break;
            }
            bytes[len] = group;
            len += 1;
        }
        self.put_primitive(&bytes[..len]);
    }

    /// Writes a signed varint using zigzag encoding.
    pub fn put_var_i32(&mut self, value: i32) {
        self.put_var_u32(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Writes the UTF-8 bytes of `value` followed by a single NUL.
    ///
    /// Interior NULs are written as is.
    pub fn put_utf8_cstring(&mut self, value: &str) {
        self.put_slice(value.as_bytes());
        self.put_u8(0);
    }

    // ---- reading ----

    /// Fills `dst` from the cursor.
    ///
    /// On underflow the cursor stays advanced past the bytes that were copied.
    pub fn get_slice(&mut self, dst: &mut [u8]) -> Result<()> {
        let mut done = 0;
        while done < dst.len() {
            let room = self.read_room();
            if room == 0 {
                if self.is_last_block() {
                    return Err(Error::underflow(dst.len(), done));
                }
                self.next_block();
                continue;
            }
            let n = room.min(dst.len() - done);
            let start = self.pos;
            dst[done..done + n].copy_from_slice(&self.blocks[self.current].data[start..start + n]);
            self.pos += n;
            done += n;
        }
        Ok(())
    }

    fn get_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.get_slice(&mut bytes)?;
        Ok(bytes)
    }

    /// Skips `len` bytes.
    pub fn advance(&mut self, len: usize) -> Result<()> {
        let mut left = len;
        while left > 0 {
            let room = self.read_room();
            if room == 0 {
                if self.is_last_block() {
                    return Err(Error::underflow(len, len - left));
                }
                self.next_block();
                continue;
            }
            let n = room.min(left);
            self.pos += n;
            left -= n;
        }
        Ok(())
    }

    /// Reads `len` bytes into a new vector.
    ///
    /// The length is checked against [`remaining`](Self::remaining) before anything is
    /// allocated. On underflow the cursor moves to the end of the data.
    pub fn get_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let available = self.remaining();
        if len > available {
            self.advance(available)?;
            return Err(Error::underflow(len, available));
        }
        let mut bytes = vec![0u8; len];
        self.get_slice(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads `len` bytes into a new [`ByteString`] with a single allocation.
    pub fn get_byte_string(&mut self, len: usize) -> Result<ByteString> {
        let available = self.remaining();
        if len > available {
            self.advance(available)?;
            return Err(Error::underflow(len, available));
        }
        Ok(ByteString::read_from(self, len)?)
    }

    pub fn get_u8(&mut self) -> Result<u8> {
        if self.read_room() > 0 {
            let byte = self.blocks[self.current].data[self.pos];
            self.pos += 1;
            return Ok(byte);
        }
        let [byte] = self.get_array::<1>()?;
        Ok(byte)
    }

    pub fn get_i16(&mut self) -> Result<i16> {
        let bytes = self.get_array::<2>()?;
        Ok(match self.order {
            Endian::Big => BigEndian::read_i16(&bytes),
            Endian::Little => LittleEndian::read_i16(&bytes),
        })
    }

    pub fn get_i32(&mut self) -> Result<i32> {
        let bytes = self.get_array::<4>()?;
        Ok(match self.order {
            Endian::Big => BigEndian::read_i32(&bytes),
            Endian::Little => LittleEndian::read_i32(&bytes),
        })
    }

    pub fn get_i64(&mut self) -> Result<i64> {
        let bytes = self.get_array::<8>()?;
        Ok(match self.order {
            Endian::Big => BigEndian::read_i64(&bytes),
            Endian::Little => LittleEndian::read_i64(&bytes),
        })
    }

    pub fn get_f32(&mut self) -> Result<f32> {
        let bytes = self.get_array::<4>()?;
        Ok(match self.order {
            Endian::Big => BigEndian::read_f32(&bytes),
            Endian::Little => LittleEndian::read_f32(&bytes),
        })
    }

    pub fn get_f64(&mut self) -> Result<f64> {
        let bytes = self.get_array::<8>()?;
        Ok(match self.order {
            Endian::Big => BigEndian::read_f64(&bytes),
            Endian::Little => LittleEndian::read_f64(&bytes),
        })
    }

    /// Reads an unsigned varint written by [`put_var_u32`](Self::put_var_u32).
    ///
    /// An encoding longer than five bytes, or one that overflows 32 bits, is a decoding
    /// error.
    pub fn get_var_u32(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.get_u8()?;
            let group = u32::from(byte & 0x7f);
            if i == MAX_VARINT_LEN - 1 && group > 0x0f {
                return Err(Error::decoding("Varint overflows 32 bits"));
            }
            value |= group << (7 * i);
            if byte & 0x80 != 0 {
                return Ok(value);
            }
        }
        Err(Error::decoding(format!(
            "Varint longer than {} bytes",
            MAX_VARINT_LEN
        )))
    }

    /// Reads a zigzag-encoded signed varint.
    pub fn get_var_i32(&mut self) -> Result<i32> {
        let raw = self.get_var_u32()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    /// Reads UTF-8 bytes up to the next NUL and consumes the NUL.
    ///
    /// The terminator may sit in a later block than the content. Without a terminator the
    /// read fails with a buffer underflow after consuming the rest of the data.
    pub fn get_utf8_cstring(&mut self) -> Result<String> {
        let len = match self.scan_to_nul() {
            Ok(len) => len,
            Err(err) => {
                self.advance(self.remaining())?;
                return Err(err);
            }
        };
        let bytes = self.get_vec(len)?;
        self.advance(1)?;
        self.decode_utf8(bytes)
    }

    /// Reads a string of declared length `len`: `len - 1` content bytes followed by a NUL.
    ///
    /// A zero length or a missing terminator is a decoding error.
    pub fn get_utf8_cstring_len(&mut self, len: usize) -> Result<String> {
        if len == 0 {
            return Err(Error::decoding("String length must be at least 1"));
        }
        let bytes = self.get_vec(len - 1)?;
        let terminator = self.get_u8()?;
        if terminator != 0 {
            return Err(Error::decoding(format!(
                "Expected string terminator, found 0x{:02x}",
                terminator
            )));
        }
        self.decode_utf8(bytes)
    }

    fn scan_to_nul(&self) -> Result<usize> {
        let mut scanned = 0;
        let mut start = self.pos;
        for block in &self.blocks[self.current..] {
            let readable = block.written().get(start..).unwrap_or(&[]);
            if let Some(i) = readable.iter().position(|&b| b == 0) {
                return Ok(scanned + i);
            }
            scanned += readable.len();
            start = 0;
        }
        Err(Error::underflow(scanned + 1, scanned))
    }

    fn decode_utf8(&self, bytes: Vec<u8>) -> Result<String> {
        match String::from_utf8(bytes) {
            Ok(s) => Ok(s),
            Err(e) => match self.policy {
                MalformedPolicy::Replace => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
                MalformedPolicy::Reject => Err(Error::decoding(format!(
                    "Malformed UTF-8 in string: {}",
                    e.utf8_error()
                ))),
            },
        }
    }

    // ---- finalizing and streaming ----

    /// Concatenates the written bytes of every block.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.len());
        for block in &self.blocks {
            out.extend_from_slice(block.written());
        }
        out
    }

    /// Like [`to_bytes`](Self::to_bytes), reusing the allocation of a single owned block.
    #[must_use]
    pub fn into_bytes(mut self) -> Vec<u8> {
        if self.blocks.len() != 1 {
            return self.to_bytes();
        }
        let Block { data, filled } = self.blocks.remove(0);
        match data {
            Cow::Owned(mut bytes) => {
                bytes.truncate(filled);
                bytes
            }
            Cow::Borrowed(bytes) => bytes[..filled].to_vec(),
        }
    }

    /// Writes every block's data to `out`.
    pub fn write_to<W: io::Write + ?Sized>(&self, out: &mut W) -> Result<()> {
        for block in &self.blocks {
            out.write_all(block.written())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Appends everything `input` yields until it reports end of stream.
    ///
    /// Returns the number of bytes read. The cursor is left at the end of the data, so call
    /// [`rewind`](Self::rewind) before reading it back.
    ///
    /// ```rust
    /// use datacodec::ChunkedBuffer;
    ///
    /// let mut buffer = ChunkedBuffer::new();
    /// let read = buffer.read_from(&mut &b"abc"[..]).unwrap();
    /// assert_eq!(read, 3);
    /// buffer.rewind();
    /// assert_eq!(buffer.get_vec(3).unwrap(), b"abc");
    /// ```
    pub fn read_from<R: io::Read + ?Sized>(&mut self, input: &mut R) -> Result<usize> {
        self.current = self.blocks.len() - 1;
        self.pos = self.blocks[self.current].filled;

        let mut total = 0;
        loop {
            if self.write_room() == 0 {
                self.grow(self.block_size);
            }
            let pos = self.pos;
            let block = &mut self.blocks[self.current];
            let target = &mut block.data.to_mut()[pos..];
            match input.read(target) {
                Ok(0) => break,
                Ok(n) => {
                    block.filled = block.filled.max(pos + n);
                    self.pos += n;
                    total += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(total)
    }
}

fn check_block_size(block_size: usize) -> Result<()> {
    if block_size < MIN_BLOCK_SIZE {
        return Err(Error::illegal_argument(format!(
            "Block size {} is below the minimum of {}",
            block_size, MIN_BLOCK_SIZE
        )));
    }
    Ok(())
}

impl Default for ChunkedBuffer<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ChunkedBuffer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedBuffer")
            .field("id", &self.id)
            .field("order", &self.order)
            .field("block_size", &self.block_size)
            .field("blocks", &self.blocks.len())
            .field("len", &self.len())
            .field("position", &(self.current, self.pos))
            .finish()
    }
}

impl io::Read for ChunkedBuffer<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.remaining());
        self.get_slice(&mut buf[..n])
            .map_err(|e| io::Error::new(io::ErrorKind::UnexpectedEof, e))?;
        Ok(n)
    }
}

impl io::Write for ChunkedBuffer<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn small() -> ChunkedBuffer<'static> {
        ChunkedBuffer::with_block_size(Endian::Little, MIN_BLOCK_SIZE).unwrap()
    }

    #[test]
    fn test_block_size_minimum() {
        assert!(matches!(
            ChunkedBuffer::with_block_size(Endian::Little, 8),
            Err(Error::IllegalArgument(_))
        ));
        assert!(ChunkedBuffer::chunked(Endian::Little, b"abc", 15).is_err());
    }

    #[test]
    fn test_primitives_round_trip_both_orders() {
        for order in [Endian::Big, Endian::Little] {
            let mut buffer = ChunkedBuffer::with_block_size(order, 16).unwrap();
            buffer.put_u8(0xfe);
            buffer.put_i16(-2);
            buffer.put_i32(i32::MIN);
            buffer.put_i64(i64::MAX);
            buffer.put_f32(1.5);
            buffer.put_f64(-0.25);

            buffer.rewind();
            assert_eq!(buffer.get_u8().unwrap(), 0xfe);
            assert_eq!(buffer.get_i16().unwrap(), -2);
            assert_eq!(buffer.get_i32().unwrap(), i32::MIN);
            assert_eq!(buffer.get_i64().unwrap(), i64::MAX);
            assert_eq!(buffer.get_f32().unwrap(), 1.5);
            assert_eq!(buffer.get_f64().unwrap(), -0.25);
            assert_eq!(buffer.remaining(), 0);
        }
    }

    #[test]
    fn test_byte_order() {
        let mut big = ChunkedBuffer::with_order(Endian::Big);
        big.put_i32(1);
        assert_eq!(big.to_bytes(), vec![0, 0, 0, 1]);

        let mut little = ChunkedBuffer::with_order(Endian::Little);
        little.put_i32(1);
        assert_eq!(little.to_bytes(), vec![1, 0, 0, 0]);
    }

    #[test]
    fn test_appended_primitive_never_straddles() {
        let mut buffer = small();
        buffer.put_slice(&[7; 14]);
        buffer.put_i32(0x0403_0201);
        assert_eq!(buffer.block_count(), 2);
        assert_eq!(buffer.len(), 18);

        let bytes = buffer.to_bytes();
        assert_eq!(&bytes[14..], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_large_slice_gets_one_block() {
        let mut buffer = small();
        buffer.put_slice(&[1; 100]);
        assert_eq!(buffer.block_count(), 2);
        assert_eq!(buffer.len(), 100);
    }

    #[test]
    fn test_varint_boundaries() {
        let cases: [(u32, &[u8]); 6] = [
            (0, &[0x80]),
            (1, &[0x81]),
            (127, &[0xff]),
            (128, &[0x00, 0x81]),
            (16383, &[0x7f, 0xff]),
            (16384, &[0x00, 0x00, 0x81]),
        ];
        for (value, expected) in cases {
            let mut buffer = ChunkedBuffer::new();
            buffer.put_var_u32(value);
            assert_eq!(buffer.to_bytes(), expected, "encoding of {}", value);
            buffer.rewind();
            assert_eq!(buffer.get_var_u32().unwrap(), value);
        }

        let mut buffer = ChunkedBuffer::new();
        buffer.put_var_u32(u32::MAX);
        assert_eq!(buffer.to_bytes(), vec![0x7f, 0x7f, 0x7f, 0x7f, 0x8f]);
    }

    #[test]
    fn test_zigzag() {
        let cases: [(i32, &[u8]); 4] = [(0, &[0x80]), (-1, &[0x81]), (1, &[0x82]), (-64, &[0xff])];
        for (value, expected) in cases {
            let mut buffer = ChunkedBuffer::new();
            buffer.put_var_i32(value);
            assert_eq!(buffer.to_bytes(), expected, "encoding of {}", value);
        }

        for value in [i32::MIN, i32::MAX, -16384, 16384, -128, 127] {
            let mut buffer = small();
            buffer.put_var_i32(value);
            buffer.rewind();
            assert_eq!(buffer.get_var_i32().unwrap(), value);
        }
    }

    #[test]
    fn test_overlong_varint() {
        let mut buffer = ChunkedBuffer::wrap(Endian::Little, &[0, 0, 0, 0, 0, 0x80]);
        assert!(matches!(buffer.get_var_u32(), Err(Error::Decoding(_))));

        let mut buffer = ChunkedBuffer::wrap(Endian::Little, &[0, 0, 0, 0, 0x90]);
        assert!(matches!(buffer.get_var_u32(), Err(Error::Decoding(_))));
    }

    #[test]
    fn test_underflow_consumes_available() {
        let mut buffer = ChunkedBuffer::wrap(Endian::Little, &[1, 2, 3]);
        assert_eq!(
            buffer.get_i32(),
            Err(Error::BufferUnderflow {
                requested: 4,
                available: 3
            })
        );
        assert_eq!(buffer.remaining(), 0);
    }

    #[test]
    fn test_get_vec_checks_remaining() {
        let mut buffer = ChunkedBuffer::wrap(Endian::Little, b"abc");
        assert!(matches!(
            buffer.get_vec(usize::MAX),
            Err(Error::BufferUnderflow { available: 3, .. })
        ));
    }

    #[test]
    fn test_cstring_across_blocks() {
        let text = "a string long enough to span blocks, with ünïcödé";
        let mut writer = ChunkedBuffer::new();
        writer.put_utf8_cstring(text);
        writer.put_utf8_cstring("");
        writer.put_u8(9);

        let bytes = writer.to_bytes();
        let mut reader = ChunkedBuffer::chunked(Endian::Little, &bytes, 16).unwrap();
        assert!(reader.block_count() > 3);
        assert_eq!(reader.get_utf8_cstring().unwrap(), text);
        assert_eq!(reader.get_utf8_cstring().unwrap(), "");
        assert_eq!(reader.get_u8().unwrap(), 9);
    }

    #[test]
    fn test_cstring_terminator_in_next_block() {
        let mut bytes = vec![b'x'; 16];
        bytes.push(0);
        let mut reader = ChunkedBuffer::chunked(Endian::Little, &bytes, 16).unwrap();
        assert_eq!(reader.block_count(), 2);
        assert_eq!(reader.get_utf8_cstring().unwrap(), "x".repeat(16));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_cstring_without_terminator() {
        let mut reader = ChunkedBuffer::wrap(Endian::Little, b"abc");
        assert!(matches!(
            reader.get_utf8_cstring(),
            Err(Error::BufferUnderflow {
                requested: 4,
                available: 3
            })
        ));
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.len(), 3);

        let mut reader = ChunkedBuffer::chunked(Endian::Little, &[b'x'; 40], 16).unwrap();
        reader.advance(5).unwrap();
        assert!(matches!(
            reader.get_utf8_cstring(),
            Err(Error::BufferUnderflow {
                requested: 36,
                available: 35
            })
        ));
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_cstring_with_length() {
        let mut reader = ChunkedBuffer::wrap(Endian::Little, b"hi\0");
        assert_eq!(reader.get_utf8_cstring_len(3).unwrap(), "hi");

        let mut reader = ChunkedBuffer::wrap(Endian::Little, b"hi!");
        assert!(matches!(
            reader.get_utf8_cstring_len(3),
            Err(Error::Decoding(_))
        ));

        let mut reader = ChunkedBuffer::wrap(Endian::Little, b"\0");
        assert!(matches!(
            reader.get_utf8_cstring_len(0),
            Err(Error::Decoding(_))
        ));
    }

    #[test]
    fn test_malformed_utf8_policy() {
        let bytes = [b'a', 0xff, b'b', 0];

        let mut lenient = ChunkedBuffer::wrap(Endian::Little, &bytes);
        assert_eq!(lenient.get_utf8_cstring().unwrap(), "a\u{fffd}b");

        let mut strict = ChunkedBuffer::wrap(Endian::Little, &bytes)
            .with_malformed_policy(MalformedPolicy::Reject);
        assert!(matches!(
            strict.get_utf8_cstring(),
            Err(Error::Decoding(_))
        ));
    }

    #[test]
    fn test_backpatch_across_blocks() {
        let mut buffer = small();
        buffer.put_slice(&[0xaa; 10]);
        let start = buffer.position();
        buffer.put_i32(0);
        buffer.put_slice(&[0xbb; 40]);
        let end = buffer.position();

        let length = buffer.offset(start, end).unwrap();
        assert_eq!(length, 44);
        buffer.set_position(start).unwrap();
        buffer.put_i32(length as i32);
        buffer.set_position(end).unwrap();
        buffer.put_u8(0xcc);

        let bytes = buffer.to_bytes();
        assert_eq!(bytes.len(), 55);
        assert_eq!(&bytes[10..14], &[44, 0, 0, 0]);
        assert_eq!(bytes[14], 0xbb);
        assert_eq!(bytes[54], 0xcc);
    }

    #[test]
    fn test_overwrite_spans_blocks() {
        let mut buffer = ChunkedBuffer::chunked(Endian::Little, &[0; 32], 16).unwrap();
        buffer.advance(14).unwrap();
        buffer.put_i32(-1);
        assert_eq!(buffer.block_count(), 2);
        let bytes = buffer.to_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[14..18], &[0xff; 4]);
    }

    #[test]
    fn test_boundary_normalization() {
        let mut buffer = ChunkedBuffer::chunked(Endian::Little, &[1; 32], 16).unwrap();
        let block_end = Position {
            buffer: buffer.id,
            block: 0,
            offset: 16,
        };
        buffer.advance(16).unwrap();
        let here = buffer.position();
        assert_eq!(buffer.compare(block_end, here).unwrap(), Ordering::Equal);
        assert_eq!(buffer.offset(block_end, here).unwrap(), 0);

        buffer.rewind();
        buffer.set_position(block_end).unwrap();
        assert_eq!(buffer.remaining(), 16);
        assert_eq!(buffer.position(), here);
    }

    #[test]
    fn test_offset_rules() {
        let mut buffer = small();
        let start = buffer.position();
        buffer.put_slice(&[0; 40]);
        let end = buffer.position();

        assert_eq!(buffer.offset(start, end).unwrap(), 40);
        assert_eq!(buffer.offset(start, start).unwrap(), 0);
        assert!(matches!(
            buffer.offset(end, start),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_foreign_position_rejected() {
        let mut a = ChunkedBuffer::new();
        let mut b = ChunkedBuffer::new();
        a.put_u8(1);
        b.put_u8(1);
        let pos = a.position();

        assert!(matches!(b.set_position(pos), Err(Error::IllegalArgument(_))));
        assert!(matches!(
            b.offset(pos, b.position()),
            Err(Error::IllegalArgument(_))
        ));
        assert!(matches!(
            b.compare(b.position(), pos),
            Err(Error::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_wrapped_bytes_copy_on_write() {
        let original = [1u8, 2, 3, 4];
        let mut buffer = ChunkedBuffer::wrap(Endian::Little, &original);
        buffer.put_u8(9);
        buffer.advance(3).unwrap();
        buffer.put_u8(5);

        assert_eq!(buffer.to_bytes(), vec![9, 2, 3, 4, 5]);
        assert_eq!(original, [1, 2, 3, 4]);
    }

    #[test]
    fn test_into_bytes() {
        let mut buffer = ChunkedBuffer::new();
        buffer.put_slice(b"xyz");
        assert_eq!(buffer.into_bytes(), b"xyz");

        let mut buffer = small();
        buffer.put_slice(&[3; 20]);
        assert_eq!(buffer.into_bytes(), vec![3; 20]);
    }

    #[test]
    fn test_streaming() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut buffer = small();
        assert_eq!(buffer.read_from(&mut data.as_slice()).unwrap(), 1000);
        assert_eq!(buffer.len(), 1000);

        let mut out = Vec::new();
        buffer.write_to(&mut out).unwrap();
        assert_eq!(out, data);

        buffer.rewind();
        let mut read_back = Vec::new();
        buffer.read_to_end(&mut read_back).unwrap();
        assert_eq!(read_back, data);
    }

    #[test]
    fn test_io_write_view() {
        let mut buffer = small();
        write!(buffer, "{}-{}", 12, "ab").unwrap();
        assert_eq!(buffer.to_bytes(), b"12-ab");
    }

    #[test]
    fn test_byte_string_read() {
        let mut buffer = ChunkedBuffer::chunked(Endian::Little, &[5; 40], 16).unwrap();
        buffer.advance(2).unwrap();
        let bytes = buffer.get_byte_string(30).unwrap();
        assert_eq!(bytes.as_slice(), &[5; 30][..]);
        assert_eq!(buffer.remaining(), 8);
        assert!(buffer.get_byte_string(9).is_err());
    }
}
