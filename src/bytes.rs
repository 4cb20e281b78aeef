//! Immutable byte strings.
//!
//! [`ByteString`] is the opaque binary value of the document model. It either owns its
//! bytes or is a window over a shared allocation, so slicing a large payload never copies.
//! Equality and hashing look only at the visible bytes.
//!
//! ```rust
//! use datacodec::ByteString;
//!
//! let whole = ByteString::copy(b"hello world");
//! let window = whole.slice(6..11);
//! assert_eq!(window.as_slice(), b"world");
//! assert_eq!(window, ByteString::copy(b"world"));
//! ```

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io;
use std::ops::{Bound, Deref, RangeBounds};
use std::sync::Arc;

/// An immutable, length-known byte string.
///
/// The bytes live in a shared `Vec`, so taking ownership of a vector never copies it.
#[derive(Clone)]
pub struct ByteString {
    data: Arc<Vec<u8>>,
    start: usize,
    end: usize,
}

impl ByteString {
    /// Creates an empty byte string.
    #[must_use]
    pub fn empty() -> Self {
        ByteString::from(Vec::new())
    }

    /// Copies `bytes` into a new byte string.
    #[must_use]
    pub fn copy(bytes: &[u8]) -> Self {
        ByteString::from(bytes.to_vec())
    }

    /// Creates a window over an existing shared allocation.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds for `data`.
    #[must_use]
    pub fn from_shared<R: RangeBounds<usize>>(data: Arc<Vec<u8>>, range: R) -> Self {
        let (start, end) = resolve(&range, data.len());
        ByteString { data, start, end }
    }

    /// Reads exactly `length` bytes from `reader` into a new byte string.
    ///
    /// The bytes are read straight into the final allocation and never copied after.
    pub fn read_from<R: io::Read + ?Sized>(reader: &mut R, length: usize) -> io::Result<Self> {
        let mut bytes = vec![0u8; length];
        reader.read_exact(&mut bytes)?;
        Ok(ByteString::from(bytes))
    }

    /// Returns a sub-window of this byte string without copying.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds for this byte string.
    #[must_use]
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Self {
        let (start, end) = resolve(&range, self.len());
        ByteString {
            data: Arc::clone(&self.data),
            start: self.start + start,
            end: self.start + end,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.start..self.end]
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }
}

fn resolve<R: RangeBounds<usize>>(range: &R, len: usize) -> (usize, usize) {
    let start = match range.start_bound() {
        Bound::Included(&s) => s,
        Bound::Excluded(&s) => s + 1,
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&e) => e + 1,
        Bound::Excluded(&e) => e,
        Bound::Unbounded => len,
    };
    assert!(
        start <= end && end <= len,
        "range {}..{} out of bounds for length {}",
        start,
        end,
        len
    );
    (start, end)
}

impl Default for ByteString {
    fn default() -> Self {
        Self::empty()
    }
}

impl Deref for ByteString {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for ByteString {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl PartialEq for ByteString {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for ByteString {}

impl Hash for ByteString {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString(0x")?;
        for b in self.as_slice() {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(bytes: Vec<u8>) -> Self {
        let end = bytes.len();
        ByteString {
            data: Arc::new(bytes),
            start: 0,
            end,
        }
    }
}

impl From<&[u8]> for ByteString {
    fn from(bytes: &[u8]) -> Self {
        ByteString::copy(bytes)
    }
}

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_bytes(self.as_slice())
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ByteStringVisitor;

        impl<'de> Visitor<'de> for ByteStringVisitor {
            type Value = ByteString;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a byte string")
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(ByteString::copy(v))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(ByteString::from(v))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: de::SeqAccess<'de>,
            {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(b) = seq.next_element::<u8>()? {
                    bytes.push(b);
                }
                Ok(ByteString::from(bytes))
            }
        }

        deserializer.deserialize_byte_buf(ByteStringVisitor)
    }
}
