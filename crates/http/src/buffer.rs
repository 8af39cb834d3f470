//! Cursor based staging buffer between a socket and a decoder.
//!
//! A [`ByteBuffer`] keeps two positions over its storage:
//!
//! - `used`: how many bytes have been written into the buffer
//! - `read_cursor`: how many of those bytes a decoder has consumed
//!
//! The unread span is always `read_cursor..used`. Reads only move the cursor and never
//! touch written bytes, so [`ByteBuffer::realign`] can run after any incomplete parse to
//! move the unread tail back to the front and make room for the next socket read.
//!
//! The buffer starts at an initial capacity and doubles on demand up to a maximum.
//! Bytes are never dropped silently: a write that cannot fit fails with
//! [`BufferError::CapacityExceeded`].

use bytes::BytesMut;
use thiserror::Error;

use crate::ensure;

/// Initial capacity used by sockets unless configured otherwise.
pub const DEFAULT_CAPACITY: usize = 4 * 1024;

/// Upper bound a buffer may grow to unless configured otherwise.
pub const DEFAULT_MAX_CAPACITY: usize = 64 * 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("buffer capacity exceeded, limit is {max_capacity} bytes")]
    CapacityExceeded { max_capacity: usize },

    #[error("cannot commit {requested} bytes, only {available} bytes are writable")]
    CommitOverflow { requested: usize, available: usize },
}

/// Sizing of the buffer owned by every socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    pub capacity: usize,
    pub max_capacity: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self { capacity: DEFAULT_CAPACITY, max_capacity: DEFAULT_MAX_CAPACITY }
    }
}

impl BufferConfig {
    pub fn new(capacity: usize, max_capacity: usize) -> Self {
        Self { capacity, max_capacity }
    }

    /// Creates an empty buffer with this sizing.
    pub fn build(&self) -> ByteBuffer {
        ByteBuffer::with_max_capacity(self.capacity, self.max_capacity)
    }
}

/// A growable byte buffer with a write position and a read cursor.
#[derive(Debug)]
pub struct ByteBuffer {
    storage: BytesMut,
    used: usize,
    read_cursor: usize,
    max_capacity: usize,
}

impl ByteBuffer {
    /// Creates a buffer that never grows beyond `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self::with_max_capacity(capacity, capacity)
    }

    /// Creates a buffer of `capacity` bytes that may grow up to `max_capacity`.
    ///
    /// A `max_capacity` smaller than `capacity` is raised to `capacity`.
    pub fn with_max_capacity(capacity: usize, max_capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { storage: BytesMut::zeroed(capacity), used: 0, read_cursor: 0, max_capacity: max_capacity.max(capacity) }
    }

    /// Current size of the storage.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    /// Number of unread bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.used - self.read_cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of bytes written so far, including consumed ones.
    #[inline]
    pub fn used(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn read_cursor(&self) -> usize {
        self.read_cursor
    }

    /// Number of bytes that can be appended without realigning or growing.
    #[inline]
    pub fn writable_len(&self) -> usize {
        self.capacity() - self.used
    }

    /// The free tail of the storage. Bytes written here become visible after [`commit`](Self::commit).
    pub fn writable_region(&mut self) -> &mut [u8] {
        &mut self.storage[self.used..]
    }

    /// Marks `count` bytes of the writable region as written.
    pub fn commit(&mut self, count: usize) -> Result<(), BufferError> {
        let available = self.writable_len();
        ensure!(count <= available, BufferError::CommitOverflow { requested: count, available });
        self.used += count;
        Ok(())
    }

    /// Makes sure at least one byte is writable.
    ///
    /// Consumed bytes are reclaimed first; the storage only grows when the unread span
    /// fills it completely.
    pub fn try_reserve(&mut self) -> Result<(), BufferError> {
        if self.writable_len() > 0 {
            return Ok(());
        }

        if self.read_cursor > 0 {
            self.realign();
            return Ok(());
        }

        self.grow(self.capacity() + 1)
    }

    /// Appends `bytes`, growing the storage as needed.
    pub fn write(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        if bytes.len() > self.writable_len() {
            self.realign();
        }
        if bytes.len() > self.writable_len() {
            self.grow(self.used + bytes.len())?;
        }

        self.storage[self.used..self.used + bytes.len()].copy_from_slice(bytes);
        self.used += bytes.len();
        Ok(())
    }

    /// All unread bytes, without consuming them.
    pub fn unread(&self) -> &[u8] {
        &self.storage[self.read_cursor..self.used]
    }

    /// Up to `count` unread bytes, without consuming them.
    pub fn peek(&self, count: usize) -> &[u8] {
        let end = self.read_cursor + count.min(self.len());
        &self.storage[self.read_cursor..end]
    }

    /// Consumes and returns up to `count` bytes.
    pub fn read(&mut self, count: usize) -> &[u8] {
        let start = self.read_cursor;
        self.read_cursor += count.min(self.len());
        &self.storage[start..self.read_cursor]
    }

    /// Consumes bytes up to `delimiter`.
    ///
    /// Returns the bytes before the delimiter and whether the delimiter was found. A found
    /// delimiter is consumed too. When it is missing, everything is consumed except a tail
    /// that could be the start of a multi-byte delimiter; that tail stays unread so the
    /// delimiter can still be matched once the rest of it arrives.
    pub fn read_until(&mut self, delimiter: &[u8]) -> (&[u8], bool) {
        let start = self.read_cursor;
        let unread = self.unread();

        let (taken, skipped, found) = match find(unread, delimiter) {
            Some(position) => (position, delimiter.len(), true),
            None => (unread.len() - partial_suffix_len(unread, delimiter), 0, false),
        };

        self.read_cursor += taken + skipped;
        (&self.storage[start..start + taken], found)
    }

    /// Advances the read cursor by up to `count` bytes.
    pub fn consume(&mut self, count: usize) {
        self.read_cursor += count.min(self.len());
    }

    /// Moves the unread span to the front of the storage.
    pub fn realign(&mut self) {
        if self.read_cursor == 0 {
            return;
        }

        self.storage.copy_within(self.read_cursor..self.used, 0);
        self.used -= self.read_cursor;
        self.read_cursor = 0;
    }

    fn grow(&mut self, required: usize) -> Result<(), BufferError> {
        ensure!(required <= self.max_capacity, BufferError::CapacityExceeded { max_capacity: self.max_capacity });

        let new_capacity = (self.capacity() * 2).clamp(required, self.max_capacity);
        self.storage.resize(new_capacity, 0);
        Ok(())
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(bytes: &[u8]) -> Self {
        let mut buffer = ByteBuffer::with_max_capacity(bytes.len().max(DEFAULT_CAPACITY), DEFAULT_MAX_CAPACITY);
        buffer.storage[..bytes.len()].copy_from_slice(bytes);
        buffer.used = bytes.len();
        buffer
    }
}

impl From<&str> for ByteBuffer {
    fn from(str: &str) -> Self {
        ByteBuffer::from(str.as_bytes())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    match needle {
        [] => Some(0),
        [byte] => haystack.iter().position(|b| b == byte),
        _ => haystack.windows(needle.len()).position(|window| window == needle),
    }
}

/// Length of the longest proper prefix of `delimiter` that `bytes` ends with.
fn partial_suffix_len(bytes: &[u8], delimiter: &[u8]) -> usize {
    (1..delimiter.len()).rev().find(|&len| bytes.ends_with(&delimiter[..len])).unwrap_or(0)
}
