mod local;
mod memory;

pub use local::{FileMode, LocalFile};
pub use memory::{GrowableBuffer, MemoryRegion};

use anyhow::Result;
use std::path::Path;

/// Upper bound for a single bulk transfer in [`copy_exact`].
pub const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// Trait for sequential reading and writing over a bundle backing
pub trait ByteStream {
    /// Fill `buf` from the current position and advance past it.
    ///
    /// Fails with [`BundleError::Truncated`](crate::BundleError::Truncated)
    /// if fewer than `buf.len()` bytes remain.
    fn read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write `buf` at the current position and advance past it.
    fn write(&mut self, buf: &[u8]) -> Result<()>;

    /// Move the current position to `offset` bytes from the start.
    fn seek(&mut self, offset: u64) -> Result<()>;

    /// Get the current position
    fn position(&self) -> u64;

    /// Get the number of bytes written so far.
    ///
    /// This only ever grows and is not affected by [`seek`](Self::seek).
    fn total_written(&self) -> u64;

    /// Get the total size of the backing
    fn size(&self) -> Result<u64>;

    /// Path of the backing file, if there is one
    fn path(&self) -> Option<&Path> {
        None
    }
}

/// A byte stream over one of the three supported backings.
///
/// The kind is chosen at construction and never changes.
#[derive(Debug)]
pub enum Stream<'a> {
    /// Caller-owned fixed-size memory
    Memory(MemoryRegion<'a>),
    /// Owned buffer that grows on write
    Buffer(GrowableBuffer),
    /// File on disk
    File(LocalFile),
}

impl<'a> Stream<'a> {
    /// Read-only stream over borrowed bytes.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Stream::Memory(MemoryRegion::new(data))
    }

    /// Writable stream over a borrowed fixed-size region.
    pub fn from_mut_slice(data: &'a mut [u8]) -> Self {
        Stream::Memory(MemoryRegion::writable(data))
    }

    /// Empty growable buffer.
    pub fn buffer() -> Self {
        Stream::Buffer(GrowableBuffer::new())
    }

    /// Open an existing file for reading.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Stream::File(LocalFile::open(path)?))
    }

    /// Open (or create) a file for appending.
    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Stream::File(LocalFile::append(path)?))
    }

    /// Take the owned buffer out of a [`Stream::Buffer`].
    ///
    /// Returns `None` for the other kinds, which do not own their bytes.
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Stream::Buffer(buffer) => Some(buffer.into_inner()),
            Stream::Memory(_) | Stream::File(_) => None,
        }
    }
}

impl ByteStream for Stream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        match self {
            Stream::Memory(m) => m.read(buf),
            Stream::Buffer(b) => b.read(buf),
            Stream::File(f) => f.read(buf),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        match self {
            Stream::Memory(m) => m.write(buf),
            Stream::Buffer(b) => b.write(buf),
            Stream::File(f) => f.write(buf),
        }
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        match self {
            Stream::Memory(m) => m.seek(offset),
            Stream::Buffer(b) => b.seek(offset),
            Stream::File(f) => f.seek(offset),
        }
    }

    fn position(&self) -> u64 {
        match self {
            Stream::Memory(m) => m.position(),
            Stream::Buffer(b) => b.position(),
            Stream::File(f) => f.position(),
        }
    }

    fn total_written(&self) -> u64 {
        match self {
            Stream::Memory(m) => m.total_written(),
            Stream::Buffer(b) => b.total_written(),
            Stream::File(f) => f.total_written(),
        }
    }

    fn size(&self) -> Result<u64> {
        match self {
            Stream::Memory(m) => m.size(),
            Stream::Buffer(b) => b.size(),
            Stream::File(f) => f.size(),
        }
    }

    fn path(&self) -> Option<&Path> {
        match self {
            Stream::File(f) => f.path(),
            Stream::Memory(_) | Stream::Buffer(_) => None,
        }
    }
}

/// Copy exactly `len` bytes from `source` to `sink`.
///
/// Data moves in chunks of at most [`COPY_CHUNK_SIZE`] bytes. A source that
/// runs dry before `len` bytes fails with
/// [`BundleError::Truncated`](crate::BundleError::Truncated).
pub fn copy_exact<S, D>(source: &mut S, sink: &mut D, len: u64) -> Result<()>
where
    S: ByteStream + ?Sized,
    D: ByteStream + ?Sized,
{
    let chunk_len = usize::try_from(len).map_or(COPY_CHUNK_SIZE, |n| n.min(COPY_CHUNK_SIZE));
    let mut chunk = vec![0u8; chunk_len];
    let mut remaining = len;

    while remaining > 0 {
        let n = remaining.min(chunk_len as u64) as usize;
        source.read(&mut chunk[..n])?;
        sink.write(&chunk[..n])?;
        remaining -= n as u64;
    }

    Ok(())
}
