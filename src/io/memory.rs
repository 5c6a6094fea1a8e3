use anyhow::Result;
use log::warn;

use super::ByteStream;
use crate::BundleError;

#[derive(Debug)]
enum Region<'a> {
    Shared(&'a [u8]),
    Exclusive(&'a mut [u8]),
}

/// Fixed-size memory owned by the caller.
///
/// A region never grows. Regions built with [`MemoryRegion::new`] are
/// read-only, regions built with [`MemoryRegion::writable`] accept writes
/// up to their length.
#[derive(Debug)]
pub struct MemoryRegion<'a> {
    region: Region<'a>,
    position: usize,
    written: u64,
}

impl<'a> MemoryRegion<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            region: Region::Shared(data),
            position: 0,
            written: 0,
        }
    }

    pub fn writable(data: &'a mut [u8]) -> Self {
        Self {
            region: Region::Exclusive(data),
            position: 0,
            written: 0,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match &self.region {
            Region::Shared(data) => data,
            Region::Exclusive(data) => data,
        }
    }
}

impl ByteStream for MemoryRegion<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.position = read_at(self.as_slice(), self.position, buf)?;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let Region::Exclusive(data) = &mut self.region else {
            return Err(BundleError::ReadOnly.into());
        };

        let end = self.position + buf.len();
        if end > data.len() {
            return Err(BundleError::RegionFull {
                capacity: data.len() as u64,
                needed: end as u64,
            }
            .into());
        }

        data[self.position..end].copy_from_slice(buf);
        self.position = end;
        self.written += buf.len() as u64;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.position = seek_within(self.as_slice().len(), self.position, offset);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn total_written(&self) -> u64 {
        self.written
    }

    fn size(&self) -> Result<u64> {
        Ok(self.as_slice().len() as u64)
    }
}

/// Owned byte buffer that grows to fit every write.
#[derive(Debug, Default)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    position: usize,
    written: u64,
}

impl GrowableBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty buffer with room for `capacity` bytes before reallocating.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }
}

impl ByteStream for GrowableBuffer {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.position = read_at(&self.data, self.position, buf)?;
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        let end = self.position + buf.len();
        // Grow to exactly what this write needs.
        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[self.position..end].copy_from_slice(buf);
        self.position = end;
        self.written += buf.len() as u64;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.position = seek_within(self.data.len(), self.position, offset);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position as u64
    }

    fn total_written(&self) -> u64 {
        self.written
    }

    fn size(&self) -> Result<u64> {
        Ok(self.data.len() as u64)
    }
}

/// Copy `buf.len()` bytes starting at `position`, returning the new position.
fn read_at(data: &[u8], position: usize, buf: &mut [u8]) -> Result<usize> {
    let end = position
        .checked_add(buf.len())
        .filter(|end| *end <= data.len())
        .ok_or(BundleError::Truncated {
            offset: position as u64,
            wanted: buf.len() as u64,
        })?;

    buf.copy_from_slice(&data[position..end]);
    Ok(end)
}

fn seek_within(len: usize, position: usize, offset: u64) -> usize {
    match usize::try_from(offset) {
        Ok(offset) if offset <= len => offset,
        _ => {
            warn!("ignoring seek to {} past end of {} byte buffer", offset, len);
            position
        }
    }
}
