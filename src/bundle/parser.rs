//! Low-level bundle parser.
//!
//! Reads the metadata of a bundle from any source that implements the
//! [`ByteStream`] trait.
//!
//! ## Parsing Strategy
//!
//! A bundle carries no per-entry offsets, only the byte length of each of
//! its three sections:
//! 1. Read the 24-byte header at offset 0
//! 2. Derive the entry count from the sizes section length
//! 3. Read the names section and split it on the `0x00` terminators
//! 4. Read the fixed-width sizes that follow
//!
//! After [`BundleParser::read_index`] the stream sits at the start of the
//! contents section, ready for payloads to be copied out in order.

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;
use std::io::Cursor;

use anyhow::{Result, bail};

use super::structures::{BundleEntry, BundleHeader, NAME_TERMINATOR};
use crate::BundleError;
use crate::io::ByteStream;

/// Low-level bundle parser.
///
/// Owns the source stream for the duration of a decode. Typically used
/// through [`BundleExtractor`](super::BundleExtractor) rather than directly.
pub struct BundleParser<S: ByteStream> {
    /// The underlying data source
    stream: S,
    /// Total size of the source in bytes
    size: u64,
}

impl<S: ByteStream> BundleParser<S> {
    /// Create a new parser for the given stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the size of the stream cannot be determined.
    pub fn new(stream: S) -> Result<Self> {
        let size = stream.size()?;
        Ok(Self { stream, size })
    }

    /// Read and validate the header at the start of the source.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Truncated`] if the source is shorter than a
    /// header, or [`BundleError::Malformed`] if the header does not describe
    /// a bundle that fits in the source.
    pub fn read_header(&mut self) -> Result<BundleHeader> {
        let mut buf = [0u8; BundleHeader::SIZE];
        self.stream.seek(0)?;
        self.stream.read(&mut buf)?;

        let header = BundleHeader::from_bytes(&buf)?;
        header.validate(self.size)?;

        trace!(
            "header: names={} sizes={} contents={} entries={}",
            header.names_len,
            header.sizes_len,
            header.contents_len,
            header.entry_count()
        );

        Ok(header)
    }

    /// Read every name from the names section.
    ///
    /// The stream is positioned at the start of the names section first
    /// and is left at the start of the sizes section.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Malformed`] unless the section holds exactly
    /// `header.entry_count()` names, each closed by a terminator.
    pub fn read_names(&mut self, header: &BundleHeader) -> Result<Vec<String>> {
        self.stream.seek(header.names_offset())?;

        // validate() bounded names_len by the source size
        let mut section = vec![0u8; header.names_len as usize];
        self.stream.read(&mut section)?;

        let count = header.entry_count();
        let terminators = section.iter().filter(|b| **b == NAME_TERMINATOR).count() as u64;
        if terminators != count || section.last().is_some_and(|b| *b != NAME_TERMINATOR) {
            bail!(BundleError::Malformed(format!(
                "names section holds {} terminated names, expected {}",
                terminators, count
            )));
        }

        // The trailing terminator leaves one empty piece after the split.
        let names = section
            .split(|b| *b == NAME_TERMINATOR)
            .take(count as usize)
            // Lossy conversion keeps non-UTF-8 names from other producers readable
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .collect();

        Ok(names)
    }

    /// Read every size from the sizes section, at the current position.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::Malformed`] if the sizes do not add up to the
    /// contents section length.
    pub fn read_sizes(&mut self, header: &BundleHeader) -> Result<Vec<u64>> {
        let mut section = vec![0u8; header.sizes_len as usize];
        self.stream.read(&mut section)?;

        let mut cursor = Cursor::new(&section);
        let mut sizes = Vec::with_capacity(header.entry_count() as usize);
        for _ in 0..header.entry_count() {
            sizes.push(cursor.read_u64::<LittleEndian>()?);
        }

        let total = sizes
            .iter()
            .try_fold(0u64, |acc, size| acc.checked_add(*size));
        if total != Some(header.contents_len) {
            bail!(BundleError::Malformed(format!(
                "entry sizes do not add up to the {} byte contents section",
                header.contents_len
            )));
        }

        Ok(sizes)
    }

    /// Read the header, names and sizes.
    ///
    /// # Returns
    ///
    /// The header and one payload-less [`BundleEntry`] per stored file, in
    /// bundle order. The stream is left at the start of the contents section.
    pub fn read_index(&mut self) -> Result<(BundleHeader, Vec<BundleEntry>)> {
        let header = self.read_header()?;
        let names = self.read_names(&header)?;
        let sizes = self.read_sizes(&header)?;

        let entries = names
            .into_iter()
            .zip(sizes)
            .map(|(name, size)| BundleEntry::with_size(name, size))
            .collect();

        Ok((header, entries))
    }

    /// Get a mutable reference to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Total size of the source in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Stream;

    fn raw_bundle(names: &[u8], sizes: &[u64], contents: &[u8]) -> Vec<u8> {
        let header = BundleHeader {
            names_len: names.len() as u64,
            sizes_len: sizes.len() as u64 * 8,
            contents_len: contents.len() as u64,
        };
        let mut out = header.to_bytes().to_vec();
        out.extend_from_slice(names);
        for size in sizes {
            out.extend_from_slice(&size.to_le_bytes());
        }
        out.extend_from_slice(contents);
        out
    }

    fn malformed(err: anyhow::Error) -> bool {
        err.downcast_ref::<BundleError>()
            .is_some_and(BundleError::is_malformed)
    }

    #[test]
    fn reads_index_and_stops_at_contents() {
        let data = raw_bundle(b"one\0dir/two\0", &[3, 2], b"abcde");
        let mut parser = BundleParser::new(Stream::from_slice(&data)).unwrap();

        let (header, entries) = parser.read_index().unwrap();
        assert_eq!(header.entry_count(), 2);
        assert_eq!(
            entries,
            vec![
                BundleEntry::with_size("one", 3),
                BundleEntry::with_size("dir/two", 2),
            ]
        );
        assert_eq!(parser.stream_mut().position(), header.contents_offset());
    }

    #[test]
    fn empty_bundle_has_no_entries() {
        let data = [0u8; 24];
        let mut parser = BundleParser::new(Stream::from_slice(&data)).unwrap();
        let (header, entries) = parser.read_index().unwrap();
        assert_eq!(header, BundleHeader::default());
        assert!(entries.is_empty());
    }

    #[test]
    fn missing_terminator_is_malformed() {
        let data = raw_bundle(b"one\0two", &[0, 0], b"");
        let mut parser = BundleParser::new(Stream::from_slice(&data)).unwrap();
        assert!(malformed(parser.read_index().unwrap_err()));
    }

    #[test]
    fn extra_name_is_malformed() {
        let data = raw_bundle(b"a\0b\0", &[0], b"");
        let mut parser = BundleParser::new(Stream::from_slice(&data)).unwrap();
        assert!(malformed(parser.read_index().unwrap_err()));
    }

    #[test]
    fn size_sum_mismatch_is_malformed() {
        let data = raw_bundle(b"a\0", &[4], b"abc");
        let mut parser = BundleParser::new(Stream::from_slice(&data)).unwrap();
        assert!(malformed(parser.read_index().unwrap_err()));
    }

    #[test]
    fn truncated_source_is_malformed() {
        let mut data = raw_bundle(b"a\0", &[3], b"abc");
        data.pop();
        let mut parser = BundleParser::new(Stream::from_slice(&data)).unwrap();
        assert!(malformed(parser.read_index().unwrap_err()));

        let short = [0u8; 10];
        let mut parser = BundleParser::new(Stream::from_slice(&short)).unwrap();
        assert!(malformed(parser.read_header().unwrap_err()));
    }
}
