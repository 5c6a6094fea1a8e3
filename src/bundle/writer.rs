use byteorder::{ByteOrder, LittleEndian};
use log::{debug, trace};

use crate::BundleError;
use crate::io::{ByteStream, LocalFile, copy_exact};
use anyhow::{Result, bail};

use super::structures::{BundleEntry, BundleHeader, NAME_TERMINATOR, SIZE_FIELD_LEN};

/// Where the writer finds each entry's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadSource {
    /// The entry's own `bytes`
    Memory,
    /// The file on disk named by the entry
    Disk,
}

/// Bundle writer
///
/// Serializes entries into a sink as header, names, sizes and contents.
pub struct BundleWriter<S: ByteStream> {
    stream: S,
}

impl<S: ByteStream> BundleWriter<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Write a complete bundle holding `entries`.
    ///
    /// Every entry is validated before the first byte is written.
    ///
    /// # Arguments
    ///
    /// * `entries` - Entries in the order they are stored
    /// * `source` - Whether payloads come from `bytes` or from disk
    ///
    /// # Returns
    ///
    /// A summary entry: its name is the sink's path (empty when the sink is
    /// not a file) and its size the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::InvalidName`] or [`BundleError::SizeMismatch`]
    /// for entries the format cannot hold, and any I/O error raised while
    /// reading payloads or writing the sink.
    pub fn write_bundle(
        &mut self,
        entries: &[BundleEntry],
        source: PayloadSource,
    ) -> Result<BundleEntry> {
        for entry in entries {
            entry.validate_name()?;

            if source == PayloadSource::Memory && entry.bytes.len() as u64 != entry.size {
                bail!(BundleError::SizeMismatch {
                    name: entry.name.clone(),
                    declared: entry.size,
                    actual: entry.bytes.len() as u64,
                });
            }
        }

        let header = BundleHeader::for_entries(entries);
        debug!(
            "packing {} entries, {} content bytes",
            entries.len(),
            header.contents_len
        );

        self.stream.write(&header.to_bytes())?;
        self.write_names(entries)?;
        self.write_sizes(entries)?;
        self.write_contents(entries, source)?;

        let name = self
            .stream
            .path()
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(BundleEntry::with_size(name, self.stream.total_written()))
    }

    fn write_names(&mut self, entries: &[BundleEntry]) -> Result<()> {
        for entry in entries {
            self.stream.write(entry.name.as_bytes())?;
            self.stream.write(&[NAME_TERMINATOR])?;
        }
        trace!("names section done at {}", self.stream.total_written());
        Ok(())
    }

    fn write_sizes(&mut self, entries: &[BundleEntry]) -> Result<()> {
        let mut field = [0u8; SIZE_FIELD_LEN as usize];
        for entry in entries {
            LittleEndian::write_u64(&mut field, entry.size);
            self.stream.write(&field)?;
        }
        trace!("sizes section done at {}", self.stream.total_written());
        Ok(())
    }

    fn write_contents(&mut self, entries: &[BundleEntry], source: PayloadSource) -> Result<()> {
        for entry in entries {
            match source {
                PayloadSource::Memory => self.stream.write(&entry.bytes)?,
                PayloadSource::Disk => {
                    let mut input = LocalFile::open(&entry.name)?;
                    copy_exact(&mut input, &mut self.stream, entry.size)?;
                }
            }
        }
        Ok(())
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
