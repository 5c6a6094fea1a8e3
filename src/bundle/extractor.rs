use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::{ByteStream, LocalFile, MemoryRegion, copy_exact};
use anyhow::Result;

use super::parser::BundleParser;
use super::structures::{BundleEntry, relative_path};

/// Where unpacked payloads go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination<'p> {
    /// Into each returned entry's `bytes`
    Memory,
    /// Into files below this directory
    Directory(&'p Path),
}

/// Bundle extractor
pub struct BundleExtractor<S: ByteStream> {
    parser: BundleParser<S>,
}

impl<S: ByteStream> BundleExtractor<S> {
    pub fn new(stream: S) -> Result<Self> {
        Ok(Self {
            parser: BundleParser::new(stream)?,
        })
    }

    /// List all entries in the bundle without reading their payloads
    pub fn list_files(&mut self) -> Result<Vec<BundleEntry>> {
        let (_, entries) = self.parser.read_index()?;
        Ok(entries)
    }

    /// Unpack every entry to `destination`, in bundle order.
    pub fn extract(&mut self, destination: Destination<'_>) -> Result<Vec<BundleEntry>> {
        match destination {
            Destination::Memory => self.extract_to_memory(),
            Destination::Directory(root) => self.extract_to_dir(root),
        }
    }

    /// Extract every payload into memory
    pub fn extract_to_memory(&mut self) -> Result<Vec<BundleEntry>> {
        let (header, mut entries) = self.parser.read_index()?;
        self.parser.stream_mut().seek(header.contents_offset())?;

        for entry in &mut entries {
            debug!("extracting `{}` ({} bytes) to memory", entry.name, entry.size);

            // The header was checked against the source size, so this fits.
            let mut bytes = vec![0u8; entry.size as usize];
            let mut region = MemoryRegion::writable(&mut bytes);
            copy_exact(self.parser.stream_mut(), &mut region, entry.size)?;
            entry.bytes = bytes;
        }

        Ok(entries)
    }

    /// Extract every entry to a file below `root`
    ///
    /// Directories for all entries are created before any payload is
    /// written. Files are opened in append mode.
    pub fn extract_to_dir(&mut self, root: &Path) -> Result<Vec<BundleEntry>> {
        let (header, entries) = self.parser.read_index()?;
        let targets = prepare_directories(root, &entries)?;
        self.parser.stream_mut().seek(header.contents_offset())?;

        for (entry, target) in entries.iter().zip(&targets) {
            debug!(
                "extracting `{}` ({} bytes) to {}",
                entry.name,
                entry.size,
                target.display()
            );

            let mut output = LocalFile::append(target)?;
            copy_exact(self.parser.stream_mut(), &mut output, entry.size)?;
        }

        Ok(entries)
    }
}

/// Resolve the output path of every entry, then create their directories.
///
/// All names are checked before anything touches the filesystem.
fn prepare_directories(root: &Path, entries: &[BundleEntry]) -> Result<Vec<PathBuf>> {
    let mut targets = Vec::with_capacity(entries.len());
    let mut directories = Vec::new();

    for entry in entries {
        targets.push(root.join(entry.relative_path()?));

        if let Some(directory) = entry.directory() {
            directories.push(root.join(relative_path(directory)?));
        }
    }

    for directory in &directories {
        fs::create_dir_all(directory)?;
    }

    Ok(targets)
}
