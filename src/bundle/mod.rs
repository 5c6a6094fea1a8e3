//! Bundle packing and unpacking.
//!
//! A bundle stores any number of named files back to back, with just enough
//! metadata in front of them to find the boundaries again.
//!
//! ## Architecture
//!
//! The module is organized into four components:
//!
//! - [`structures`]: The header and the [`BundleEntry`] file record
//! - [`writer`]: Serializes entries into any [`ByteStream`](crate::io::ByteStream)
//! - [`parser`]: Low-level parsing of the header, names and sizes
//! - [`extractor`]: Copies payloads out to memory or to a directory
//!
//! The free functions in this module cover every combination of disk or
//! memory source and disk or memory destination.
//!
//! ## Bundle Format Overview
//!
//! All integers are little-endian `u64`:
//! 1. Header: byte lengths of the names, sizes and contents sections
//! 2. Names, each followed by a single `0x00`
//! 3. One size per entry, in the same order as the names
//! 4. The payloads, concatenated in the same order
//!
//! There are no magic bytes, no version and no per-entry offsets.
//!
//! ## Limitations
//!
//! - No compression or encryption
//! - No checksums
//! - No random access to a single entry

mod extractor;
mod parser;
mod structures;
mod writer;

pub use extractor::{BundleExtractor, Destination};
pub use parser::BundleParser;
pub use structures::*;
pub use writer::{BundleWriter, PayloadSource};

use log::debug;
use std::path::Path;

use crate::io::Stream;
use anyhow::Result;

/// Pack files from disk into a bundle file.
///
/// Each path string becomes the entry name. The bundle is opened in append
/// mode, so an existing file at `output` is extended rather than replaced.
pub fn pack_paths_to_file<P: AsRef<Path>>(
    output: impl AsRef<Path>,
    sources: &[P],
) -> Result<BundleEntry> {
    let entries = describe_paths(sources)?;
    let mut writer = BundleWriter::new(Stream::append(output)?);
    writer.write_bundle(&entries, PayloadSource::Disk)
}

/// Pack files from disk into an in-memory bundle.
///
/// The returned entry carries the bundle in `bytes`.
pub fn pack_paths_to_memory<P: AsRef<Path>>(sources: &[P]) -> Result<BundleEntry> {
    let entries = describe_paths(sources)?;
    pack_into_buffer(&entries, PayloadSource::Disk)
}

/// Pack in-memory entries into a bundle file.
pub fn pack_to_file(output: impl AsRef<Path>, entries: &[BundleEntry]) -> Result<BundleEntry> {
    let mut writer = BundleWriter::new(Stream::append(output)?);
    writer.write_bundle(entries, PayloadSource::Memory)
}

/// Pack in-memory entries into an in-memory bundle.
pub fn pack_to_memory(entries: &[BundleEntry]) -> Result<BundleEntry> {
    pack_into_buffer(entries, PayloadSource::Memory)
}

/// Unpack a bundle file into `output_dir`.
///
/// Returned entries carry names and sizes only.
pub fn unpack_file_to_dir(
    archive: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<BundleEntry>> {
    BundleExtractor::new(Stream::open(archive)?)?.extract_to_dir(output_dir.as_ref())
}

/// Unpack a bundle file into memory.
pub fn unpack_file_to_memory(archive: impl AsRef<Path>) -> Result<Vec<BundleEntry>> {
    BundleExtractor::new(Stream::open(archive)?)?.extract_to_memory()
}

/// Unpack an in-memory bundle into `output_dir`.
pub fn unpack_bytes_to_dir(
    bundle: &[u8],
    output_dir: impl AsRef<Path>,
) -> Result<Vec<BundleEntry>> {
    BundleExtractor::new(Stream::from_slice(bundle))?.extract_to_dir(output_dir.as_ref())
}

/// Unpack an in-memory bundle into memory.
pub fn unpack_bytes_to_memory(bundle: &[u8]) -> Result<Vec<BundleEntry>> {
    BundleExtractor::new(Stream::from_slice(bundle))?.extract_to_memory()
}

/// Unpack the result of an earlier pack into memory.
///
/// Uses the bundle held in `bundle.bytes` when there is one, otherwise
/// reads the bundle file named by `bundle.name`. A summary with neither
/// yields no entries.
pub fn unpack(bundle: &BundleEntry) -> Result<Vec<BundleEntry>> {
    if bundle.has_bytes() {
        unpack_bytes_to_memory(&bundle.bytes)
    } else if !bundle.name.is_empty() {
        unpack_file_to_memory(&bundle.name)
    } else {
        debug!("nothing to unpack: summary has neither bytes nor a path");
        Ok(Vec::new())
    }
}

/// Unpack the result of an earlier pack into `output_dir`.
///
/// Dispatches the same way as [`unpack`].
pub fn unpack_to_dir(
    bundle: &BundleEntry,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<BundleEntry>> {
    if bundle.has_bytes() {
        unpack_bytes_to_dir(&bundle.bytes, output_dir)
    } else if !bundle.name.is_empty() {
        unpack_file_to_dir(&bundle.name, output_dir)
    } else {
        debug!("nothing to unpack: summary has neither bytes nor a path");
        Ok(Vec::new())
    }
}

/// List the entries of a bundle file without reading payloads.
pub fn list_file(archive: impl AsRef<Path>) -> Result<Vec<BundleEntry>> {
    BundleExtractor::new(Stream::open(archive)?)?.list_files()
}

/// List the entries of an in-memory bundle without reading payloads.
pub fn list_bytes(bundle: &[u8]) -> Result<Vec<BundleEntry>> {
    BundleExtractor::new(Stream::from_slice(bundle))?.list_files()
}

fn describe_paths<P: AsRef<Path>>(sources: &[P]) -> Result<Vec<BundleEntry>> {
    sources.iter().map(BundleEntry::from_path).collect()
}

fn pack_into_buffer(entries: &[BundleEntry], source: PayloadSource) -> Result<BundleEntry> {
    let mut writer = BundleWriter::new(Stream::buffer());
    let mut summary = writer.write_bundle(entries, source)?;
    summary.bytes = writer.into_inner().into_bytes().unwrap_or_default();
    Ok(summary)
}
