//! # file-bundle
//!
//! Pack named files into a single flat bundle and unpack them again.
//!
//! Sources and destinations are independent: files can be packed from disk
//! or from memory, into a bundle file or an in-memory buffer, and a bundle
//! can be unpacked from either into a directory or into memory. All
//! combinations share one encoder and one decoder that run over the
//! [`io::Stream`] abstraction.
//!
//! ## Features
//!
//! - Pack from disk paths or from in-memory entries
//! - Unpack to a directory, recreating nested directories
//! - Unpack to memory
//! - List a bundle without reading payloads
//! - Detection of truncated and inconsistent bundles
//!
//! ## Example
//!
//! ```no_run
//! use file_bundle::{BundleEntry, pack_to_memory, unpack};
//!
//! fn main() -> anyhow::Result<()> {
//!     let files = vec![
//!         BundleEntry::new("readme.txt", b"hello".to_vec()),
//!         BundleEntry::new("data/blob.bin", vec![0, 1, 2, 3]),
//!     ];
//!
//!     // Pack into memory, then read it straight back
//!     let bundle = pack_to_memory(&files)?;
//!     for file in unpack(&bundle)? {
//!         println!("{} ({} bytes)", file.name, file.size);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod bundle;
mod error;
pub mod io;

pub use bundle::{
    BundleEntry, BundleExtractor, BundleHeader, BundleWriter, Destination, PayloadSource,
    list_bytes, list_file, pack_paths_to_file, pack_paths_to_memory, pack_to_file,
    pack_to_memory, unpack, unpack_bytes_to_dir, unpack_bytes_to_memory, unpack_file_to_dir,
    unpack_file_to_memory, unpack_to_dir,
};
pub use error::BundleError;
pub use io::{ByteStream, Stream};
