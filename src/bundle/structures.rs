use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, bail};

use crate::BundleError;

/// Width of one entry in the sizes section.
pub const SIZE_FIELD_LEN: u64 = 8;

/// Byte that ends every name in the names section.
pub const NAME_TERMINATOR: u8 = 0x00;

/// Bundle header - 24 bytes at offset 0
///
/// Holds the byte length of each of the three sections that follow it.
/// Every section boundary and the entry count are derived from these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BundleHeader {
    pub names_len: u64,
    pub sizes_len: u64,
    pub contents_len: u64,
}

impl BundleHeader {
    pub const SIZE: usize = 24;

    /// Compute the header describing `entries`.
    pub fn for_entries(entries: &[BundleEntry]) -> Self {
        entries.iter().fold(Self::default(), |header, entry| Self {
            names_len: header.names_len + entry.name.len() as u64 + 1,
            sizes_len: header.sizes_len + SIZE_FIELD_LEN,
            contents_len: header.contents_len + entry.size,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            bail!(BundleError::Truncated {
                offset: 0,
                wanted: Self::SIZE as u64,
            });
        }

        let mut cursor = Cursor::new(data);

        Ok(Self {
            names_len: cursor.read_u64::<LittleEndian>()?,
            sizes_len: cursor.read_u64::<LittleEndian>()?,
            contents_len: cursor.read_u64::<LittleEndian>()?,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u64(&mut buf[0..8], self.names_len);
        LittleEndian::write_u64(&mut buf[8..16], self.sizes_len);
        LittleEndian::write_u64(&mut buf[16..24], self.contents_len);
        buf
    }

    pub fn entry_count(&self) -> u64 {
        self.sizes_len / SIZE_FIELD_LEN
    }

    pub fn names_offset(&self) -> u64 {
        Self::SIZE as u64
    }

    pub fn sizes_offset(&self) -> u64 {
        self.names_offset() + self.names_len
    }

    pub fn contents_offset(&self) -> u64 {
        self.sizes_offset() + self.sizes_len
    }

    /// Byte length of the whole bundle this header describes.
    pub fn total_len(&self) -> Option<u64> {
        (Self::SIZE as u64)
            .checked_add(self.names_len)?
            .checked_add(self.sizes_len)?
            .checked_add(self.contents_len)
    }

    /// Check the header is consistent and fits in a source of `source_len` bytes.
    ///
    /// Offsets derived from a header that passes this check cannot overflow.
    pub fn validate(&self, source_len: u64) -> Result<()> {
        if self.sizes_len % SIZE_FIELD_LEN != 0 {
            bail!(BundleError::Malformed(format!(
                "sizes section length {} is not a multiple of {}",
                self.sizes_len, SIZE_FIELD_LEN
            )));
        }

        // Every name takes at least its terminator.
        if self.names_len < self.entry_count() {
            bail!(BundleError::Malformed(format!(
                "names section of {} bytes cannot hold {} names",
                self.names_len,
                self.entry_count()
            )));
        }

        match self.total_len() {
            Some(total) if total <= source_len => Ok(()),
            Some(total) => bail!(BundleError::Malformed(format!(
                "header describes {} bytes but only {} are available",
                total, source_len
            ))),
            None => bail!(BundleError::Malformed(
                "section lengths overflow".to_string()
            )),
        }
    }
}

/// One named file inside a bundle
///
/// `size` is the authoritative payload length. `bytes` is only populated
/// when the payload lives in memory; for entries streamed from or to disk
/// it stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleEntry {
    pub name: String,
    pub size: u64,
    pub bytes: Vec<u8>,
}

impl BundleEntry {
    /// Entry whose payload is already in memory.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
        }
    }

    /// Entry that only describes a payload living elsewhere.
    pub fn with_size(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            bytes: Vec::new(),
        }
    }

    /// Describe a file on disk, taking its size from filesystem metadata.
    ///
    /// The path string becomes the entry name.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        Ok(Self::with_size(path.to_string_lossy(), size))
    }

    /// Replace the payload, keeping `size` in sync.
    pub fn set_bytes(&mut self, bytes: Vec<u8>) {
        self.size = bytes.len() as u64;
        self.bytes = bytes;
    }

    pub fn has_bytes(&self) -> bool {
        !self.bytes.is_empty()
    }

    /// Text before the last `/` or `\` of the name.
    ///
    /// A separator in the very first position does not count, so `"/a"`
    /// has no directory.
    pub fn directory(&self) -> Option<&str> {
        self.name
            .rfind(['/', '\\'])
            .filter(|&i| i > 0)
            .map(|i| &self.name[..i])
    }

    /// Reject names the bundle format cannot represent.
    pub fn validate_name(&self) -> Result<()> {
        let reason = if self.name.is_empty() {
            "name is empty"
        } else if self.name.as_bytes().contains(&NAME_TERMINATOR) {
            "name contains a NUL byte"
        } else {
            return Ok(());
        };

        bail!(BundleError::InvalidName {
            name: self.name.clone(),
            reason,
        })
    }

    /// Path of this entry relative to an output directory.
    pub fn relative_path(&self) -> Result<PathBuf> {
        relative_path(&self.name)
    }
}

/// Turn a stored name into a path that stays below the output directory.
///
/// Both `/` and `\` separate components. Empty and `.` components are
/// dropped; anything that would climb out (`..`, a root, a drive prefix)
/// is refused.
pub(crate) fn relative_path(name: &str) -> Result<PathBuf> {
    let mut path = PathBuf::new();

    for part in name.split(['/', '\\']) {
        if part.is_empty() {
            continue;
        }

        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(c)), None) => path.push(c),
            (Some(Component::CurDir), None) => {}
            _ => bail!(BundleError::UnsafePath(name.to_string())),
        }
    }

    if path.as_os_str().is_empty() {
        bail!(BundleError::UnsafePath(name.to_string()));
    }

    Ok(path)
}
