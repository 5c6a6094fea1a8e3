use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::ByteStream;
use crate::BundleError;

/// How a [`LocalFile`] is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Existing file, read only
    Read,
    /// Created if missing, every write lands at the end
    Append,
}

/// File on the local filesystem
#[derive(Debug)]
pub struct LocalFile {
    file: File,
    path: PathBuf,
    mode: FileMode,
    position: u64,
    written: u64,
}

impl LocalFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_mode(path, FileMode::Read)
    }

    pub fn append(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_mode(path, FileMode::Append)
    }

    pub fn with_mode(path: impl AsRef<Path>, mode: FileMode) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            FileMode::Read => File::open(path)?,
            FileMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };

        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
            position: 0,
            written: 0,
        })
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }
}

impl ByteStream for LocalFile {
    fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let wanted = buf.len() as u64;
        match self.file.read_exact(buf) {
            Ok(()) => {
                self.position += wanted;
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(BundleError::Truncated {
                offset: self.position,
                wanted,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.file.write_all(buf)?;
        self.position += buf.len() as u64;
        self.written += buf.len() as u64;
        Ok(())
    }

    fn seek(&mut self, offset: u64) -> Result<()> {
        self.position = self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn total_written(&self) -> u64 {
        self.written
    }

    fn size(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn path(&self) -> Option<&Path> {
        Some(&self.path)
    }
}
