use thiserror::Error;

/// Failures raised by the bundle codec itself.
///
/// Filesystem failures are not wrapped: they travel as the underlying
/// [`std::io::Error`] inside the returned [`anyhow::Error`]. Both kinds can
/// be recovered with `err.downcast_ref::<T>()`.
#[derive(Debug, Error)]
pub enum BundleError {
    /// An entry name is empty or contains the `0x00` terminator.
    #[error("invalid entry name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// An in-memory entry declares a size that differs from its payload.
    #[error("entry `{name}` declares {declared} bytes but holds {actual}")]
    SizeMismatch {
        name: String,
        declared: u64,
        actual: u64,
    },

    /// The bundle metadata is inconsistent.
    #[error("malformed bundle: {0}")]
    Malformed(String),

    /// A read ran past the end of the source.
    #[error("unexpected end of data: wanted {wanted} bytes at offset {offset}")]
    Truncated { offset: u64, wanted: u64 },

    /// A write ran past the end of a fixed memory region.
    #[error("memory region of {capacity} bytes cannot hold {needed} bytes")]
    RegionFull { capacity: u64, needed: u64 },

    /// A write was attempted on a shared, read-only memory region.
    #[error("memory region is read-only")]
    ReadOnly,

    /// An entry would be unpacked outside the output directory.
    #[error("entry `{0}` escapes the output directory")]
    UnsafePath(String),
}

impl BundleError {
    /// Whether this error means the bundle bytes themselves are bad.
    pub fn is_malformed(&self) -> bool {
        matches!(self, BundleError::Malformed(_) | BundleError::Truncated { .. })
    }
}
