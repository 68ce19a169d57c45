use thiserror::Error;

/// Errors produced while packing or unpacking an archive.
///
/// Every failure is terminal for the call that raised it. Errors coming from
/// a [`Compressor`](crate::compress::Compressor) that are not already a
/// `PackError` are reported as [`PackError::CorruptedData`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    /// Magic bytes missing or mismatched
    #[error("Invalid archive header")]
    InvalidHeader,

    /// Length fields disagree with the buffer, or the payload is malformed
    #[error("Corrupted archive data: {0}")]
    CorruptedData(String),

    /// Buffer ended before a fixed-size field could be read
    #[error("Unexpected end of archive data")]
    UnexpectedEnd,

    /// An entry record declares more bytes than remain in the buffer
    #[error("Entry exceeds archive bounds")]
    EntryExceedsBounds,

    /// A path is longer than 65535 bytes once UTF-8 encoded
    #[error("Path too long: {0} bytes (maximum is 65535)")]
    PathTooLong(usize),

    /// The combined content size does not fit the 32-bit length fields
    #[error("Archive content too large (maximum is 4294967295 bytes)")]
    ContentTooLarge,

    /// The requested compression format is not available
    #[error("Unsupported compression format: {0}")]
    UnsupportedCompression(String),
}

impl PackError {
    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        PackError::CorruptedData(msg.into())
    }

    /// Map an arbitrary lower-level failure into this taxonomy.
    ///
    /// A `PackError` carried inside the `anyhow::Error` is returned as is;
    /// anything else becomes [`PackError::CorruptedData`].
    pub fn normalize(err: anyhow::Error) -> Self {
        match err.downcast::<PackError>() {
            Ok(e) => e,
            Err(other) => PackError::CorruptedData(format!("{:#}", other)),
        }
    }
}

impl From<std::io::Error> for PackError {
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => PackError::UnexpectedEnd,
            _ => PackError::CorruptedData(e.to_string()),
        }
    }
}

/// Result type alias for pack operations
pub type Result<T> = std::result::Result<T, PackError>;
