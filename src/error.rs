use thiserror::Error;

/// Result type alias for DSK operations
pub type Result<T> = std::result::Result<T, DskError>;

/// Errors that can occur when decoding a DSK image or reading its CP/M filesystem
#[derive(Debug, Error)]
pub enum DskError {
    /// I/O error occurred while reading the container
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or unrecognized DSK container
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A track block could not be read in full
    #[error("Unable to read track {track}:{side} (needed {expected} bytes, {available} available)")]
    ShortRead {
        /// Track number
        track: u8,
        /// Side number
        side: u8,
        /// Bytes required
        expected: usize,
        /// Bytes present in the container
        available: usize,
    },

    /// A logical sector number has no matching ID in the track's sector table
    #[error("Sector {track}:{side}:{sector} not found (missing ID mark on sector)")]
    MissingSector {
        /// Track number
        track: u8,
        /// Side number
        side: u8,
        /// Logical sector number (1-based)
        sector: u8,
    },

    /// Growing a buffer failed
    #[error("Unable to allocate {bytes} bytes")]
    Allocation {
        /// Total size requested
        bytes: usize,
    },

    /// CP/M geometry is unusable for this image
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// An allocation block points outside the decoded image
    #[error("Block {block} at offset {offset} lies outside the disk image")]
    BlockOutOfRange {
        /// Allocation block number
        block: u8,
        /// Byte offset of the block in the image
        offset: usize,
    },

    /// File not found in filesystem
    #[error("File [{0}] not found")]
    FileNotFound(String),

    /// Filename cannot be expressed as a CP/M 8.3 name
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// The output for an extracted file could not be created or written
    #[error("File [{name}] couldn't be created: {source}")]
    Sink {
        /// Host filename
        name: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl DskError {
    /// Create an invalid format error
    pub fn invalid_format<S: Into<String>>(message: S) -> Self {
        DskError::InvalidFormat(message.into())
    }

    /// Create an invalid geometry error
    pub fn geometry<S: Into<String>>(message: S) -> Self {
        DskError::InvalidGeometry(message.into())
    }

    /// Create a sink error for the named output
    pub fn sink<S: Into<String>>(name: S, source: std::io::Error) -> Self {
        DskError::Sink {
            name: name.into(),
            source,
        }
    }

    /// Whether a batch extraction can carry on after this error.
    ///
    /// Only per-file extraction problems qualify; anything raised while
    /// decoding the container or the directory invalidates the whole image.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DskError::FileNotFound(_) | DskError::InvalidFilename(_) | DskError::Sink { .. }
        )
    }
}

/// Reserve `additional` bytes in `buf`, mapping failure to [`DskError::Allocation`]
pub(crate) fn try_grow<T>(buf: &mut Vec<T>, additional: usize) -> Result<()> {
    buf.try_reserve(additional).map_err(|_| DskError::Allocation {
        bytes: (buf.len() + additional) * std::mem::size_of::<T>(),
    })
}
