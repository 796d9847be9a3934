/// Decoded DSK image

use crate::error::Result;
use crate::format::{ContainerFormat, FormatSpec};
use std::path::Path;

/// Logical block-device image decoded from a DSK container
///
/// Sectors are stored in ascending logical order within each track and tracks
/// in (track, side) order, so CP/M offsets can be computed directly. The
/// buffer is never modified once decoded.
#[derive(Debug, Clone)]
pub struct DiskImage {
    /// Container variant the image was decoded from
    pub(crate) format: ContainerFormat,
    /// Physical geometry recorded while decoding
    pub(crate) spec: FormatSpec,
    /// De-interleaved sector data
    pub(crate) data: Vec<u8>,
    /// Original filename if loaded from disk
    pub(crate) filename: Option<String>,
}

impl DiskImage {
    /// Open and decode a DSK file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::read_dsk(path)
    }

    /// Decode a DSK container already held in memory
    pub fn from_bytes(container: &[u8]) -> Result<Self> {
        crate::io::decode(container)
    }

    /// Get the container variant
    pub fn format(&self) -> ContainerFormat {
        self.format
    }

    /// Get the physical geometry
    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    /// Get the original filename if loaded from disk
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// The whole logical image
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size of the logical image in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no formatted sectors were found
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow `len` bytes starting at `offset`, or `None` past the end of the image
    pub fn read_bytes(&self, offset: usize, len: usize) -> Option<&[u8]> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
    }

    /// Write the logical image to a raw file
    pub fn save_raw<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, &self.data)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(data: Vec<u8>) -> DiskImage {
        DiskImage {
            format: ContainerFormat::Standard,
            spec: FormatSpec::new(1, 1, 1, data.len()),
            data,
            filename: None,
        }
    }

    #[test]
    fn test_read_bytes() {
        let img = image((0..=255).collect());
        assert_eq!(img.read_bytes(16, 4), Some(&[16u8, 17, 18, 19][..]));
        assert_eq!(img.read_bytes(252, 4).map(<[u8]>::len), Some(4));
    }

    #[test]
    fn test_read_bytes_out_of_range() {
        let img = image(vec![0; 256]);
        assert!(img.read_bytes(253, 4).is_none());
        assert!(img.read_bytes(usize::MAX, 2).is_none());
    }

    #[test]
    fn test_len() {
        let img = image(vec![0xE5; 512]);
        assert_eq!(img.len(), 512);
        assert!(!img.is_empty());
    }
}
