/// DSK container formats and constants

/// Format constants
pub mod constants;
/// Physical geometry of a decoded container
pub mod spec;

pub use constants::*;
pub use spec::FormatSpec;

/// DSK container variant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Standard DSK format with fixed track sizes
    Standard,
    /// Extended DSK format with variable track sizes
    Extended,
}

impl ContainerFormat {
    /// Get a human-readable name for this format
    pub fn name(&self) -> &'static str {
        match self {
            ContainerFormat::Standard => "Standard DSK",
            ContainerFormat::Extended => "Extended DSK",
        }
    }
}

/// Detect the container variant from the disk info block
pub fn detect_format(magic: &[u8]) -> Option<ContainerFormat> {
    if magic.starts_with(EXTENDED_DSK_SIGNATURE) {
        Some(ContainerFormat::Extended)
    } else if magic.starts_with(STANDARD_DSK_SIGNATURE) {
        Some(ContainerFormat::Standard)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_standard_format() {
        let result = detect_format(b"MV - CPCEMU Disk-File\r\nDisk-Info\r\n");
        assert_eq!(result, Some(ContainerFormat::Standard));
    }

    #[test]
    fn test_detect_extended_format() {
        let result = detect_format(b"EXTENDED CPC DSK File\r\nDisk-Info\r\n");
        assert_eq!(result, Some(ContainerFormat::Extended));
    }

    #[test]
    fn test_detect_invalid_format() {
        assert_eq!(detect_format(b"INVALID DATA"), None);
        assert_eq!(detect_format(b"EXTENDED"), None);
        assert_eq!(detect_format(b""), None);
    }
}
