/// CP/M filesystem reconstruction

/// Directory reconstruction and the mounted filesystem
pub mod cpm;
/// Copying file data to a sink
pub mod extract;
/// Filesystem geometry detection
pub mod geometry;
/// CP/M 8.3 filenames
pub mod name;

pub use cpm::{reconstruct_directory, CpmFileSystem, Extent, FileEntry};
pub use extract::{extract_all, extract_entry, extract_file, write_file, Extracted};
pub use geometry::{DiskGeometry, GeometrySource, HeuristicFormat};
pub use name::CpmName;

use crate::error::Result;

/// File attributes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    /// Read-only flag
    pub read_only: bool,
    /// System file flag
    pub system: bool,
    /// Archive flag
    pub archive: bool,
}

impl FileAttributes {
    /// Short flag string for listings, e.g. `R-A`
    pub fn flags(&self) -> String {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        format!(
            "{}{}{}",
            flag(self.read_only, 'R'),
            flag(self.system, 'S'),
            flag(self.archive, 'A')
        )
    }
}

/// Directory entry
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Filename (8.3 format, e.g., "FILENAME.TXT")
    pub name: String,
    /// User number (0-15)
    pub user: u8,
    /// File size in bytes
    pub size: usize,
    /// File attributes
    pub attributes: FileAttributes,
}

/// Filesystem information
#[derive(Debug)]
pub struct FileSystemInfo {
    /// Filesystem type name
    pub fs_type: String,
    /// Block size in bytes
    pub block_size: usize,
    /// Whole blocks after the reserved area
    pub total_blocks: usize,
    /// Blocks listed by files
    pub used_blocks: usize,
    /// Blocks taken by the directory
    pub directory_blocks: usize,
    /// Directory capacity in entries
    pub max_dir_entries: usize,
    /// Bytes reserved for system tracks
    pub reserved_bytes: usize,
}

impl FileSystemInfo {
    /// Blocks neither used by files nor by the directory
    pub fn free_blocks(&self) -> usize {
        self.total_blocks
            .saturating_sub(self.used_blocks)
            .saturating_sub(self.directory_blocks)
    }
}

/// Read access to the files on a disk image
pub trait FileSystem {
    /// List directory entries
    fn read_dir(&self) -> Vec<DirEntry>;

    /// Read a file's contents
    fn read_file(&self, name: &str) -> Result<Vec<u8>>;

    /// Get filesystem information
    fn info(&self) -> FileSystemInfo;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_flags() {
        let attrs = FileAttributes {
            read_only: true,
            system: false,
            archive: true,
        };
        assert_eq!(attrs.flags(), "R-A");
        assert_eq!(FileAttributes::default().flags(), "---");
    }

    #[test]
    fn test_free_blocks() {
        let info = FileSystemInfo {
            fs_type: "CP/M".to_string(),
            block_size: 1024,
            total_blocks: 180,
            used_blocks: 20,
            directory_blocks: 2,
            max_dir_entries: 64,
            reserved_bytes: 0,
        };
        assert_eq!(info.free_blocks(), 158);
    }
}
