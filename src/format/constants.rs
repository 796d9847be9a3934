/// DSK container magic bytes and layout constants

/// Signature prefix of a standard DSK container
pub const STANDARD_DSK_SIGNATURE: &[u8] = b"MV - CPCEMU";

/// Signature prefix of an extended DSK container
pub const EXTENDED_DSK_SIGNATURE: &[u8] = b"EXTENDED CPC DSK";

/// Size of disk info block
pub const DISK_INFO_BLOCK_SIZE: usize = 256;

/// Size of track info block
pub const TRACK_INFO_BLOCK_SIZE: usize = 256;

/// Size of sector info entry
pub const SECTOR_INFO_SIZE: usize = 8;

/// Offset of track count in disk info block
pub const DISK_INFO_TRACK_COUNT_OFFSET: usize = 0x30;

/// Offset of side count in disk info block
pub const DISK_INFO_SIDE_COUNT_OFFSET: usize = 0x31;

/// Offset of track size in disk info block (standard format)
pub const DISK_INFO_TRACK_SIZE_OFFSET: usize = 0x32;

/// Offset of extended track size table in disk info block (extended format)
pub const DISK_INFO_EXT_TRACK_SIZE_OFFSET: usize = 0x34;

/// Unit of the extended track size table
pub const EXT_TRACK_SIZE_UNIT: usize = 256;

/// Number of logical tracks the extended size table can describe
pub const MAX_EXT_TRACKS: usize = DISK_INFO_BLOCK_SIZE - DISK_INFO_EXT_TRACK_SIZE_OFFSET;

/// Offset of sector size code in track info block
pub const TRACK_INFO_SECTOR_SIZE_OFFSET: usize = 0x14;

/// Offset of sector count in track info block
pub const TRACK_INFO_SECTOR_COUNT_OFFSET: usize = 0x15;

/// Offset of the sector info list in track info block
pub const TRACK_INFO_SECTOR_LIST_OFFSET: usize = 0x18;

/// Offset of the sector ID (R) within a sector info entry
pub const SECTOR_INFO_ID_OFFSET: usize = 0x02;

/// Mask applied to sector IDs to drop the format tag (0x41.., 0xC1..)
pub const SECTOR_ID_MASK: u8 = 0x3F;

/// FDC sector size code to actual byte size mapping
/// Index: size_code (0-8), Value: actual size in bytes
pub const FDC_SECTOR_SIZES: [usize; 9] = [
    128,    // 0
    256,    // 1
    512,    // 2
    1024,   // 3
    2048,   // 4
    4096,   // 5
    8192,   // 6
    16384,  // 7
    32768,  // 8
];

/// Convert FDC size code to actual byte size
#[inline]
pub fn fdc_size_to_bytes(size_code: u8) -> Option<usize> {
    FDC_SECTOR_SIZES.get(size_code as usize).copied()
}
