/// Physical geometry recorded while decoding a container

/// Physical disk geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatSpec {
    /// Number of sides (1 or 2)
    pub num_sides: u8,
    /// Number of tracks per side
    pub num_tracks: u8,
    /// Sectors per track, taken from the first formatted track
    pub sectors_per_track: u8,
    /// Sector size in bytes, taken from the first formatted track
    pub sector_size: usize,
    /// Unmasked ID of logical sector 1 on track 0 side 0 (0xC1, 0x41, 0x01...)
    pub first_sector_id: u8,
}

impl FormatSpec {
    /// Create a new format specification
    pub fn new(num_sides: u8, num_tracks: u8, sectors_per_track: u8, sector_size: usize) -> Self {
        Self {
            num_sides,
            num_tracks,
            sectors_per_track,
            sector_size,
            first_sector_id: 0,
        }
    }
}
