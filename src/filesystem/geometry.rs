/// CP/M filesystem geometry detection
///
/// Geometry comes from a disk parameter block in the first sector when one is
/// present, otherwise from a fixed table of known Amstrad formats keyed on the
/// ID of the first sector.

use crate::error::{DskError, Result};
use crate::image::DiskImage;

/// Size of a CP/M logical record
pub const RECORD_SIZE: usize = 128;

/// Size of a directory entry
pub const DIR_ENTRY_SIZE: usize = 32;

/// Smallest block size this filesystem supports
pub const MIN_BLOCK_SIZE: usize = 1024;

/// Disk formats recognised from the first sector ID when no parameter block exists
///
/// New formats get a new variant here rather than a looser match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeuristicFormat {
    /// IDs `0x41..` (`01xxxxxx`): CPC system format, two reserved tracks
    System,
    /// IDs `0xC1..` (`11xxxxxx`): CPC data format, no reserved tracks
    Data,
    /// Anything else (IBM-style `0x01..`): one reserved track per side
    Ibm,
}

impl HeuristicFormat {
    /// Classify a first sector ID
    pub fn from_sector_id(id: u8) -> Self {
        match id & 0xC0 {
            0x40 => HeuristicFormat::System,
            0xC0 => HeuristicFormat::Data,
            _ => HeuristicFormat::Ibm,
        }
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            HeuristicFormat::System => "CPC System",
            HeuristicFormat::Data => "CPC Data",
            HeuristicFormat::Ibm => "IBM",
        }
    }
}

/// How a [`DiskGeometry`] was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometrySource {
    /// Read from the disk parameter block in the first sector
    ParameterBlock,
    /// Inferred from the first sector ID
    Heuristic(HeuristicFormat),
}

/// CP/M filesystem geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskGeometry {
    /// Number of tracks per side
    pub num_tracks: u8,
    /// Number of sides
    pub num_sides: u8,
    /// Sectors per track
    pub sectors_per_track: u8,
    /// Sector size in bytes
    pub sector_size: usize,
    /// Allocation block size in bytes
    pub block_size: usize,
    /// Bytes taken by system tracks before the directory
    pub reserved_bytes: usize,
    /// Directory capacity in entries
    pub max_dir_entries: usize,
    /// Treat the first directory slot as deleted
    pub ignore_first_entry: bool,
    /// Where the geometry came from
    pub source: GeometrySource,
}

impl DiskGeometry {
    /// Derive the geometry of a decoded image
    pub fn detect(image: &DiskImage) -> Result<Self> {
        let spec = image.spec();
        let data = image.data();

        let geometry = if has_parameter_block(data, spec.num_sides, spec.num_tracks, spec.sectors_per_track) {
            Self::from_parameter_block(data, spec.num_tracks, spec.num_sides, spec.sectors_per_track)?
        } else {
            Self::from_sector_id(
                spec.first_sector_id,
                spec.num_tracks,
                spec.num_sides,
                spec.sectors_per_track,
            )
        };

        log::debug!(
            "geometry from {:?}: block {} bytes, {} directory entries, {} reserved bytes",
            geometry.source,
            geometry.block_size,
            geometry.max_dir_entries,
            geometry.reserved_bytes
        );

        Ok(geometry)
    }

    /// Read geometry from the disk parameter block at the start of `data`
    ///
    /// | byte | meaning                                   |
    /// |------|-------------------------------------------|
    /// | 0    | format (0 = PCW/+3)                       |
    /// | 1    | sidedness                                 |
    /// | 2    | tracks per side                           |
    /// | 3    | sectors per track                         |
    /// | 4    | sector size shift (size = 128 << n)       |
    /// | 5    | reserved tracks                           |
    /// | 6    | block shift (size = 128 << n)             |
    /// | 7    | directory blocks                          |
    pub fn from_parameter_block(
        data: &[u8],
        num_tracks: u8,
        num_sides: u8,
        sectors_per_track: u8,
    ) -> Result<Self> {
        if data.len() < 8 {
            return Err(DskError::geometry("parameter block is truncated"));
        }

        let block_size = shifted_record_size(data[6])
            .filter(|&size| size >= MIN_BLOCK_SIZE)
            .ok_or_else(|| DskError::geometry(format!("unsupported block shift {}", data[6])))?;
        let sector_size = shifted_record_size(data[4])
            .ok_or_else(|| DskError::geometry(format!("unsupported sector shift {}", data[4])))?;
        let max_dir_entries = data[7] as usize * block_size / DIR_ENTRY_SIZE;
        let reserved_bytes = data[5] as usize * sectors_per_track as usize * sector_size;

        Ok(Self {
            num_tracks,
            num_sides,
            sectors_per_track,
            sector_size,
            block_size,
            reserved_bytes,
            max_dir_entries,
            // With no reserved tracks the first slot holds the parameter block
            // itself, not a file.
            ignore_first_entry: reserved_bytes == 0,
            source: GeometrySource::ParameterBlock,
        })
    }

    /// Fixed geometry for a known format identified by its first sector ID
    pub fn from_sector_id(
        first_sector_id: u8,
        num_tracks: u8,
        num_sides: u8,
        sectors_per_track: u8,
    ) -> Self {
        const SECTOR_SIZE: usize = 512;

        let format = HeuristicFormat::from_sector_id(first_sector_id);
        let track_bytes = sectors_per_track as usize * SECTOR_SIZE;
        let reserved_bytes = match format {
            HeuristicFormat::System => 2 * track_bytes,
            HeuristicFormat::Data => 0,
            HeuristicFormat::Ibm => num_sides as usize * track_bytes,
        };

        Self {
            num_tracks,
            num_sides,
            sectors_per_track,
            sector_size: SECTOR_SIZE,
            block_size: 1024,
            reserved_bytes,
            max_dir_entries: 64,
            ignore_first_entry: false,
            source: GeometrySource::Heuristic(format),
        }
    }

    /// Extent mask: how many 16K logical extents one directory entry spans, minus one
    pub fn extent_mask(&self) -> u8 {
        (self.block_size / MIN_BLOCK_SIZE - 1) as u8
    }

    /// Size of the directory area in bytes
    pub fn directory_bytes(&self) -> usize {
        self.max_dir_entries * DIR_ENTRY_SIZE
    }

    /// Byte offset of allocation block `block` in the image
    pub fn block_offset(&self, block: u8) -> usize {
        self.reserved_bytes + block as usize * self.block_size
    }

    /// Number of whole blocks between the reserved area and the end of an image of `image_len` bytes
    pub fn total_blocks(&self, image_len: usize) -> usize {
        image_len.saturating_sub(self.reserved_bytes) / self.block_size
    }
}

/// Whether the first four bytes describe this disk's own physical geometry
fn has_parameter_block(data: &[u8], num_sides: u8, num_tracks: u8, sectors_per_track: u8) -> bool {
    match data {
        [format, sides, tracks, sectors, ..] => {
            *format == 0
                && num_sides.checked_sub(1) == Some(*sides)
                && *tracks == num_tracks
                && *sectors == sectors_per_track
        }
        _ => false,
    }
}

/// `128 << shift`, limited to the sizes a DSK sector or CP/M block can take
fn shifted_record_size(shift: u8) -> Option<usize> {
    (shift <= 7).then(|| RECORD_SIZE << shift)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plus3_parameter_block(reserved_tracks: u8) -> Vec<u8> {
        let mut data = vec![0u8; 512];
        data[..10].copy_from_slice(&[0, 0, 40, 9, 2, reserved_tracks, 3, 2, 0x2A, 0x52]);
        data
    }

    #[test]
    fn test_parameter_block_detected() {
        let data = plus3_parameter_block(1);
        assert!(has_parameter_block(&data, 1, 40, 9));
        assert!(!has_parameter_block(&data, 2, 40, 9));
        assert!(!has_parameter_block(&data, 1, 80, 9));
        assert!(!has_parameter_block(&data, 0, 40, 9));
        assert!(!has_parameter_block(&data[..3], 1, 40, 9));
    }

    #[test]
    fn test_parameter_block_geometry() {
        let data = plus3_parameter_block(1);
        let geometry = DiskGeometry::from_parameter_block(&data, 40, 1, 9).unwrap();
        assert_eq!(geometry.block_size, 1024);
        assert_eq!(geometry.sector_size, 512);
        assert_eq!(geometry.max_dir_entries, 64);
        assert_eq!(geometry.reserved_bytes, 9 * 512);
        assert!(!geometry.ignore_first_entry);
        assert_eq!(geometry.source, GeometrySource::ParameterBlock);
    }

    #[test]
    fn test_parameter_block_without_reserved_tracks() {
        let data = plus3_parameter_block(0);
        let geometry = DiskGeometry::from_parameter_block(&data, 40, 1, 9).unwrap();
        assert_eq!(geometry.reserved_bytes, 0);
        assert!(geometry.ignore_first_entry);
    }

    #[test]
    fn test_parameter_block_large_blocks() {
        let mut data = plus3_parameter_block(1);
        data[6] = 4;
        data[7] = 4;
        let geometry = DiskGeometry::from_parameter_block(&data, 40, 1, 9).unwrap();
        assert_eq!(geometry.block_size, 2048);
        assert_eq!(geometry.max_dir_entries, 256);
        assert_eq!(geometry.extent_mask(), 1);
    }

    #[test]
    fn test_parameter_block_rejects_small_blocks() {
        let mut data = plus3_parameter_block(1);
        data[6] = 2;
        assert!(DiskGeometry::from_parameter_block(&data, 40, 1, 9).is_err());
        data[6] = 40;
        assert!(DiskGeometry::from_parameter_block(&data, 40, 1, 9).is_err());
    }

    #[test]
    fn test_heuristic_cases() {
        assert_eq!(HeuristicFormat::from_sector_id(0x41), HeuristicFormat::System);
        assert_eq!(HeuristicFormat::from_sector_id(0xC1), HeuristicFormat::Data);
        assert_eq!(HeuristicFormat::from_sector_id(0x01), HeuristicFormat::Ibm);
        assert_eq!(HeuristicFormat::from_sector_id(0x81), HeuristicFormat::Ibm);
    }

    #[test]
    fn test_heuristic_reserved_bytes() {
        let system = DiskGeometry::from_sector_id(0x41, 40, 1, 9);
        assert_eq!(system.reserved_bytes, 2 * 9 * 512);

        let data = DiskGeometry::from_sector_id(0xC1, 40, 1, 9);
        assert_eq!(data.reserved_bytes, 0);
        assert!(!data.ignore_first_entry);
        assert_eq!(data.block_size, 1024);
        assert_eq!(data.max_dir_entries, 64);

        let ibm = DiskGeometry::from_sector_id(0x01, 80, 2, 9);
        assert_eq!(ibm.reserved_bytes, 2 * 9 * 512);
        assert_eq!(ibm.source, GeometrySource::Heuristic(HeuristicFormat::Ibm));
    }

    #[test]
    fn test_block_offset() {
        let geometry = DiskGeometry::from_sector_id(0x41, 40, 1, 9);
        assert_eq!(geometry.block_offset(0), 9216);
        assert_eq!(geometry.block_offset(2), 9216 + 2048);
        assert_eq!(geometry.extent_mask(), 0);
        assert_eq!(geometry.directory_bytes(), 2048);
    }
}
