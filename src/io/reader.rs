/// DSK file reader
///
/// Flattens a Standard or Extended DSK container into the logical block
/// device image seen by CP/M: sectors in ascending logical order within each
/// track, tracks in (track, side) order.

use crate::error::{try_grow, DskError, Result};
use crate::format::constants::*;
use crate::format::{detect_format, ContainerFormat, FormatSpec};
use crate::image::DiskImage;
use std::fs;
use std::path::Path;

/// Read a DSK file from disk
pub fn read_dsk<P: AsRef<Path>>(path: P) -> Result<DiskImage> {
    let path = path.as_ref();
    let container = fs::read(path)?;
    let mut image = decode(&container)?;
    image.filename = Some(path.display().to_string());
    Ok(image)
}

/// Decode an in-memory DSK container
pub fn decode(container: &[u8]) -> Result<DiskImage> {
    if container.len() < DISK_INFO_BLOCK_SIZE {
        return Err(DskError::invalid_format(format!(
            "Container is {} bytes, shorter than the disk info block",
            container.len()
        )));
    }
    let disk_info = &container[..DISK_INFO_BLOCK_SIZE];

    let format = detect_format(disk_info).ok_or_else(|| {
        DskError::invalid_format(
            "Unable to identify disk image type. Must be CPC DSK type (normal or extended)",
        )
    })?;

    let layout = TrackLayout::from_disk_info(format, disk_info)?;
    let (data, spec) = decode_tracks(container, &layout)?;

    Ok(DiskImage {
        format,
        spec,
        data,
        filename: None,
    })
}

/// Where each logical track lives in the container
#[derive(Debug)]
struct TrackLayout {
    num_tracks: u8,
    num_sides: u8,
    /// Size in bytes of each logical track block, indexed by `track * sides + side`
    sizes: Vec<usize>,
}

impl TrackLayout {
    fn from_disk_info(format: ContainerFormat, disk_info: &[u8]) -> Result<Self> {
        let num_tracks = disk_info[DISK_INFO_TRACK_COUNT_OFFSET];
        let num_sides = disk_info[DISK_INFO_SIDE_COUNT_OFFSET];
        let logical_tracks = num_tracks as usize * num_sides as usize;

        let sizes = match format {
            ContainerFormat::Standard => {
                let track_size = u16::from_le_bytes([
                    disk_info[DISK_INFO_TRACK_SIZE_OFFSET],
                    disk_info[DISK_INFO_TRACK_SIZE_OFFSET + 1],
                ]) as usize;
                vec![track_size; logical_tracks]
            }
            ContainerFormat::Extended => {
                if logical_tracks > MAX_EXT_TRACKS {
                    return Err(DskError::invalid_format(format!(
                        "{} tracks × {} sides exceeds the {} entry track size table",
                        num_tracks, num_sides, MAX_EXT_TRACKS
                    )));
                }
                // Extended format has per-track sizes (in 256-byte units)
                disk_info[DISK_INFO_EXT_TRACK_SIZE_OFFSET..][..logical_tracks]
                    .iter()
                    .map(|&units| units as usize * EXT_TRACK_SIZE_UNIT)
                    .collect()
            }
        };

        Ok(Self {
            num_tracks,
            num_sides,
            sizes,
        })
    }
}

/// One track block split into its sector info list and its data area
struct TrackBlock<'a> {
    track: u8,
    side: u8,
    data: &'a [u8],
    sector_count: u8,
    sector_size: usize,
}

impl<'a> TrackBlock<'a> {
    fn parse(data: &'a [u8], track: u8, side: u8) -> Result<Self> {
        if data.len() < TRACK_INFO_BLOCK_SIZE {
            return Err(DskError::ShortRead {
                track,
                side,
                expected: TRACK_INFO_BLOCK_SIZE,
                available: data.len(),
            });
        }

        let size_code = data[TRACK_INFO_SECTOR_SIZE_OFFSET];
        let sector_size = fdc_size_to_bytes(size_code).ok_or_else(|| {
            DskError::invalid_format(format!(
                "Track {}:{} has unsupported sector size code {}",
                track, side, size_code
            ))
        })?;
        let sector_count = data[TRACK_INFO_SECTOR_COUNT_OFFSET];

        let list_end = TRACK_INFO_SECTOR_LIST_OFFSET + sector_count as usize * SECTOR_INFO_SIZE;
        if list_end > TRACK_INFO_BLOCK_SIZE {
            return Err(DskError::invalid_format(format!(
                "Track {}:{} lists {} sectors, more than the track info block holds",
                track, side, sector_count
            )));
        }

        Ok(Self {
            track,
            side,
            data,
            sector_count,
            sector_size,
        })
    }

    /// Raw ID byte of the sector in physical slot `slot`
    fn sector_id(&self, slot: usize) -> u8 {
        self.data[TRACK_INFO_SECTOR_LIST_OFFSET + slot * SECTOR_INFO_SIZE + SECTOR_INFO_ID_OFFSET]
    }

    /// Physical slot holding logical sector `logical` (1-based)
    fn find_slot(&self, logical: u8) -> Result<usize> {
        (0..self.sector_count as usize)
            .find(|&slot| self.sector_id(slot) & SECTOR_ID_MASK == logical)
            .ok_or(DskError::MissingSector {
                track: self.track,
                side: self.side,
                sector: logical,
            })
    }

    /// Sector data stored in physical slot `slot`
    fn sector_data(&self, slot: usize) -> Result<&'a [u8]> {
        let start = TRACK_INFO_BLOCK_SIZE + slot * self.sector_size;
        let end = start + self.sector_size;
        self.data.get(start..end).ok_or(DskError::ShortRead {
            track: self.track,
            side: self.side,
            expected: end,
            available: self.data.len(),
        })
    }

    fn logical_bytes(&self) -> usize {
        self.sector_count as usize * self.sector_size
    }
}

/// Copy every formatted sector into one buffer, in logical order
fn decode_tracks(container: &[u8], layout: &TrackLayout) -> Result<(Vec<u8>, FormatSpec)> {
    let mut data: Vec<u8> = Vec::new();
    let mut spec = FormatSpec::new(layout.num_sides, layout.num_tracks, 0, 0);
    let mut first_track_seen = false;
    let mut location = DISK_INFO_BLOCK_SIZE;

    for track in 0..layout.num_tracks {
        for side in 0..layout.num_sides {
            let logical_track = track as usize * layout.num_sides as usize + side as usize;
            let track_size = layout.sizes[logical_track];
            let track_start = location;
            location += track_size;

            if track_size == 0 {
                log::debug!("Track {}:{} is unformatted, skipping", track, side);
                continue;
            }

            let track_data = container
                .get(track_start..track_start + track_size)
                .ok_or(DskError::ShortRead {
                    track,
                    side,
                    expected: track_size,
                    available: container.len().saturating_sub(track_start),
                })?;
            let block = TrackBlock::parse(track_data, track, side)?;

            log::debug!(
                "Track {}:{}: {} sectors × {} bytes",
                track,
                side,
                block.sector_count,
                block.sector_size
            );

            if !first_track_seen {
                spec.sectors_per_track = block.sector_count;
                spec.sector_size = block.sector_size;
                first_track_seen = true;
            } else if block.sector_count != spec.sectors_per_track
                || block.sector_size != spec.sector_size
            {
                log::warn!(
                    "heterogeneous layout on track {}:{} ({} × {} bytes)",
                    track,
                    side,
                    block.sector_count,
                    block.sector_size
                );
            }

            try_grow(&mut data, block.logical_bytes())?;

            for logical in 1..=block.sector_count {
                let slot = block.find_slot(logical)?;
                log::trace!("sector {}:{}:{} in slot {}", track, side, logical, slot);
                data.extend_from_slice(block.sector_data(slot)?);

                if track == 0 && side == 0 && logical == 1 {
                    spec.first_sector_id = block.sector_id(slot);
                }
            }
        }
    }

    Ok((data, spec))
}
