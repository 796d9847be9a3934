/// CP/M filesystem implementation

use crate::error::{try_grow, DskError, Result};
use crate::filesystem::extract;
use crate::filesystem::geometry::{DiskGeometry, DIR_ENTRY_SIZE, RECORD_SIZE};
use crate::filesystem::name::{CpmName, FULL_NAME_LEN};
use crate::filesystem::{DirEntry, FileAttributes, FileSystem, FileSystemInfo};
use crate::image::DiskImage;
use std::io::Write;

/// User byte of a deleted directory entry
pub const DELETED_MARKER: u8 = 0xE5;

/// Allocation block numbers held by one directory entry
pub const BLOCKS_PER_EXTENT: usize = 16;

/// Logical extents addressed by one value of S2
const EXTENTS_PER_S2: usize = 32;

/// One directory entry's share of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extent {
    /// Extent number, low part (EX)
    pub ex: u8,
    /// Extent number, high part (S2)
    pub s2: u8,
    /// Record count (RC)
    pub rc: u8,
    /// Allocation blocks in file order
    pub blocks: Vec<u8>,
}

impl Extent {
    /// Slot of this extent within its file
    pub fn index(&self) -> usize {
        Self::slot(self.ex, self.s2)
    }

    /// Slot for a given EX/S2 pair
    pub fn slot(ex: u8, s2: u8) -> usize {
        s2 as usize * EXTENTS_PER_S2 + (ex & 0x1F) as usize
    }

    /// 128-byte records covered by this entry
    ///
    /// When blocks are larger than 1K one entry spans several logical extents;
    /// the low bits of EX (under the extent mask) count the full ones and RC
    /// the records in the last.
    pub fn records(&self, extent_mask: u8) -> usize {
        (self.rc & 0x7F) as usize
            + 128 * ((self.ex & extent_mask) as usize + (self.rc >> 7) as usize)
    }
}

/// CP/M directory entry (32 bytes)
#[derive(Debug, Clone)]
struct CpmDirEntry {
    user: u8,
    name: CpmName,
    extent: Extent,
}

impl CpmDirEntry {
    /// Parse a directory entry from 32 bytes
    fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < DIR_ENTRY_SIZE {
            return None;
        }

        let user = data[0];

        // Skip deleted entries (0xE5)
        if user == DELETED_MARKER {
            return None;
        }

        let mut name = [0u8; FULL_NAME_LEN];
        name.copy_from_slice(&data[1..12]);

        // A zero block number ends the list
        let blocks = data[16..32]
            .iter()
            .copied()
            .take_while(|&block| block != 0)
            .collect();

        Some(Self {
            user,
            name: CpmName::from_raw(name),
            extent: Extent {
                ex: data[12],
                s2: data[14],
                rc: data[15],
                blocks,
            },
        })
    }
}

/// A file assembled from one or more directory entries
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Name as stored in the first entry seen
    pub name: CpmName,
    /// User area of the first entry seen
    pub user: u8,
    /// File length in bytes
    pub nbytes: usize,
    /// Extents indexed by slot; gaps are `None`
    pub extents: Vec<Option<Extent>>,
}

impl FileEntry {
    fn new(name: CpmName, user: u8) -> Self {
        Self {
            name,
            user,
            nbytes: 0,
            extents: Vec::new(),
        }
    }

    /// Store `extent` at its slot, growing the table as needed
    fn insert_extent(&mut self, extent: Extent) -> Result<()> {
        let slot = extent.index();
        if slot >= self.extents.len() {
            let additional = slot + 1 - self.extents.len();
            try_grow(&mut self.extents, additional)?;
            self.extents.resize(slot + 1, None);
        }
        if self.extents[slot].is_some() {
            log::warn!("{}: extent {} appears twice, keeping the later entry", self.name, slot);
        }
        self.extents[slot] = Some(extent);
        Ok(())
    }

    /// Present extents in file order
    pub fn extents(&self) -> impl Iterator<Item = &Extent> {
        self.extents.iter().flatten()
    }

    /// Allocation blocks in file order
    pub fn blocks(&self) -> impl Iterator<Item = u8> + '_ {
        self.extents().flat_map(|extent| extent.blocks.iter().copied())
    }

    /// Number of allocation blocks listed across all extents
    pub fn block_count(&self) -> usize {
        self.extents().map(|extent| extent.blocks.len()).sum()
    }

    fn finalize(&mut self, extent_mask: u8) {
        self.nbytes = self
            .extents()
            .map(|extent| extent.records(extent_mask) * RECORD_SIZE)
            .sum();
    }

    /// Attributes taken from the stored name
    pub fn attributes(&self) -> FileAttributes {
        FileAttributes {
            read_only: self.name.is_read_only(),
            system: self.name.is_system(),
            archive: self.name.is_archive(),
        }
    }
}

/// Rebuild the file table from the directory area of `image`
///
/// Files appear in the order their first entry is met. Extents within a file
/// are ordered by slot, whatever their order in the directory.
pub fn reconstruct_directory(image: &DiskImage, geometry: &DiskGeometry) -> Result<Vec<FileEntry>> {
    let directory = image
        .read_bytes(geometry.reserved_bytes, geometry.directory_bytes())
        .ok_or_else(|| {
            DskError::geometry(format!(
                "directory of {} entries at offset {} does not fit in a {} byte image",
                geometry.max_dir_entries,
                geometry.reserved_bytes,
                image.len()
            ))
        })?;

    let skip = usize::from(geometry.ignore_first_entry);
    let mut files: Vec<FileEntry> = Vec::new();

    for (slot, raw) in directory.chunks_exact(DIR_ENTRY_SIZE).enumerate().skip(skip) {
        let Some(entry) = CpmDirEntry::parse(raw) else {
            continue;
        };

        log::trace!(
            "slot {}: {} user {} ex {} s2 {} rc {} blocks {:?}",
            slot,
            entry.name,
            entry.user,
            entry.extent.ex,
            entry.extent.s2,
            entry.extent.rc,
            entry.extent.blocks
        );

        let index = match files.iter().position(|file| file.name.matches(&entry.name)) {
            Some(index) => index,
            None => {
                try_grow(&mut files, 1)?;
                files.push(FileEntry::new(entry.name, entry.user));
                files.len() - 1
            }
        };
        files[index].insert_extent(entry.extent)?;
    }

    let extent_mask = geometry.extent_mask();
    for file in &mut files {
        file.finalize(extent_mask);
        let allocated = file.block_count() * geometry.block_size;
        if file.nbytes > allocated {
            log::warn!(
                "{}: {} bytes recorded but only {} bytes allocated",
                file.name,
                file.nbytes,
                allocated
            );
        }
    }

    log::debug!("directory holds {} files", files.len());
    Ok(files)
}

/// CP/M filesystem mounted over a decoded image
pub struct CpmFileSystem<'a> {
    image: &'a DiskImage,
    geometry: DiskGeometry,
    files: Vec<FileEntry>,
}

impl<'a> CpmFileSystem<'a> {
    /// Mount with an explicit geometry
    pub fn new(image: &'a DiskImage, geometry: DiskGeometry) -> Result<Self> {
        let files = reconstruct_directory(image, &geometry)?;

        Ok(Self {
            image,
            geometry,
            files,
        })
    }

    /// Mount, detecting the geometry from the image
    pub fn from_image(image: &'a DiskImage) -> Result<Self> {
        let geometry = DiskGeometry::detect(image)?;
        Self::new(image, geometry)
    }

    /// Image the filesystem was mounted from
    pub fn image(&self) -> &'a DiskImage {
        self.image
    }

    /// Geometry in use
    pub fn geometry(&self) -> &DiskGeometry {
        &self.geometry
    }

    /// File table in directory order
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Look up a file by host name
    pub fn find(&self, name: &str) -> Result<&FileEntry> {
        let wanted = CpmName::from_host(name)?;
        self.files
            .iter()
            .find(|file| file.name.matches(&wanted))
            .ok_or_else(|| DskError::FileNotFound(name.to_uppercase()))
    }

    /// Stream a file to `sink`, returning the number of bytes written
    pub fn extract<W: Write>(&self, name: &str, sink: &mut W) -> Result<usize> {
        let entry = self.find(name)?;
        extract::write_file(self.image, &self.geometry, entry, sink)
    }
}

impl FileSystem for CpmFileSystem<'_> {
    fn read_dir(&self) -> Vec<DirEntry> {
        self.files
            .iter()
            .map(|file| DirEntry {
                name: file.name.to_host(),
                user: file.user,
                size: file.nbytes,
                attributes: file.attributes(),
            })
            .collect()
    }

    fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let entry = self.find(name)?;
        let mut data = Vec::new();
        try_grow(&mut data, entry.nbytes)?;
        extract::write_file(self.image, &self.geometry, entry, &mut data)?;
        Ok(data)
    }

    fn info(&self) -> FileSystemInfo {
        let total_blocks = self.geometry.total_blocks(self.image.len());
        let used_blocks = self.files.iter().map(FileEntry::block_count).sum();
        let directory_blocks = self.geometry.directory_bytes().div_ceil(self.geometry.block_size);

        FileSystemInfo {
            fs_type: "CP/M".to_string(),
            block_size: self.geometry.block_size,
            total_blocks,
            used_blocks,
            directory_blocks,
            max_dir_entries: self.geometry.max_dir_entries,
            reserved_bytes: self.geometry.reserved_bytes,
        }
    }
}
