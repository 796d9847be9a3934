//! Synthetic DSK containers for tests

#![allow(dead_code)]

/// Size of a DSK info or track info block
pub const INFO_BLOCK: usize = 256;

/// Builds DSK containers around a logical image
///
/// Sectors are stored in CPC interleave order (1,6,2,7,...) so decoding has
/// to sort them by ID.
#[derive(Debug, Clone)]
pub struct DskBuilder {
    pub tracks: u8,
    pub sides: u8,
    pub sectors: u8,
    pub size_code: u8,
    /// Tag added to logical sector numbers (0xC0, 0x40, 0x00)
    pub id_base: u8,
    /// Logical image, tracks in (track, side) order
    pub image: Vec<u8>,
    /// Logical tracks left unformatted in extended containers
    pub absent: Vec<usize>,
}

impl DskBuilder {
    pub fn new(tracks: u8, sides: u8, sectors: u8, size_code: u8, id_base: u8) -> Self {
        let mut builder = Self {
            tracks,
            sides,
            sectors,
            size_code,
            id_base,
            image: Vec::new(),
            absent: Vec::new(),
        };
        builder.image = vec![0xE5; builder.logical_tracks() * builder.track_bytes()];
        builder
    }

    /// 40 track single sided Amstrad data disk (IDs 0xC1-0xC9)
    pub fn amstrad_data() -> Self {
        Self::new(40, 1, 9, 2, 0xC0)
    }

    /// 40 track single sided Amstrad system disk (IDs 0x41-0x49)
    pub fn amstrad_system() -> Self {
        Self::new(40, 1, 9, 2, 0x40)
    }

    /// 40 track single sided +3 disk (IDs 0x01-0x09)
    pub fn plus3() -> Self {
        Self::new(40, 1, 9, 2, 0x00)
    }

    pub fn sector_size(&self) -> usize {
        128 << self.size_code
    }

    pub fn track_bytes(&self) -> usize {
        self.sectors as usize * self.sector_size()
    }

    pub fn logical_tracks(&self) -> usize {
        self.tracks as usize * self.sides as usize
    }

    /// Logical sector stored in each physical slot
    pub fn interleave(&self) -> Vec<u8> {
        let n = self.sectors as usize;
        let half = n.div_ceil(2);
        (0..n)
            .map(|slot| {
                let logical = if slot % 2 == 0 { slot / 2 } else { half + slot / 2 };
                logical as u8 + 1
            })
            .collect()
    }

    /// Track block (info + data) for logical track `index`
    pub fn track_block(&self, index: usize) -> Vec<u8> {
        let size = self.sector_size();
        let mut block = vec![0u8; INFO_BLOCK + self.track_bytes()];
        block[..12].copy_from_slice(b"Track-Info\r\n");
        block[0x10] = (index / self.sides as usize) as u8;
        block[0x11] = (index % self.sides as usize) as u8;
        block[0x14] = self.size_code;
        block[0x15] = self.sectors;
        block[0x16] = 0x4E;
        block[0x17] = 0xE5;

        let track_data = &self.image[index * self.track_bytes()..(index + 1) * self.track_bytes()];
        for (slot, logical) in self.interleave().into_iter().enumerate() {
            let info = 0x18 + slot * 8;
            block[info] = block[0x10];
            block[info + 1] = block[0x11];
            block[info + 2] = self.id_base | logical;
            block[info + 3] = self.size_code;

            let src = (logical as usize - 1) * size;
            let dst = INFO_BLOCK + slot * size;
            block[dst..dst + size].copy_from_slice(&track_data[src..src + size]);
        }
        block
    }

    fn disk_info(&self, magic: &[u8]) -> Vec<u8> {
        let mut info = vec![0u8; INFO_BLOCK];
        info[..magic.len()].copy_from_slice(magic);
        info[0x22..0x30].copy_from_slice(b"cpmdsk tests\0\0");
        info[0x30] = self.tracks;
        info[0x31] = self.sides;
        info
    }

    pub fn standard(&self) -> Vec<u8> {
        let mut container = self.disk_info(b"MV - CPCEMU Disk-File\r\nDisk-Info\r\n");
        let track_size = (INFO_BLOCK + self.track_bytes()) as u16;
        container[0x32..0x34].copy_from_slice(&track_size.to_le_bytes());
        for index in 0..self.logical_tracks() {
            container.extend_from_slice(&self.track_block(index));
        }
        container
    }

    pub fn extended(&self) -> Vec<u8> {
        let mut container = self.disk_info(b"EXTENDED CPC DSK File\r\nDisk-Info\r\n");
        for index in 0..self.logical_tracks() {
            if self.absent.contains(&index) {
                continue;
            }
            let mut block = self.track_block(index);
            // Extended track sizes are stored in 256-byte units
            block.resize(block.len().div_ceil(256) * 256, 0);
            container[0x34 + index] = (block.len() / 256) as u8;
            container.extend_from_slice(&block);
        }
        container
    }

    /// Logical image as decoding an extended container should produce it
    pub fn expected_extended_image(&self) -> Vec<u8> {
        (0..self.logical_tracks())
            .filter(|index| !self.absent.contains(index))
            .flat_map(|index| {
                self.image[index * self.track_bytes()..(index + 1) * self.track_bytes()].to_vec()
            })
            .collect()
    }
}

/// A 32-byte CP/M directory entry
pub fn dir_entry(user: u8, name: &[u8; 11], ex: u8, s2: u8, rc: u8, blocks: &[u8]) -> [u8; 32] {
    let mut entry = [0u8; 32];
    entry[0] = user;
    entry[1..12].copy_from_slice(name);
    entry[12] = ex;
    entry[14] = s2;
    entry[15] = rc;
    entry[16..16 + blocks.len()].copy_from_slice(blocks);
    entry
}

/// Lays out files on a CP/M volume inside a logical image
pub struct CpmLayout<'a> {
    pub image: &'a mut Vec<u8>,
    pub reserved: usize,
    pub block_size: usize,
    pub dir_entries: usize,
    next_slot: usize,
}

impl<'a> CpmLayout<'a> {
    pub fn new(image: &'a mut Vec<u8>, reserved: usize, block_size: usize, dir_entries: usize) -> Self {
        let start = reserved;
        image[start..start + dir_entries * 32].fill(0xE5);
        Self {
            image,
            reserved,
            block_size,
            dir_entries,
            next_slot: 0,
        }
    }

    /// Skip a directory slot, leaving it deleted
    pub fn skip_slot(&mut self) {
        self.next_slot += 1;
    }

    /// Put a raw entry in the next free slot
    pub fn push_entry(&mut self, entry: [u8; 32]) {
        assert!(self.next_slot < self.dir_entries);
        let at = self.reserved + self.next_slot * 32;
        self.image[at..at + 32].copy_from_slice(&entry);
        self.next_slot += 1;
    }

    /// Fill `block` with `data` (padded with 0x1A)
    pub fn write_block(&mut self, block: u8, data: &[u8]) {
        assert!(data.len() <= self.block_size);
        let at = self.reserved + block as usize * self.block_size;
        self.image[at..at + self.block_size].fill(0x1A);
        self.image[at..at + data.len()].copy_from_slice(data);
    }

    /// Write `data` into consecutive blocks starting at `first_block` and add
    /// entries for it, 16 blocks per entry, 1K blocks only
    pub fn add_file(&mut self, name: &[u8; 11], first_block: u8, data: &[u8]) -> Vec<u8> {
        assert_eq!(self.block_size, 1024);
        let blocks: Vec<u8> = (0..data.len().div_ceil(1024))
            .map(|i| first_block + i as u8)
            .collect();
        for (i, chunk) in data.chunks(1024).enumerate() {
            self.write_block(blocks[i], chunk);
        }

        let records = data.len().div_ceil(128);
        for (ex, extent_blocks) in blocks.chunks(16).enumerate() {
            let extent_records = (records - ex * 128).min(128);
            self.push_entry(dir_entry(0, name, ex as u8, 0, extent_records as u8, extent_blocks));
        }
        blocks
    }
}

/// Deterministic file contents
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}
