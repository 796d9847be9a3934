/*!
# cpmdsk

A Rust library for reading CPC DSK disk images and the CP/M filesystem stored
inside them.

## Features

- Decode Standard and Extended DSK containers into a flat logical image,
  reordering sectors by ID and skipping unformatted tracks
- Detect CP/M geometry from an embedded disk parameter block, or from the
  first sector ID for the Amstrad System, Data and IBM formats
- Rebuild the directory, merging multi-extent files in extent order
- Extract files byte-exact to any `std::io::Write` sink or to a directory

## Quick Start

```rust,no_run
use cpmdsk::{CpmFileSystem, DiskImage, FileSystem};

let image = DiskImage::open("disk.dsk")?;
let fs = CpmFileSystem::from_image(&image)?;

for entry in fs.read_dir() {
    println!("{}: {} bytes", entry.name, entry.size);
}

let mut out: Vec<u8> = Vec::new();
fs.extract("README.TXT", &mut out)?;
# Ok::<(), cpmdsk::DskError>(())
```

## Modules

- `format`: DSK container variants and constants
- `io`: Container decoding
- `image`: The decoded logical image
- `filesystem`: CP/M geometry, directory and file extraction
- `error`: Error types and Result alias
*/

#![warn(missing_docs)]

/// Error types and Result alias
pub mod error;
/// CP/M filesystem reconstruction
pub mod filesystem;
/// DSK container formats and constants
pub mod format;
/// Decoded logical disk image
pub mod image;
/// I/O operations for reading DSK files
pub mod io;

// Re-export common types
pub use error::{DskError, Result};
pub use filesystem::{
    extract_all, extract_file, reconstruct_directory, CpmFileSystem, CpmName, DirEntry,
    DiskGeometry, Extent, Extracted, FileAttributes, FileEntry, FileSystem, FileSystemInfo,
    GeometrySource, HeuristicFormat,
};
pub use format::{detect_format, ContainerFormat, FormatSpec};
pub use image::DiskImage;
