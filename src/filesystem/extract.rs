/// Copying files out of a CP/M image

use crate::error::{DskError, Result};
use crate::filesystem::cpm::{CpmFileSystem, FileEntry};
use crate::filesystem::geometry::DiskGeometry;
use crate::image::DiskImage;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Outcome of extracting one file in a batch
#[derive(Debug)]
pub struct Extracted {
    /// Host filename
    pub name: String,
    /// Bytes written, or why the file was skipped
    pub result: Result<usize>,
}

/// Slices of `image` holding the first `entry.nbytes` bytes of the file
///
/// The last slice is cut to the bytes remaining, and blocks past that point
/// are never touched.
fn file_chunks<'a>(
    image: &'a DiskImage,
    geometry: &DiskGeometry,
    entry: &FileEntry,
) -> Result<Vec<&'a [u8]>> {
    let mut remaining = entry.nbytes;
    let mut chunks = Vec::new();

    for block in entry.blocks() {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(geometry.block_size);
        let offset = geometry.block_offset(block);
        let chunk = image
            .read_bytes(offset, take)
            .ok_or(DskError::BlockOutOfRange { block, offset })?;
        chunks.push(chunk);
        remaining -= take;
    }

    if remaining > 0 {
        log::warn!(
            "{}: blocks run out {} bytes short of the recorded length",
            entry.name,
            remaining
        );
    }

    Ok(chunks)
}

fn write_chunks<W: Write>(chunks: &[&[u8]], name: &str, sink: &mut W) -> Result<usize> {
    let mut written = 0;
    for chunk in chunks {
        sink.write_all(chunk).map_err(|e| DskError::sink(name, e))?;
        written += chunk.len();
    }
    sink.flush().map_err(|e| DskError::sink(name, e))?;

    Ok(written)
}

/// Write the contents of `entry` to `sink`, returning the number of bytes written
///
/// Every block is located before anything is written, so a bad block number
/// leaves the sink untouched.
pub fn write_file<W: Write>(
    image: &DiskImage,
    geometry: &DiskGeometry,
    entry: &FileEntry,
    sink: &mut W,
) -> Result<usize> {
    let chunks = file_chunks(image, geometry, entry)?;
    write_chunks(&chunks, &entry.name.to_host(), sink)
}

/// Path for `name` inside `dir`
///
/// The name must be a single plain path component.
fn host_path(dir: &Path, name: &str) -> Result<PathBuf> {
    let mut components = Path::new(name).components();
    let separator = name.contains(|c| c == '/' || c == '\\');
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !separator => Ok(dir.join(name)),
        _ => Err(DskError::InvalidFilename(name.to_string())),
    }
}

/// Extract `entry` into `dir` under its uppercase host name
///
/// Names that would land outside `dir` are rejected, and nothing is created
/// when a block lies outside the image.
pub fn extract_entry(fs: &CpmFileSystem<'_>, entry: &FileEntry, dir: &Path) -> Result<usize> {
    let name = entry.name.to_host();
    let path = host_path(dir, &name)?;
    let chunks = file_chunks(fs.image(), fs.geometry(), entry)?;

    let mut file = File::create(&path).map_err(|e| DskError::sink(name.as_str(), e))?;
    let written = write_chunks(&chunks, &name, &mut file)?;

    log::debug!("extracted {} ({} bytes) to {}", name, written, path.display());
    Ok(written)
}

/// Extract the file called `name` into `dir`
///
/// Nothing is created when the name is not in the directory.
pub fn extract_file(fs: &CpmFileSystem<'_>, name: &str, dir: &Path) -> Result<usize> {
    let entry = fs.find(name)?;
    extract_entry(fs, entry, dir)
}

/// Extract every file into `dir`, carrying on past per-file failures
pub fn extract_all(fs: &CpmFileSystem<'_>, dir: &Path) -> Vec<Extracted> {
    fs.files()
        .iter()
        .map(|entry| Extracted {
            name: entry.name.to_host(),
            result: extract_entry(fs, entry, dir),
        })
        .collect()
}
