/// I/O operations for reading DSK files

/// Reader implementation for DSK files
pub mod reader;

pub use reader::{decode, read_dsk};
