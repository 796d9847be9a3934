/// CP/M 8.3 filenames

use crate::error::{DskError, Result};
use std::fmt;

/// Characters in the name part
pub const NAME_LEN: usize = 8;

/// Characters in the type part
pub const TYPE_LEN: usize = 3;

/// Total length of a padded CP/M name
pub const FULL_NAME_LEN: usize = NAME_LEN + TYPE_LEN;

/// Attribute bit carried in the top of each name character
pub const ATTRIBUTE_BIT: u8 = 0x80;

/// An 11-byte space-padded CP/M filename, exactly as stored in a directory entry
///
/// The high bit of each byte may carry an attribute flag; comparisons and
/// display ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpmName([u8; FULL_NAME_LEN]);

impl CpmName {
    /// Wrap the raw name bytes of a directory entry
    pub fn from_raw(raw: [u8; FULL_NAME_LEN]) -> Self {
        Self(raw)
    }

    /// Convert a host filename such as `"disc.bas"` to padded CP/M form
    pub fn from_host(name: &str) -> Result<Self> {
        let (base, ext) = match name.rsplit_once('.') {
            Some((base, ext)) => (base, ext),
            None => (name, ""),
        };

        if base.is_empty()
            || base.len() > NAME_LEN
            || ext.len() > TYPE_LEN
            || !name.is_ascii()
            || base.contains('.')
        {
            return Err(DskError::InvalidFilename(name.to_string()));
        }

        let mut raw = [b' '; FULL_NAME_LEN];
        for (dst, src) in raw[..NAME_LEN].iter_mut().zip(base.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        for (dst, src) in raw[NAME_LEN..].iter_mut().zip(ext.bytes()) {
            *dst = src.to_ascii_uppercase();
        }
        Ok(Self(raw))
    }

    /// Whether two names refer to the same file, ignoring attributes and case
    pub fn matches(&self, other: &CpmName) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a & !ATTRIBUTE_BIT).eq_ignore_ascii_case(&(b & !ATTRIBUTE_BIT)))
    }

    /// Read-only attribute (T1')
    pub fn is_read_only(&self) -> bool {
        self.0[NAME_LEN] & ATTRIBUTE_BIT != 0
    }

    /// System attribute (T2')
    pub fn is_system(&self) -> bool {
        self.0[NAME_LEN + 1] & ATTRIBUTE_BIT != 0
    }

    /// Archive attribute (T3')
    pub fn is_archive(&self) -> bool {
        self.0[NAME_LEN + 2] & ATTRIBUTE_BIT != 0
    }

    /// Host form, e.g. `DISC.BAS`; the dot is omitted when the type is blank
    pub fn to_host(&self) -> String {
        let clean = |bytes: &[u8]| -> String {
            bytes
                .iter()
                .map(|&b| (b & !ATTRIBUTE_BIT) as char)
                .filter(|&c| c != ' ')
                .collect()
        };

        let base = clean(&self.0[..NAME_LEN]);
        let ext = clean(&self.0[NAME_LEN..]);
        if ext.is_empty() {
            base
        } else {
            format!("{}.{}", base, ext)
        }
    }
}

impl fmt::Display for CpmName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_host())
    }
}
