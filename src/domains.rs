//! Loading the domain list file.
//!
//! The file format is ASCII, one dotted name per line. It is read in one
//! go and encoded to wire labels immediately, so the probe never touches
//! the text form again after startup.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use log::*;

use dns::{DomainSet, NameError};


/// The refusal threshold for domain list files.
pub const FILE_LIMIT: u64 = 50 * 1024 * 1024;


/// Reads and encodes the domain list at `path`.
pub fn load(path: &Path) -> Result<DomainSet, DomainsError> {
    let metadata = fs::metadata(path).map_err(DomainsError::Io)?;
    if metadata.len() > FILE_LIMIT {
        return Err(DomainsError::TooBig { size: metadata.len() });
    }

    let text = fs::read(path).map_err(DomainsError::Io)?;
    if text.is_empty() {
        return Err(DomainsError::Empty);
    }

    let set = DomainSet::parse(&text).map_err(DomainsError::Name)?;
    debug!("Loaded {} domain(s) from {:?}", set.len(), path);

    Ok(set)
}


/// Something wrong with the domain list file.
#[derive(Debug)]
pub enum DomainsError {

    /// The file could not be opened or read.
    Io(io::Error),

    /// The file is larger than `FILE_LIMIT`.
    TooBig {

        /// The size the metadata reported.
        size: u64,
    },

    /// The file holds nothing at all.
    Empty,

    /// One of the names failed to encode.
    Name(NameError),
}

impl fmt::Display for DomainsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(inner)        => write!(f, "Can't read file: {}", inner),
            Self::TooBig { size }  => write!(f, "File too big ({} > {})", size, FILE_LIMIT),
            Self::Empty            => write!(f, "File is empty"),
            Self::Name(inner)      => inner.fmt(f),
        }
    }
}
