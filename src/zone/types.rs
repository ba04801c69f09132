/*!
 * Zone Types
 * Errors for memory zone setup and access
 */

use crate::core::types::{Size, ZoneOffset};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Zone operation result
pub type ZoneResult<T> = Result<T, ZoneError>;

/// Zone errors
///
/// All variants except `OutOfBounds` are setup errors: fatal to zone
/// creation, with every partially acquired resource released before the
/// error is returned.
#[derive(Error, Debug)]
pub enum ZoneError {
    #[error("failed to open backing file {path}: {source}")]
    Backing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to size backing file {path} to {size} bytes: {source}")]
    Truncate {
        path: PathBuf,
        size: Size,
        #[source]
        source: io::Error,
    },

    #[error("failed to map {size} bytes of {path}: {source}")]
    Map {
        path: PathBuf,
        size: Size,
        #[source]
        source: nix::Error,
    },

    #[error("frame resolution for huge page {index} failed: {source}")]
    FrameQuery {
        index: usize,
        #[source]
        source: io::Error,
    },

    #[error("zone size must be positive")]
    EmptyZone,

    #[error("offset {offset:#x}+{len:#x} out of bounds for zone of {size:#x} bytes")]
    OutOfBounds {
        offset: ZoneOffset,
        len: Size,
        size: Size,
    },
}
