/*!
 * Pool Types
 * Configuration, errors, and statistics for the allocator pool
 */

use crate::color::ColorTableError;
use crate::core::geometry::{CacheGeometry, GeometryError};
use crate::core::types::{Size, ZoneOffset};
use crate::zone::ZoneError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Pool operation result
pub type PoolResult<T> = Result<T, PoolError>;

/// Pool errors
///
/// Setup variants are recoverable in the sense that the caller may retry
/// with a different configuration; by the time one is returned, every
/// resource acquired during construction has been released.
/// `InvariantViolation` is different in kind: it proves a prior
/// corruption of the pool's address-to-group invariant and is not a
/// condition to recover from.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("object count must be positive")]
    ZeroObjectCount,

    #[error("object size must be positive")]
    ZeroObjectSize,

    #[error("overcommit factor must be at least 1")]
    ZeroOvercommit,

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Table(#[from] ColorTableError),

    #[error(transparent)]
    Zone(#[from] ZoneError),

    #[error("invariant violation: offset {offset:#x} does not resolve to a slot of this pool")]
    InvariantViolation { offset: ZoneOffset },
}

/// Pool construction parameters
///
/// `object_count` and `object_size` describe the nominal capacity; the
/// zone is sized `object_count * rounded_size * overcommit_factor` to
/// absorb the per-region remainder the carving step discards.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub backing_path: PathBuf,
    pub object_count: usize,
    pub object_size: Size,
    pub ratios: Vec<usize>,
    pub geometry: CacheGeometry,
    pub overcommit_factor: usize,
}

impl PoolConfig {
    pub fn new(
        backing_path: impl Into<PathBuf>,
        object_count: usize,
        object_size: Size,
        ratios: Vec<usize>,
    ) -> Self {
        Self {
            backing_path: backing_path.into(),
            object_count,
            object_size,
            ratios,
            geometry: CacheGeometry::default(),
            overcommit_factor: 2,
        }
    }

    pub fn with_geometry(mut self, geometry: CacheGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn with_overcommit(mut self, factor: usize) -> Self {
        self.overcommit_factor = factor;
        self
    }
}

/// Pool statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub total_slots: usize,
    pub allocated_slots: usize,
    pub free_per_group: Vec<usize>,
    pub object_size: Size,
    pub group_count: usize,
}

impl PoolStats {
    /// Free slots across all groups
    pub fn free_slots(&self) -> usize {
        self.free_per_group.iter().sum()
    }
}
