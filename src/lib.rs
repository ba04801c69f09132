/*!
 * Cache-Coloring Allocator
 * Partitions huge-page-backed memory into cache color groups so that
 * concurrently active data sets occupy disjoint last-level-cache index
 * classes
 */

pub mod color;
pub mod core;
pub mod pool;
pub mod zone;

// Re-exports
pub use crate::color::{ColorTableError, ColorWidthTable};
pub use crate::core::{CacheGeometry, GeometryError};
pub use crate::pool::{AllocatorPool, PoolConfig, PoolError, PoolResult, PoolStats};
pub use crate::zone::{FixedStrideResolver, FrameResolver, MemoryZone, PagemapResolver, ZoneError};
