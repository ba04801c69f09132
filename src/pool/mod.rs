/*!
 * Pool Module
 * The cache-coloring allocator pool
 */

#[allow(clippy::module_inception)]
mod pool;
pub mod types;

pub use pool::AllocatorPool;
pub use types::{PoolConfig, PoolError, PoolResult, PoolStats};
