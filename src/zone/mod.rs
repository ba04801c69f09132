/*!
 * Zone Module
 * Huge-page memory zones and physical frame resolution
 */

pub mod resolver;
pub mod types;
#[allow(clippy::module_inception)]
mod zone;

pub use resolver::{FixedStrideResolver, FrameResolver, PagemapResolver};
pub use types::{ZoneError, ZoneResult};
pub use zone::MemoryZone;
