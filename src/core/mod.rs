/*!
 * Core Module
 * Shared types and cache geometry
 */

pub mod geometry;
pub mod types;

pub use geometry::{CacheGeometry, GeometryError};
pub use types::*;
