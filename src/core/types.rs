/*!
 * Core Types
 * Common types used across the allocator
 */

/// Cache color index, derived from physical-address bits above the page offset
pub type Color = usize;

/// Color group identifier
pub type GroupId = usize;

/// Byte offset into a memory zone
pub type ZoneOffset = usize;

/// Size type for memory operations
pub type Size = usize;

/// Physical frame number, as reported by the kernel's pagemap interface
pub type FrameNumber = u64;
