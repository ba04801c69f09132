/*!
 * Physical Frame Resolution
 * Virtual-to-physical translation behind a trait seam
 */

use super::types::{ZoneError, ZoneResult};
use crate::core::geometry::CacheGeometry;
use crate::core::types::FrameNumber;
use log::debug;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

/// Pagemap entry layout: bits 0..54 hold the PFN, bit 63 is "present"
const PAGEMAP_PFN_MASK: u64 = (1u64 << 55) - 1;
const PAGEMAP_PRESENT: u64 = 1u64 << 63;

/// Resolves the physical frame number of each huge page in a mapped region
///
/// One query per huge page: the caller relies on huge pages being
/// physically contiguous and aligned, so the frame of the first byte plus
/// the intra-huge-page offset locates any byte physically. A zero entry
/// means the kernel reported the page as not present.
pub trait FrameResolver {
    fn resolve(
        &self,
        base: *const u8,
        geometry: &CacheGeometry,
        hugepages: usize,
    ) -> ZoneResult<Vec<FrameNumber>>;
}

/// Production resolver backed by `/proc/self/pagemap`
///
/// Each virtual page has an 8-byte entry at index `vaddr >> page_shift`.
/// Reading PFNs requires root (or CAP_SYS_ADMIN) on kernels ≥ 4.0;
/// unprivileged reads yield zeroed PFN bits.
#[derive(Debug, Default)]
pub struct PagemapResolver;

impl PagemapResolver {
    pub fn new() -> Self {
        Self
    }
}

impl FrameResolver for PagemapResolver {
    fn resolve(
        &self,
        base: *const u8,
        geometry: &CacheGeometry,
        hugepages: usize,
    ) -> ZoneResult<Vec<FrameNumber>> {
        let mut pagemap = File::open("/proc/self/pagemap")
            .map_err(|source| ZoneError::FrameQuery { index: 0, source })?;

        let mut frames = Vec::with_capacity(hugepages);
        for index in 0..hugepages {
            let vaddr = base as u64 + (index * geometry.hugepage_size) as u64;
            let entry_offset = (vaddr >> geometry.page_shift()) * 8;
            pagemap
                .seek(SeekFrom::Start(entry_offset))
                .map_err(|source| ZoneError::FrameQuery { index, source })?;

            let mut entry = [0u8; 8];
            pagemap
                .read_exact(&mut entry)
                .map_err(|source| ZoneError::FrameQuery { index, source })?;

            let raw = u64::from_le_bytes(entry);
            let frame = if raw & PAGEMAP_PRESENT != 0 {
                raw & PAGEMAP_PFN_MASK
            } else {
                0
            };
            debug!(
                "huge page {}: vaddr {:#x} pfn {:#x}",
                index, vaddr, frame
            );
            frames.push(frame);
        }
        Ok(frames)
    }
}

/// Deterministic resolver for tests and unprivileged environments
///
/// Synthesizes a physically contiguous run of huge pages starting at
/// `base_frame`, each huge-page aligned in the synthetic physical space.
#[derive(Debug, Clone, Copy)]
pub struct FixedStrideResolver {
    base_frame: FrameNumber,
}

impl FixedStrideResolver {
    pub fn new(base_frame: FrameNumber) -> Self {
        Self { base_frame }
    }
}

impl Default for FixedStrideResolver {
    fn default() -> Self {
        // Arbitrary huge-page-aligned physical origin
        Self::new(0x10000)
    }
}

impl FrameResolver for FixedStrideResolver {
    fn resolve(
        &self,
        _base: *const u8,
        geometry: &CacheGeometry,
        hugepages: usize,
    ) -> ZoneResult<Vec<FrameNumber>> {
        let stride = geometry.pages_per_hugepage() as FrameNumber;
        Ok((0..hugepages as FrameNumber)
            .map(|i| self.base_frame + i * stride)
            .collect())
    }
}
