/*!
 * Memory Zone
 * Huge-page-backed shared mapping with a one-time physical frame table
 */

use super::resolver::FrameResolver;
use super::types::{ZoneError, ZoneResult};
use crate::core::geometry::CacheGeometry;
use crate::core::types::{Color, FrameNumber, Size, ZoneOffset};
use log::info;
use nix::sys::mman::{mmap, munmap, MapFlags, ProtFlags};
use std::ffi::c_void;
use std::fs::{self, File, OpenOptions};
use std::num::NonZeroUsize;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Shared RW mapping, unmapped on drop
struct Mapping {
    ptr: NonNull<c_void>,
    len: Size,
}

impl Drop for Mapping {
    fn drop(&mut self) {
        // Teardown path; nothing useful to do on munmap failure
        unsafe {
            let _ = munmap(self.ptr, self.len);
        }
    }
}

/// Deletes the backing file when dropped
struct UnlinkGuard {
    path: PathBuf,
}

impl Drop for UnlinkGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// A huge-page-aligned, file-backed, shared memory region
///
/// Owns the backing file, the mapping, and a table of one physical frame
/// number per huge page, resolved once at creation. Frame resolution at
/// huge-page granularity is exact because huge pages are physically
/// contiguous and aligned: bits below the huge-page size are identical
/// between virtual and physical addressing.
///
/// Field order is teardown order: frame table, unmap, close, unlink.
pub struct MemoryZone {
    frames: Vec<FrameNumber>,
    map: Mapping,
    #[allow(dead_code)] // held open for the zone's lifetime, closed after unmap
    file: File,
    unlink: UnlinkGuard,
    size: Size,
    geometry: CacheGeometry,
}

impl MemoryZone {
    /// Create a zone of at least `min_size` bytes backed by `path`
    ///
    /// Rounds up to a huge-page multiple, maps the file shared RW, touches
    /// one byte per huge page to force physical backing, then resolves the
    /// frame table. Any failure releases everything acquired so far, in
    /// reverse acquisition order, before the error returns.
    pub fn create(
        path: &Path,
        min_size: Size,
        geometry: CacheGeometry,
        resolver: &dyn FrameResolver,
    ) -> ZoneResult<Self> {
        if min_size == 0 {
            return Err(ZoneError::EmptyZone);
        }
        let size = geometry.round_to_hugepage(min_size);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| ZoneError::Backing {
                path: path.to_path_buf(),
                source,
            })?;
        let unlink = UnlinkGuard {
            path: path.to_path_buf(),
        };

        file.set_len(size as u64).map_err(|source| ZoneError::Truncate {
            path: path.to_path_buf(),
            size,
            source,
        })?;

        let len = NonZeroUsize::new(size).ok_or(ZoneError::EmptyZone)?;
        let ptr = unsafe {
            mmap(
                None,
                len,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                file.as_fd(),
                0,
            )
        }
        .map_err(|source| ZoneError::Map {
            path: path.to_path_buf(),
            size,
            source,
        })?;
        let map = Mapping { ptr, len: size };

        let hugepages = size / geometry.hugepage_size;
        let base = map.ptr.as_ptr() as *mut u8;
        for index in 0..hugepages {
            // one write per huge page forces physical backing before
            // the frame table is read
            unsafe {
                std::ptr::write_volatile(base.add(index * geometry.hugepage_size), 0);
            }
        }

        let frames = resolver.resolve(base as *const u8, &geometry, hugepages)?;
        debug_assert_eq!(frames.len(), hugepages);

        info!(
            "memory zone ready: {} bytes, {} huge pages, backing {}",
            size,
            hugepages,
            path.display()
        );

        Ok(Self {
            frames,
            map,
            file,
            unlink,
            size,
            geometry,
        })
    }

    /// Zone length in bytes (a huge-page multiple)
    #[inline]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Geometry the zone was created with
    #[inline]
    pub fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    /// Number of huge pages in the zone
    #[inline]
    pub fn hugepages(&self) -> usize {
        self.frames.len()
    }

    /// Path of the backing file
    #[inline]
    pub fn backing_path(&self) -> &Path {
        &self.unlink.path
    }

    fn check(&self, offset: ZoneOffset, len: Size) -> ZoneResult<()> {
        if len == 0 || offset >= self.size || len > self.size - offset {
            return Err(ZoneError::OutOfBounds {
                offset,
                len,
                size: self.size,
            });
        }
        Ok(())
    }

    /// Cache color of the byte at `offset`
    ///
    /// Composes the huge page's frame number with the intra-huge-page
    /// offset into a physical address, then extracts the color bits above
    /// the page offset. A zero (not-present) frame entry degrades to the
    /// virtual offset alone, which preserves coloring for aligned zones.
    pub fn color_of(&self, offset: ZoneOffset) -> ZoneResult<Color> {
        self.check(offset, 1)?;
        let hugepage_size = self.geometry.hugepage_size;
        let frame = self.frames[offset / hugepage_size];
        let phys = (frame << self.geometry.page_shift()) | (offset % hugepage_size) as u64;
        Ok((phys >> self.geometry.page_shift()) as usize % self.geometry.color_max())
    }

    /// Bounds-checked read access to `len` bytes at `offset`
    pub fn slice(&self, offset: ZoneOffset, len: Size) -> ZoneResult<&[u8]> {
        self.check(offset, len)?;
        let base = self.map.ptr.as_ptr() as *const u8;
        Ok(unsafe { std::slice::from_raw_parts(base.add(offset), len) })
    }

    /// Bounds-checked write access to `len` bytes at `offset`
    pub fn slice_mut(&mut self, offset: ZoneOffset, len: Size) -> ZoneResult<&mut [u8]> {
        self.check(offset, len)?;
        let base = self.map.ptr.as_ptr() as *mut u8;
        Ok(unsafe { std::slice::from_raw_parts_mut(base.add(offset), len) })
    }
}
