/*!
 * Allocator Pool
 * Color-partitioned fixed-size object allocation over a memory zone
 */

use super::types::{PoolConfig, PoolError, PoolResult, PoolStats};
use crate::color::ColorWidthTable;
use crate::core::types::{GroupId, Size, ZoneOffset};
use crate::zone::{FrameResolver, MemoryZone};
use log::{debug, info, trace, warn};

/// Cache-coloring object pool
///
/// Partitions a huge-page-backed zone into per-group color regions and
/// serves fixed-size slots from one free stack per group. Free stacks
/// hold zone offsets and are preallocated to their carve-time length, so
/// `allocate` and `free` never allocate.
///
/// Single-threaded by design; callers serialize access externally.
pub struct AllocatorPool {
    object_size: Size,
    table: ColorWidthTable,
    free: Vec<Vec<ZoneOffset>>,
    total_slots: usize,
    allocated: usize,
    zone: MemoryZone,
}

impl AllocatorPool {
    /// Build a pool from `config`, resolving physical frames via `resolver`
    ///
    /// Rounds the object size up to a cache line, builds the color width
    /// table, creates a zone of `object_count * rounded * overcommit`
    /// bytes, then walks it huge page by huge page carving slots into the
    /// group free stacks. Within a huge page the first page is color 0,
    /// so group regions repeat in ascending group order, `widths[g]`
    /// pages each, one full cycle per `color_max` pages. Region bytes too
    /// small for a whole object are discarded.
    ///
    /// On any failure everything acquired so far is released, in reverse
    /// order, before the error returns.
    pub fn create(config: &PoolConfig, resolver: &dyn FrameResolver) -> PoolResult<Self> {
        if config.object_count == 0 {
            return Err(PoolError::ZeroObjectCount);
        }
        if config.object_size == 0 {
            return Err(PoolError::ZeroObjectSize);
        }
        if config.overcommit_factor == 0 {
            return Err(PoolError::ZeroOvercommit);
        }
        let geometry = config.geometry;
        geometry.validate()?;

        let object_size = geometry.round_to_cache_line(config.object_size);
        let table = ColorWidthTable::build(&config.ratios, geometry.color_max())?;

        let zone_size = config.object_count * object_size * config.overcommit_factor;
        let zone = MemoryZone::create(&config.backing_path, zone_size, geometry, resolver)?;

        // Carve counts are fully determined by the geometry, so the free
        // stacks can be preallocated to their final lengths.
        let cycles = zone.hugepages() * (geometry.pages_per_hugepage() / geometry.color_max());
        let mut free: Vec<Vec<ZoneOffset>> = table
            .iter()
            .map(|(_, width)| Vec::with_capacity(cycles * (width * geometry.page_size / object_size)))
            .collect();

        let mut total_slots = 0;
        for hugepage in 0..zone.hugepages() {
            let hugepage_start = hugepage * geometry.hugepage_size;
            let hugepage_end = hugepage_start + geometry.hugepage_size;
            let mut cursor = hugepage_start;
            let mut group: GroupId = 0;
            while cursor < hugepage_end {
                let width = self::region_width(&table, group);
                let region_end = cursor + width * geometry.page_size;
                let mut slot = cursor;
                while slot + object_size <= region_end {
                    trace!(
                        "carved slot: group {} color {} offset {:#x}",
                        group,
                        zone.color_of(slot)?,
                        slot
                    );
                    free[group].push(slot);
                    total_slots += 1;
                    slot += object_size;
                }
                // sub-object remainder of the region is discarded
                cursor = region_end;
                group = (group + 1) % table.group_count();
            }
            debug!("huge page {} carved, {} slots so far", hugepage, total_slots);
        }

        if total_slots < config.object_count {
            warn!(
                "pool carved {} slots, below the requested {} objects; \
                 consider a larger overcommit factor",
                total_slots, config.object_count
            );
        }
        info!(
            "allocator pool ready: {} slots of {} bytes across {} groups ({} requested)",
            total_slots,
            object_size,
            table.group_count(),
            config.object_count
        );

        Ok(Self {
            object_size,
            table,
            free,
            total_slots,
            allocated: 0,
            zone,
        })
    }

    /// Pop a free slot from `group`
    ///
    /// `None` means the group is exhausted (or `group` is out of range);
    /// that is an expected outcome, not an error. Constant time.
    pub fn allocate(&mut self, group: GroupId) -> Option<ZoneOffset> {
        let offset = self.free.get_mut(group)?.pop()?;
        self.allocated += 1;
        trace!("allocated slot: group {} offset {:#x}", group, offset);
        Some(offset)
    }

    /// Return a slot to its owning group
    ///
    /// The group is re-derived from the offset's cache color; the caller
    /// is never trusted to name it. An offset that is out of bounds,
    /// resolves to no group, or does not sit on a slot boundary of its
    /// color region is an `InvariantViolation`: it did not originate from
    /// this pool, or the pool's state is corrupted. Constant time.
    pub fn free(&mut self, offset: ZoneOffset) -> PoolResult<()> {
        let group = self
            .resolve_group(offset)
            .ok_or(PoolError::InvariantViolation { offset })?;

        let geometry = *self.zone.geometry();
        let (region_start_color, width) = self
            .table
            .range_of(group)
            .ok_or(PoolError::InvariantViolation { offset })?;
        let in_cycle = offset % geometry.color_cycle_bytes();
        let region_start = region_start_color * geometry.page_size;
        if in_cycle < region_start {
            return Err(PoolError::InvariantViolation { offset });
        }
        let in_region = in_cycle - region_start;
        if in_region % self.object_size != 0
            || in_region + self.object_size > width * geometry.page_size
        {
            return Err(PoolError::InvariantViolation { offset });
        }

        self.free[group].push(offset);
        self.allocated = self.allocated.saturating_sub(1);
        trace!("freed slot: group {} offset {:#x}", group, offset);
        Ok(())
    }

    /// Group owning the byte at `offset`, via its cache color
    ///
    /// `None` signals a foreign offset or corrupted state.
    pub fn resolve_group(&self, offset: ZoneOffset) -> Option<GroupId> {
        let color = self.zone.color_of(offset).ok()?;
        self.table.group_of(color)
    }

    /// Read access to the slot at `offset`
    pub fn slot(&self, offset: ZoneOffset) -> PoolResult<&[u8]> {
        Ok(self.zone.slice(offset, self.object_size)?)
    }

    /// Write access to the slot at `offset`
    pub fn slot_mut(&mut self, offset: ZoneOffset) -> PoolResult<&mut [u8]> {
        Ok(self.zone.slice_mut(offset, self.object_size)?)
    }

    /// Cache-line-rounded object size
    #[inline]
    pub fn object_size(&self) -> Size {
        self.object_size
    }

    /// Number of color groups
    #[inline]
    pub fn group_count(&self) -> usize {
        self.table.group_count()
    }

    /// Color width table the pool was built with
    #[inline]
    pub fn color_table(&self) -> &ColorWidthTable {
        &self.table
    }

    /// The zone backing this pool
    #[inline]
    pub fn zone(&self) -> &MemoryZone {
        &self.zone
    }

    /// Current pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            total_slots: self.total_slots,
            allocated_slots: self.allocated,
            free_per_group: self.free.iter().map(Vec::len).collect(),
            object_size: self.object_size,
            group_count: self.table.group_count(),
        }
    }
}

impl Drop for AllocatorPool {
    fn drop(&mut self) {
        debug!(
            "allocator pool destroyed: {} slots discarded, {} still allocated",
            self.free.iter().map(Vec::len).sum::<usize>(),
            self.allocated
        );
        // free stacks and zone tear down field by field
    }
}

#[inline]
fn region_width(table: &ColorWidthTable, group: GroupId) -> usize {
    // group is always in range: the carve loop wraps it modulo group_count
    table.width(group).unwrap_or(0)
}
