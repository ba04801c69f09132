/*!
 * Allocator Pool Tests
 * Construction, carving layout, allocate/free protocol
 */

use cachecolor::{
    AllocatorPool, CacheGeometry, FixedStrideResolver, PoolConfig, PoolError,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn pool_with(ratios: Vec<usize>, object_count: usize, object_size: usize) -> (AllocatorPool, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = PoolConfig::new(dir.path().join("zone"), object_count, object_size, ratios);
    let pool = AllocatorPool::create(&config, &FixedStrideResolver::default()).unwrap();
    (pool, dir)
}

#[test]
fn test_reference_carve_counts() {
    // 100 objects of 38 bytes round to 64; one 2 MiB huge page carves a
    // fixed slot count per group for the default geometry
    let (pool, _dir) = pool_with(vec![1, 2, 1], 100, 38);

    assert_eq!(pool.object_size(), 64);
    assert_eq!(pool.group_count(), 3);

    let stats = pool.stats();
    assert_eq!(stats.free_per_group, vec![8192, 16384, 8192]);
    assert_eq!(stats.total_slots, 32768);
    assert_eq!(stats.allocated_slots, 0);
    assert!(stats.total_slots >= 100);
}

#[test]
fn test_allocated_offsets_resolve_to_their_group() {
    let (mut pool, _dir) = pool_with(vec![1, 2, 1], 100, 38);

    for group in 0..pool.group_count() {
        for _ in 0..50 {
            let offset = pool.allocate(group).unwrap();
            assert_eq!(pool.resolve_group(offset), Some(group));
        }
    }
}

#[test]
fn test_alloc_free_round_trip_restores_free_set() {
    let (mut pool, _dir) = pool_with(vec![1, 1], 64, 256);

    // drain group 0 completely to capture its free set
    let mut first_drain = Vec::new();
    while let Some(offset) = pool.allocate(0) {
        first_drain.push(offset);
    }
    assert!(!first_drain.is_empty());

    for &offset in &first_drain {
        pool.free(offset).unwrap();
    }
    let mut second_drain = Vec::new();
    while let Some(offset) = pool.allocate(0) {
        second_drain.push(offset);
    }

    let mut first_sorted = first_drain.clone();
    let mut second_sorted = second_drain.clone();
    first_sorted.sort_unstable();
    second_sorted.sort_unstable();
    assert_eq!(first_sorted, second_sorted);
}

#[test]
fn test_exhausted_group_returns_none() {
    let (mut pool, _dir) = pool_with(vec![1, 2, 1], 100, 38);
    let free_in_group = pool.stats().free_per_group[2];

    for _ in 0..free_in_group {
        assert!(pool.allocate(2).is_some());
    }
    assert_eq!(pool.allocate(2), None);
    assert_eq!(pool.allocate(2), None);

    // other groups are unaffected
    assert!(pool.allocate(0).is_some());
}

#[test]
fn test_out_of_range_group_is_always_empty() {
    let (mut pool, _dir) = pool_with(vec![1, 1], 16, 64);
    assert_eq!(pool.allocate(2), None);
    assert_eq!(pool.allocate(usize::MAX), None);
}

#[test]
fn test_slot_memory_is_usable() {
    let (mut pool, _dir) = pool_with(vec![1], 16, 100);
    assert_eq!(pool.object_size(), 128);

    let a = pool.allocate(0).unwrap();
    let b = pool.allocate(0).unwrap();

    pool.slot_mut(a).unwrap().fill(0x11);
    pool.slot_mut(b).unwrap().fill(0x22);

    assert!(pool.slot(a).unwrap().iter().all(|&byte| byte == 0x11));
    assert!(pool.slot(b).unwrap().iter().all(|&byte| byte == 0x22));
}

#[test]
fn test_rejects_degenerate_configs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zone");

    let zero_count = PoolConfig::new(&path, 0, 64, vec![1]);
    assert!(matches!(
        AllocatorPool::create(&zero_count, &FixedStrideResolver::default()),
        Err(PoolError::ZeroObjectCount)
    ));

    let zero_size = PoolConfig::new(&path, 16, 0, vec![1]);
    assert!(matches!(
        AllocatorPool::create(&zero_size, &FixedStrideResolver::default()),
        Err(PoolError::ZeroObjectSize)
    ));

    let no_groups = PoolConfig::new(&path, 16, 64, vec![]);
    assert!(matches!(
        AllocatorPool::create(&no_groups, &FixedStrideResolver::default()),
        Err(PoolError::Table(_))
    ));

    let zero_ratio = PoolConfig::new(&path, 16, 64, vec![1, 0]);
    assert!(matches!(
        AllocatorPool::create(&zero_ratio, &FixedStrideResolver::default()),
        Err(PoolError::Table(_))
    ));

    let zero_overcommit = PoolConfig::new(&path, 16, 64, vec![1]).with_overcommit(0);
    assert!(matches!(
        AllocatorPool::create(&zero_overcommit, &FixedStrideResolver::default()),
        Err(PoolError::ZeroOvercommit)
    ));

    // failed creates leave nothing behind
    assert!(!path.exists());
}

#[test]
fn test_backing_file_removed_on_pool_drop() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("zone");
    let config = PoolConfig::new(&path, 32, 64, vec![1, 1]);
    let pool = AllocatorPool::create(&config, &FixedStrideResolver::default()).unwrap();

    assert!(path.exists());
    drop(pool);
    assert!(!path.exists());
}

#[test]
fn test_custom_geometry_changes_carve_counts() {
    // 16 colors: 1 MiB cache, 16-way, 4 KiB pages
    let geometry = CacheGeometry::new(1024 * 1024, 64, 16, 4096, 2 * 1024 * 1024).unwrap();
    assert_eq!(geometry.color_max(), 16);

    let dir = TempDir::new().unwrap();
    let config = PoolConfig::new(dir.path().join("zone"), 100, 38, vec![1, 3])
        .with_geometry(geometry);
    let pool = AllocatorPool::create(&config, &FixedStrideResolver::default()).unwrap();

    // widths [4, 12]: per 64 KiB cycle, 4 pages / 12 pages of 64-byte slots,
    // 32 cycles in one huge page
    let stats = pool.stats();
    assert_eq!(stats.free_per_group, vec![32 * 4 * 64, 32 * 12 * 64]);
}
