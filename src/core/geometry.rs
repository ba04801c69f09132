/*!
 * Cache Geometry
 * Platform cache and paging constants used to derive coloring parameters
 */

use super::types::{Color, Size};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geometry validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    #[error("{name} must be a nonzero power of two, got {value}")]
    NotPowerOfTwo { name: &'static str, value: usize },

    #[error("cache line size {line} exceeds page size {page}")]
    LineLargerThanPage { line: usize, page: usize },

    #[error("huge page size {huge} is not a multiple of page size {page}")]
    HugePageNotPageMultiple { huge: usize, page: usize },

    #[error("cache size {cache} yields zero colors for page size {page}, {ways}-way")]
    NoColors {
        cache: usize,
        page: usize,
        ways: usize,
    },

    #[error("huge page holds {pages} pages, not a multiple of {colors} colors")]
    ColorCycleMisaligned { pages: usize, colors: usize },
}

/// Last-level-cache and paging geometry
///
/// Determines how many cache colors exist and how large one color cycle is.
/// A huge page must hold a whole number of color cycles so that color 0
/// recurs at every huge-page boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGeometry {
    pub cache_size: Size,
    pub cache_line_size: Size,
    pub associativity: usize,
    pub page_size: Size,
    pub hugepage_size: Size,
}

impl CacheGeometry {
    /// Validate a geometry description
    pub fn new(
        cache_size: Size,
        cache_line_size: Size,
        associativity: usize,
        page_size: Size,
        hugepage_size: Size,
    ) -> Result<Self, GeometryError> {
        let geometry = Self {
            cache_size,
            cache_line_size,
            associativity,
            page_size,
            hugepage_size,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Re-check a geometry built by hand (fields are public)
    pub fn validate(&self) -> Result<(), GeometryError> {
        for (name, value) in [
            ("cache_line_size", self.cache_line_size),
            ("page_size", self.page_size),
            ("hugepage_size", self.hugepage_size),
        ] {
            if value == 0 || !value.is_power_of_two() {
                return Err(GeometryError::NotPowerOfTwo { name, value });
            }
        }
        if self.cache_size == 0 || self.associativity == 0 {
            return Err(GeometryError::NoColors {
                cache: self.cache_size,
                page: self.page_size,
                ways: self.associativity,
            });
        }
        if self.cache_line_size > self.page_size {
            return Err(GeometryError::LineLargerThanPage {
                line: self.cache_line_size,
                page: self.page_size,
            });
        }
        if self.hugepage_size % self.page_size != 0 {
            return Err(GeometryError::HugePageNotPageMultiple {
                huge: self.hugepage_size,
                page: self.page_size,
            });
        }
        let colors = self.cache_size / self.page_size / self.associativity;
        if colors == 0 {
            return Err(GeometryError::NoColors {
                cache: self.cache_size,
                page: self.page_size,
                ways: self.associativity,
            });
        }
        let pages = self.hugepage_size / self.page_size;
        if pages % colors != 0 {
            return Err(GeometryError::ColorCycleMisaligned { pages, colors });
        }
        Ok(())
    }

    /// Number of distinct cache colors
    #[inline]
    pub fn color_max(&self) -> Color {
        self.cache_size / self.page_size / self.associativity
    }

    /// log2 of the base page size
    #[inline]
    pub fn page_shift(&self) -> u32 {
        self.page_size.trailing_zeros()
    }

    /// Bytes covered by one full pass over all colors
    #[inline]
    pub fn color_cycle_bytes(&self) -> Size {
        self.color_max() * self.page_size
    }

    /// Base pages per huge page
    #[inline]
    pub fn pages_per_hugepage(&self) -> usize {
        self.hugepage_size / self.page_size
    }

    /// Round a byte count up to a whole number of huge pages
    #[inline]
    pub fn round_to_hugepage(&self, size: Size) -> Size {
        (size + self.hugepage_size - 1) & !(self.hugepage_size - 1)
    }

    /// Round an object size up to a whole number of cache lines
    #[inline]
    pub fn round_to_cache_line(&self, size: Size) -> Size {
        (size + self.cache_line_size - 1) & !(self.cache_line_size - 1)
    }
}

impl Default for CacheGeometry {
    /// Commodity x86-64 geometry: 256 KiB 8-way LLC slice, 64 B lines,
    /// 4 KiB pages, 2 MiB huge pages. Yields 8 colors.
    fn default() -> Self {
        Self {
            cache_size: 256 * 1024,
            cache_line_size: 64,
            associativity: 8,
            page_size: 4096,
            hugepage_size: 2 * 1024 * 1024,
        }
    }
}
