/*!
 * Color Width Table
 * Capacity-proportional partitioning of cache colors into groups
 */

use crate::core::types::{Color, GroupId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Width table construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorTableError {
    #[error("at least one color group is required")]
    NoGroups,

    #[error("group ratio at index {0} must be positive")]
    ZeroRatio(GroupId),

    #[error("{groups} groups cannot share {colors} colors")]
    TooManyGroups { groups: usize, colors: usize },
}

/// Immutable mapping from colors to groups
///
/// `widths[g]` is the number of consecutive colors owned by group `g`.
/// All but the last width are floor-divided from the ratio vector; the
/// last absorbs the rounding remainder, so the widths always cover
/// `[0, color_max)` exactly, with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorWidthTable {
    widths: Vec<usize>,
    color_max: Color,
}

impl ColorWidthTable {
    /// Build a width table from a positive ratio vector
    pub fn build(ratios: &[usize], color_max: Color) -> Result<Self, ColorTableError> {
        if ratios.is_empty() {
            return Err(ColorTableError::NoGroups);
        }
        if let Some(index) = ratios.iter().position(|&ratio| ratio == 0) {
            return Err(ColorTableError::ZeroRatio(index));
        }
        if ratios.len() > color_max {
            return Err(ColorTableError::TooManyGroups {
                groups: ratios.len(),
                colors: color_max,
            });
        }

        let ratio_sum: usize = ratios.iter().sum();
        let mut widths = Vec::with_capacity(ratios.len());
        let mut assigned = 0;
        for &ratio in &ratios[..ratios.len() - 1] {
            let width = color_max * ratio / ratio_sum;
            assigned += width;
            widths.push(width);
        }
        widths.push(color_max - assigned);

        Ok(Self { widths, color_max })
    }

    /// Number of groups
    #[inline]
    pub fn group_count(&self) -> usize {
        self.widths.len()
    }

    /// Total number of colors covered
    #[inline]
    pub fn color_max(&self) -> Color {
        self.color_max
    }

    /// Width in colors of group `group`
    #[inline]
    pub fn width(&self, group: GroupId) -> Option<usize> {
        self.widths.get(group).copied()
    }

    /// Color range `[start, start + width)` owned by `group`
    pub fn range_of(&self, group: GroupId) -> Option<(Color, usize)> {
        let width = *self.widths.get(group)?;
        let start = self.widths[..group].iter().sum();
        Some((start, width))
    }

    /// Group owning `color`
    ///
    /// `None` means the color falls outside every range. That is
    /// unreachable for a color derived from a valid zone address under a
    /// correctly built table, so callers treat it as a corruption or
    /// foreign-address signal.
    pub fn group_of(&self, color: Color) -> Option<GroupId> {
        let mut start = 0;
        for (group, &width) in self.widths.iter().enumerate() {
            if color >= start && color < start + width {
                return Some(group);
            }
            start += width;
        }
        None
    }

    /// Iterate over `(group, width)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (GroupId, usize)> + '_ {
        self.widths.iter().copied().enumerate()
    }
}
