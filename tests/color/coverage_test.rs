/*!
 * Color Coverage Properties
 * Every positive ratio vector covers [0, color_max) exactly
 */

use cachecolor::ColorWidthTable;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_widths_cover_all_colors(
        ratios in prop::collection::vec(1usize..=16, 1..=8),
        color_max in prop::sample::select(vec![8usize, 16, 64, 128]),
    ) {
        let table = ColorWidthTable::build(&ratios, color_max).unwrap();

        // exact coverage: every color owned by exactly one group
        let mut owners = vec![0usize; color_max];
        for color in 0..color_max {
            let group = table.group_of(color).expect("color must have a group");
            prop_assert!(group < table.group_count());
            owners[color] += 1;
        }
        prop_assert!(owners.iter().all(|&count| count == 1));

        // widths sum to color_max with no overflow into the sentinel range
        let total: usize = (0..table.group_count())
            .map(|g| table.width(g).unwrap())
            .sum();
        prop_assert_eq!(total, color_max);
        prop_assert_eq!(table.group_of(color_max), None);
    }

    #[test]
    fn prop_group_of_agrees_with_range_of(
        ratios in prop::collection::vec(1usize..=9, 1..=6),
    ) {
        let color_max = 64;
        let table = ColorWidthTable::build(&ratios, color_max).unwrap();
        for group in 0..table.group_count() {
            let (start, width) = table.range_of(group).unwrap();
            for color in start..start + width {
                prop_assert_eq!(table.group_of(color), Some(group));
            }
        }
    }
}
