/*!
 * Color Module
 * Color-to-group partitioning
 */

mod table;

pub use table::{ColorTableError, ColorWidthTable};
