pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    created, deleted, header, info, modified, muted, section, success, summary_row, warn,
};
pub use table::{records_table, stats_table};
pub use theme::{theme, Theme};
