//! File readers and writers for the daily archive and the two output
//! layouts.

pub mod reader;
pub mod writer;

pub use reader::{archive_var_code, DailyArchiveReader, MonthReader};
pub use writer::{write_full_grid, write_point_list, FILL_VALUE};
