pub mod analyzer;
pub mod inference;
pub mod reader;
pub mod sheet;
pub mod types;
pub mod utils;

pub use analyzer::ExcelAnalyzer;
pub use sheet::{Sheet, Workbook};
pub use types::{Cell, CellValue, ColumnStats, DataType};
