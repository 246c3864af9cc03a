pub mod analyzer;
pub mod cache;
pub mod correlation;
pub mod grouping;
pub mod matrix;
pub mod pivot;

pub use analyzer::{CrossColumnAnalyzer, CrossColumnStat};
pub use cache::{PairCache, SheetKey};
pub use matrix::{correlation_matrix, CorrelationMatrix};
pub use pivot::{pivot_table, Aggregation, PivotRequest, PivotTable};
