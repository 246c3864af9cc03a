//! Descriptive and relational statistics over spreadsheet data: per-column
//! type inference and summaries, cross-column analysis (category grouping
//! and Pearson correlation), correlation matrices and pivot tables.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;

pub use error::AppError;
pub use models::{ColumnListing, SheetStatistics, WorkbookStatistics};
