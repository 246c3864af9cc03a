pub mod cross_analysis;
pub mod excel;
