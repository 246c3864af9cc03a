use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use sheet_stats::{
    config, logging,
    services::cross_analysis::{correlation_matrix, pivot_table, Aggregation, PairCache, PivotRequest, SheetKey},
    services::excel::{reader, ExcelAnalyzer},
};

#[derive(Debug, Parser)]
#[command(name = "sheet_stats", version, about = "Descriptive and relational statistics for spreadsheets")]
struct Cli {
    /// Path to the .xlsx file
    file: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Statistics for every sheet of the workbook
    Analyze,
    /// Columns of one sheet grouped by type
    Columns {
        #[arg(long)]
        sheet: String,
    },
    /// Relationship between a numeric target column and a source column
    Pair {
        #[arg(long)]
        sheet: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        source: String,
    },
    /// Pairwise correlation matrix of numeric columns
    Matrix {
        #[arg(long)]
        sheet: String,
        #[arg(long, value_delimiter = ',')]
        columns: Vec<String>,
        #[arg(long, default_value_t = 0.0)]
        min_correlation: f64,
    },
    /// Two-axis aggregation of a value column
    Pivot {
        #[arg(long)]
        sheet: String,
        #[arg(long)]
        rows: String,
        #[arg(long)]
        cols: String,
        #[arg(long)]
        values: String,
        #[arg(long, default_value = "sum")]
        aggregation: String,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    let cli = Cli::parse();

    let start = std::time::Instant::now();
    let workbook = reader::load_workbook_from_path(&cli.file, config.max_file_size)?;
    let analyzer = ExcelAnalyzer::new(&config);

    match cli.command {
        Command::Analyze => print_json(&analyzer.analyze_workbook(&workbook))?,
        Command::Columns { sheet } => {
            let stats = analyzer.analyze_sheet(workbook.sheet(&sheet)?);
            print_json(&stats.column_listing())?
        }
        Command::Pair { sheet, target, source } => {
            let data = workbook.sheet(&sheet)?;
            let stats = analyzer.analyze_sheet(data);
            let cache = PairCache::from_config(&config);
            let key = SheetKey::new(&cli.file.to_string_lossy(), &sheet);
            let analysis = cache.get_or_compute(&key, data, Some(&stats), &target, &source)?;
            print_json(analysis.as_ref())?
        }
        Command::Matrix { sheet, columns, min_correlation } => {
            let matrix = correlation_matrix(workbook.sheet(&sheet)?, &columns, min_correlation)?;
            print_json(&matrix)?
        }
        Command::Pivot { sheet, rows, cols, values, aggregation } => {
            let aggregation: Aggregation = aggregation.parse()?;
            let request = PivotRequest::new(&rows, &cols, &values, aggregation);
            let table = pivot_table(workbook.sheet(&sheet)?, &request)?;
            print_json(&table)?
        }
    }

    tracing::info!("Total processing completed in {:?}", start.elapsed());
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
