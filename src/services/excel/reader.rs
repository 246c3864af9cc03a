use std::io::Cursor;
use std::path::Path;
use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use crate::error::AppError;
use super::sheet::{Sheet, Workbook};
use super::types::{Cell, CellValue};

/// Maps a calamine value onto the closed cell model. `None` marks an error
/// value (`#DIV/0!`, `#REF!`, ...).
fn convert_data(value: &Data) -> Option<CellValue> {
    let converted = match value {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Bool(b) => CellValue::text(if *b { "TRUE" } else { "FALSE" }),
        Data::DateTime(d) if d.is_duration() => CellValue::Number(d.as_f64()),
        Data::DateTime(d) => CellValue::Date(d.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
        Data::Error(_) => return None,
        Data::Empty => CellValue::Empty,
    };
    Some(converted)
}

pub fn to_cell(value: Option<&Data>, formula: Option<&String>) -> Cell {
    match formula.filter(|f| !f.is_empty()) {
        Some(expression) => {
            let calculated = value.map_or(Some(CellValue::Empty), convert_data);
            if calculated.is_none() {
                tracing::warn!("Formula '{}' evaluated to an error, treating as text", expression);
            }
            Cell::Formula {
                expression: expression.clone(),
                calculated,
            }
        }
        None => {
            let value = match value {
                Some(data) => convert_data(data).unwrap_or_else(|| CellValue::text(data.to_string())),
                None => CellValue::Empty,
            };
            Cell::Value(value)
        }
    }
}

/// Lays values and formulas out on absolute sheet coordinates so that row 1
/// of the spreadsheet is always the header row.
fn build_sheet(name: &str, values: &Range<Data>, formulas: Option<&Range<String>>) -> Sheet {
    let ends = [values.end(), formulas.and_then(|f| f.end())];
    let (last_row, last_col) = ends
        .iter()
        .flatten()
        .fold(None, |acc: Option<(u32, u32)>, &(r, c)| match acc {
            None => Some((r, c)),
            Some((ar, ac)) => Some((ar.max(r), ac.max(c))),
        })
        .map_or((None, 0), |(r, c)| (Some(r), c + 1));

    let Some(last_row) = last_row else {
        return Sheet::new(name, Vec::new(), Vec::new());
    };

    let cell_at = |row: u32, col: u32| {
        to_cell(
            values.get_value((row, col)),
            formulas.and_then(|f| f.get_value((row, col))),
        )
    };

    let header_row = (0..last_col).map(|col| cell_at(0, col).resolve()).collect();
    let rows = (1..=last_row)
        .map(|row| (0..last_col).map(|col| cell_at(row, col)).collect())
        .collect();

    Sheet::new(name, header_row, rows)
}

pub fn load_workbook_from_bytes(file_data: Bytes, max_file_size: usize) -> Result<Workbook, AppError> {
    let start = std::time::Instant::now();
    if file_data.len() > max_file_size {
        return Err(AppError::InvalidInput(format!(
            "File is {} bytes, limit is {} bytes",
            file_data.len(),
            max_file_size
        )));
    }

    tracing::info!("Opening workbook ({}KB)...", file_data.len() / 1024);
    let cursor = Cursor::new(file_data);
    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        e
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);
    if sheet_names.is_empty() {
        return Err(AppError::EmptyDataset("No sheets found in workbook".to_string()));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = match workbook.worksheet_range(sheet_name) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!("Failed to read worksheet {}: {}", sheet_name, e);
                continue;
            }
        };

        let formulas = match workbook.worksheet_formula(sheet_name) {
            Ok(formulas) => Some(formulas),
            Err(e) => {
                tracing::warn!("Failed to read formulas of {}, using cached values only: {}", sheet_name, e);
                None
            }
        };

        let sheet = build_sheet(sheet_name, &range, formulas.as_ref());
        tracing::debug!("Read sheet {} with {} rows", sheet_name, sheet.row_count());
        sheets.push(sheet);
    }

    tracing::info!("Workbook read in {:?}", start.elapsed());
    Ok(Workbook::new(sheets))
}

pub fn load_workbook_from_path(path: &Path, max_file_size: usize) -> Result<Workbook, AppError> {
    let file_data = std::fs::read(path)?;
    load_workbook_from_bytes(Bytes::from(file_data), max_file_size)
}
