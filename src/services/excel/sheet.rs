use std::collections::HashSet;
use crate::error::AppError;
use super::types::{Cell, CellValue};
use super::utils::unique_header;

/// One materialized worksheet. Row 1 is the header row; `rows` holds the
/// data rows (spreadsheet rows 2..=row_count), ragged rows allowed.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str, header_row: Vec<CellValue>, rows: Vec<Vec<Cell>>) -> Self {
        let column_count = rows
            .iter()
            .map(|row| row.len())
            .chain(std::iter::once(header_row.len()))
            .max()
            .unwrap_or(0);

        let mut existing_names = HashSet::new();
        let headers = (0..column_count)
            .map(|idx| {
                let raw = header_row.get(idx).map(|v| v.to_label()).unwrap_or_default();
                unique_header(&raw, idx + 1, &mut existing_names)
            })
            .collect();

        Sheet {
            name: name.to_string(),
            headers,
            rows,
        }
    }

    /// Builds a sheet from plain values; the first row is the header row.
    pub fn from_values(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        let mut rows = rows.into_iter();
        let header_row = rows.next().unwrap_or_default();
        let data = rows
            .map(|row| row.into_iter().map(Cell::Value).collect())
            .collect();
        Sheet::new(name, header_row, data)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Highest populated row, header included. 0 for a blank sheet.
    pub fn row_count(&self) -> usize {
        if self.headers.is_empty() && self.rows.is_empty() {
            0
        } else {
            self.rows.len() + 1
        }
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn column_index(&self, header: &str) -> Result<usize, AppError> {
        self.headers
            .iter()
            .position(|h| h == header)
            .ok_or_else(|| AppError::column_not_found(header, &self.name))
    }

    /// Cell at a 0-based column and 0-based data row.
    pub fn cell(&self, column: usize, data_row: usize) -> Option<&Cell> {
        self.rows.get(data_row).and_then(|row| row.get(column))
    }

    /// Resolved values of one column, one entry per data row.
    pub fn column_values(&self, column: usize) -> Vec<CellValue> {
        self.rows
            .iter()
            .map(|row| row.get(column).map(Cell::resolve).unwrap_or(CellValue::Empty))
            .collect()
    }

    pub fn column_values_by_name(&self, header: &str) -> Result<Vec<CellValue>, AppError> {
        let idx = self.column_index(header)?;
        Ok(self.column_values(idx))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workbook {
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Result<&Sheet, AppError> {
        self.sheets
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| AppError::sheet_not_found(name))
    }
}
