use serde::Serialize;
use std::fmt;
use super::utils::{format_date_serial, format_number, parse_numeric_str};

/// A resolved cell value as handed over by the sheet reader.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    /// Spreadsheet date serial (1900 date system).
    Date(f64),
    Empty,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the value. Date serials are not numbers here.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if n.is_finite() => Some(*n),
            CellValue::Text(s) => parse_numeric_str(s),
            _ => None,
        }
    }

    /// String form used for category and pivot labels.
    pub fn to_label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Date(serial) => match format_date_serial(*serial) {
                Some(date) => write!(f, "{}", date),
                None => write!(f, "{}", format_number(*serial)),
            },
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::from(s.as_str())
    }
}

/// One coordinate of a sheet: either a literal value or a formula together
/// with whatever the workbook calculated for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Value(CellValue),
    Formula {
        expression: String,
        /// `None` when the formula failed to evaluate.
        calculated: Option<CellValue>,
    },
}

impl Cell {
    pub fn is_formula(&self) -> bool {
        matches!(self, Cell::Formula { .. })
    }

    /// The value analysis works with: the calculated result for formulas.
    /// A formula that failed to evaluate degrades to its own text.
    pub fn resolve(&self) -> CellValue {
        match self {
            Cell::Value(value) => value.clone(),
            Cell::Formula { calculated: Some(value), .. } => value.clone(),
            Cell::Formula { expression, calculated: None } => {
                tracing::debug!("Formula '{}' has no calculated value, treating as text", expression);
                CellValue::Text(expression.clone())
            }
        }
    }
}

impl From<CellValue> for Cell {
    fn from(value: CellValue) -> Self {
        Cell::Value(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Numeric,
    Text,
    Date,
    Mixed,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Numeric => "numeric",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub header: String,
    pub data_type: DataType,
    pub non_empty_count: usize,
    pub empty_count: usize,
    pub fill_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericSummary>,
}
