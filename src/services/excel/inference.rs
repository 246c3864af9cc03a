use chrono::Datelike;
use rayon::prelude::*;
use super::types::{CellValue, DataType};
use super::utils::{excel_serial_to_datetime, is_date_string, parse_numeric_str};

/// Share of non-empty values a single kind must exceed to name the column.
const PREDOMINANT_SHARE: f64 = 0.8;

/// Date serials before this year are not believed to be dates.
const DATE_SERIAL_MIN_YEAR: i32 = 1970;

/// Below this many values the tally stays on the calling thread.
const PARALLEL_TALLY_ROWS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Text,
    Date,
}

/// Classifies one value; `None` for empty cells.
pub fn classify(value: &CellValue) -> Option<ValueKind> {
    match value {
        CellValue::Empty => None,
        CellValue::Text(s) if s.is_empty() => None,
        CellValue::Number(n) if n.is_finite() => Some(ValueKind::Numeric),
        CellValue::Number(_) => Some(ValueKind::Text),
        CellValue::Date(serial) => match excel_serial_to_datetime(*serial) {
            Some(date) if date.year() > DATE_SERIAL_MIN_YEAR => Some(ValueKind::Date),
            _ => Some(ValueKind::Text),
        },
        CellValue::Text(s) => {
            if parse_numeric_str(s).is_some() {
                Some(ValueKind::Numeric)
            } else if is_date_string(s) {
                Some(ValueKind::Date)
            } else {
                Some(ValueKind::Text)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub numeric: usize,
    pub text: usize,
    pub date: usize,
    pub empty: usize,
}

impl TypeCounts {
    pub fn tally(values: &[CellValue]) -> Self {
        if values.len() < PARALLEL_TALLY_ROWS {
            return values.iter().fold(TypeCounts::default(), TypeCounts::add);
        }
        values
            .par_iter()
            .fold(TypeCounts::default, TypeCounts::add)
            .reduce(TypeCounts::default, TypeCounts::merge)
    }

    fn add(mut self, value: &CellValue) -> Self {
        match classify(value) {
            Some(ValueKind::Numeric) => self.numeric += 1,
            Some(ValueKind::Text) => self.text += 1,
            Some(ValueKind::Date) => self.date += 1,
            None => self.empty += 1,
        }
        self
    }

    fn merge(a: Self, b: Self) -> Self {
        TypeCounts {
            numeric: a.numeric + b.numeric,
            text: a.text + b.text,
            date: a.date + b.date,
            empty: a.empty + b.empty,
        }
    }

    pub fn non_empty(&self) -> usize {
        self.numeric + self.text + self.date
    }

    pub fn predominant_type(&self) -> DataType {
        let total = self.non_empty();
        if total == 0 {
            return DataType::Mixed;
        }

        let share = |count: usize| count as f64 / total as f64;
        if share(self.numeric) > PREDOMINANT_SHARE {
            DataType::Numeric
        } else if share(self.text) > PREDOMINANT_SHARE {
            DataType::Text
        } else if share(self.date) > PREDOMINANT_SHARE {
            DataType::Date
        } else {
            DataType::Mixed
        }
    }
}

pub fn infer_type(values: &[CellValue]) -> DataType {
    TypeCounts::tally(values).predominant_type()
}
