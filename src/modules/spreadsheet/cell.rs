use calamine::Data;
use serde::{Deserialize, Serialize};

use crate::shared::validation::parse_leading_number;

/// One normalised spreadsheet cell, stored as plain JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Whether the cell counts as a present value when projecting charts.
    /// Empty cells, `false`, numeric zero and empty text do not.
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Empty => false,
            CellValue::Bool(b) => *b,
            CellValue::Int(i) => *i != 0,
            CellValue::Float(f) => *f != 0.0 && !f.is_nan(),
            CellValue::Text(s) => !s.is_empty(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Display form used for labels, headers and CSV output
    pub fn as_label(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
        }
    }

    /// Numeric value using leading-number semantics; anything else is 0
    pub fn as_number(&self) -> f64 {
        match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) if f.is_finite() => *f,
            CellValue::Text(s) => parse_leading_number(s),
            _ => 0.0,
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => float_cell(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(naive) if !dt.is_duration() => {
                    CellValue::Text(naive.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())
                }
                _ => float_cell(dt.as_f64()),
            },
        }
    }
}

/// Spreadsheets store every number as a double; keep whole numbers integral
fn float_cell(f: f64) -> CellValue {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        CellValue::Int(f as i64)
    } else if f.is_finite() {
        CellValue::Float(f)
    } else {
        CellValue::Empty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!CellValue::Empty.is_truthy());
        assert!(!CellValue::Bool(false).is_truthy());
        assert!(!CellValue::Int(0).is_truthy());
        assert!(!CellValue::Float(0.0).is_truthy());
        assert!(!CellValue::Text(String::new()).is_truthy());

        assert!(CellValue::Bool(true).is_truthy());
        assert!(CellValue::Int(-1).is_truthy());
        assert!(CellValue::Text("0".to_string()).is_truthy());
    }

    #[test]
    fn test_as_number() {
        assert_eq!(CellValue::Int(4).as_number(), 4.0);
        assert_eq!(CellValue::Float(2.5).as_number(), 2.5);
        assert_eq!(CellValue::Text("12.5kg".to_string()).as_number(), 12.5);
        assert_eq!(CellValue::Text("n/a".to_string()).as_number(), 0.0);
        assert_eq!(CellValue::Bool(true).as_number(), 0.0);
    }

    #[test]
    fn test_json_shape() {
        let row = vec![
            CellValue::Text("North".to_string()),
            CellValue::Int(3),
            CellValue::Float(1.5),
            CellValue::Bool(true),
            CellValue::Empty,
        ];
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value, json!(["North", 3, 1.5, true, null]));

        let back: Vec<CellValue> = serde_json::from_value(value).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn test_from_calamine_data() {
        assert_eq!(CellValue::from(&Data::Float(2024.0)), CellValue::Int(2024));
        assert_eq!(CellValue::from(&Data::Float(0.25)), CellValue::Float(0.25));
        assert_eq!(
            CellValue::from(&Data::Error(calamine::CellErrorType::Div0)),
            CellValue::Empty
        );
        assert_eq!(
            CellValue::from(&Data::String("x".to_string())),
            CellValue::Text("x".to_string())
        );
    }
}
