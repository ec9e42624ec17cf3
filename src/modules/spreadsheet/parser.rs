use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

use super::cell::CellValue;
use crate::core::error::AppError;

/// One tab of a workbook: header row plus data rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetData {
    pub name: String,
    pub headers: Vec<String>,
    pub data: Vec<Vec<CellValue>>,
    pub total_rows: usize,
}

impl SheetData {
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }
}

/// Workbook summary derived from the first sheet, plus every sheet
#[derive(Debug, Clone)]
pub struct ParsedWorkbook {
    pub sheets: Vec<SheetData>,
    pub column_headers: Vec<String>,
    /// All rows of the first sheet, header included
    pub row_count: usize,
    pub column_count: usize,
    pub sample_data: Vec<Vec<CellValue>>,
}

/// Parse workbook bytes (xlsx, xls, xlsm, xlsb, ods)
pub fn parse_workbook(bytes: &[u8], sample_rows: usize) -> Result<ParsedWorkbook, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::BadRequest(format!("Unable to read spreadsheet: {}", e)))?;

    let names = workbook.sheet_names();
    if names.is_empty() {
        return Err(AppError::BadRequest(
            "Spreadsheet contains no sheets".to_string(),
        ));
    }

    let mut sheets = Vec::with_capacity(names.len());
    let mut first_rows: Vec<Vec<CellValue>> = Vec::new();

    for (index, name) in names.iter().enumerate() {
        let range = workbook.worksheet_range(name).map_err(|e| {
            AppError::BadRequest(format!("Unable to read sheet '{}': {}", name, e))
        })?;
        let rows = range_to_rows(&range);
        debug!("Parsed sheet '{}' with {} rows", name, rows.len());

        if index == 0 {
            first_rows = rows.clone();
        }
        sheets.push(sheet_from_rows(name, rows));
    }

    let column_headers = first_rows
        .first()
        .map(|row| header_row(row))
        .unwrap_or_default();
    let sample_data = first_rows
        .iter()
        .skip(1)
        .take(sample_rows)
        .cloned()
        .collect();

    Ok(ParsedWorkbook {
        row_count: first_rows.len(),
        column_count: column_headers.len(),
        column_headers,
        sample_data,
        sheets,
    })
}

/// Rows of a sheet with trailing empty cells and trailing empty rows removed
fn range_to_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let mut rows: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| {
            let mut cells: Vec<CellValue> = row.iter().map(CellValue::from).collect();
            while cells.last().is_some_and(CellValue::is_empty) {
                cells.pop();
            }
            cells
        })
        .collect();

    while rows.last().is_some_and(|r| r.is_empty()) {
        rows.pop();
    }
    rows
}

fn header_row(row: &[CellValue]) -> Vec<String> {
    row.iter().map(CellValue::as_label).collect()
}

fn sheet_from_rows(name: &str, mut rows: Vec<Vec<CellValue>>) -> SheetData {
    if rows.is_empty() {
        return SheetData {
            name: name.to_string(),
            headers: Vec::new(),
            data: Vec::new(),
            total_rows: 0,
        };
    }

    let data = rows.split_off(1);
    SheetData {
        name: name.to_string(),
        headers: header_row(&rows[0]),
        total_rows: data.len(),
        data,
    }
}

/// Parse on the blocking pool. The buffer is handed back with the result so
/// callers can store the same bytes they parsed.
pub async fn parse_workbook_blocking(
    bytes: Vec<u8>,
    sample_rows: usize,
) -> Result<(ParsedWorkbook, Vec<u8>), AppError> {
    tokio::task::spawn_blocking(move || {
        parse_workbook(&bytes, sample_rows).map(|parsed| (parsed, bytes))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Spreadsheet parsing task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn sales_workbook() -> Vec<u8> {
        let mut workbook = Workbook::new();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Sales").unwrap();
        sheet.write_string(0, 0, "Region").unwrap();
        sheet.write_string(0, 1, "Revenue").unwrap();
        sheet.write_string(0, 2, "Note").unwrap();
        for i in 0..15u32 {
            sheet.write_string(i + 1, 0, format!("R{}", i)).unwrap();
            sheet.write_number(i + 1, 1, (i as f64) * 1.5).unwrap();
        }
        sheet.write_boolean(1, 2, true).unwrap();

        let other = workbook.add_worksheet();
        other.set_name("Targets").unwrap();
        other.write_string(0, 0, "Quarter").unwrap();
        other.write_number(1, 0, 1).unwrap();

        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_first_sheet_drives_summary() {
        let parsed = parse_workbook(&sales_workbook(), 10).unwrap();

        assert_eq!(parsed.column_headers, vec!["Region", "Revenue", "Note"]);
        assert_eq!(parsed.row_count, 16);
        assert_eq!(parsed.column_count, 3);
        assert_eq!(parsed.sample_data.len(), 10);
        assert_eq!(
            parsed.sample_data[0],
            vec![
                CellValue::Text("R0".to_string()),
                CellValue::Int(0),
                CellValue::Bool(true)
            ]
        );
        // Trailing empty cells are dropped
        assert_eq!(parsed.sample_data[2].len(), 2);
        assert_eq!(parsed.sample_data[3][1], CellValue::Float(4.5));
    }

    #[test]
    fn test_every_sheet_is_kept() {
        let parsed = parse_workbook(&sales_workbook(), 10).unwrap();

        assert_eq!(parsed.sheets.len(), 2);
        assert_eq!(parsed.sheets[0].name, "Sales");
        assert_eq!(parsed.sheets[0].total_rows, 15);
        assert_eq!(parsed.sheets[1].name, "Targets");
        assert_eq!(parsed.sheets[1].headers, vec!["Quarter"]);
        assert_eq!(parsed.sheets[1].data, vec![vec![CellValue::Int(1)]]);
        assert_eq!(parsed.sheets[0].column_index("Revenue"), Some(1));
        assert_eq!(parsed.sheets[0].column_index("Missing"), None);
    }

    #[test]
    fn test_empty_first_sheet() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet();
        let parsed = parse_workbook(&workbook.save_to_buffer().unwrap(), 10).unwrap();

        assert_eq!(parsed.row_count, 0);
        assert_eq!(parsed.column_count, 0);
        assert!(parsed.column_headers.is_empty());
        assert!(parsed.sample_data.is_empty());
    }

    #[test]
    fn test_rejects_non_spreadsheet_bytes() {
        let result = parse_workbook(b"just some text", 10);
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_blocking_wrapper() {
        let original = sales_workbook();
        let (parsed, returned) = parse_workbook_blocking(original.clone(), 3).await.unwrap();
        assert_eq!(parsed.sample_data.len(), 3);
        assert_eq!(returned, original);
    }
}
