//! Spreadsheet ingestion built on calamine

mod cell;
mod parser;

pub use cell::CellValue;
pub use parser::{parse_workbook, parse_workbook_blocking, ParsedWorkbook, SheetData};
