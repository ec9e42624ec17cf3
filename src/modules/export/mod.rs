//! Downloadable renditions of stored workbooks

mod csv_export;
mod pdf_report;

pub use csv_export::export_csv;
pub use pdf_report::{json_lines, render_pdf, PdfReport, ReportSection};
