//! Modules layer - infrastructure shared by the features
//!
//! Storage backends, spreadsheet parsing, chart rendering and export formats.

pub mod charts;
pub mod export;
pub mod spreadsheet;
pub mod storage;
