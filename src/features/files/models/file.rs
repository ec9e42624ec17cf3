use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::modules::charts::{ChartData, ChartType};
use crate::modules::spreadsheet::{CellValue, SheetData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "file_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Uploaded,
    Processing,
    Completed,
    Error,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Uploaded => write!(f, "uploaded"),
            FileStatus::Processing => write!(f, "processing"),
            FileStatus::Completed => write!(f, "completed"),
            FileStatus::Error => write!(f, "error"),
        }
    }
}

/// Chart the user kept on a file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SavedChart {
    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    #[schema(value_type = Object)]
    pub data: ChartData,
    #[schema(value_type = Option<Object>)]
    pub config: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Database model for an uploaded workbook and its parsed content
#[derive(Debug, Clone, FromRow)]
pub struct File {
    pub id: Uuid,
    pub user_id: Uuid,
    pub original_name: String,
    pub storage_key: String,
    pub storage_url: String,
    pub content_type: String,
    pub file_size: i64,
    pub row_count: i32,
    pub column_count: i32,
    pub column_headers: Json<Vec<String>>,
    pub sample_data: Json<Vec<Vec<CellValue>>>,
    pub sheets: Json<Vec<SheetData>>,
    pub status: FileStatus,
    pub analysis_data: serde_json::Value,
    pub charts: Json<Vec<SavedChart>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// Sheet by name, or the first sheet when no name is given
    pub fn sheet(&self, name: Option<&str>) -> Option<&SheetData> {
        match name {
            Some(name) => self.sheets.iter().find(|s| s.name == name),
            None => self.sheets.first(),
        }
    }

    /// Original name without its extension
    pub fn base_name(&self) -> &str {
        match self.original_name.rsplit_once('.') {
            Some((base, _)) if !base.is_empty() => base,
            _ => &self.original_name,
        }
    }
}

pub const FILE_COLUMNS: &str = "id, user_id, original_name, storage_key, storage_url, \
    content_type, file_size, row_count, column_count, column_headers, sample_data, sheets, \
    status, analysis_data, charts, created_at, updated_at";

pub const FILE_SUMMARY_COLUMNS: &str =
    "id, original_name, file_size, row_count, column_count, status, created_at";

#[cfg(test)]
pub(crate) fn sample_file(user_id: Uuid) -> File {
    let sheet = SheetData {
        name: "Sales".to_string(),
        headers: vec!["Month".to_string(), "Revenue".to_string()],
        data: vec![
            vec![CellValue::Text("Jan".to_string()), CellValue::Int(120)],
            vec![CellValue::Text("Feb".to_string()), CellValue::Float(98.5)],
        ],
        total_rows: 2,
    };
    File {
        id: Uuid::new_v4(),
        user_id,
        original_name: "q1.sales.xlsx".to_string(),
        storage_key: format!("spreadsheets/{}/q1.xlsx", user_id),
        storage_url: "http://localhost/q1.xlsx".to_string(),
        content_type: "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            .to_string(),
        file_size: 2048,
        row_count: 3,
        column_count: 2,
        column_headers: Json(sheet.headers.clone()),
        sample_data: Json(sheet.data.clone()),
        sheets: Json(vec![sheet]),
        status: FileStatus::Uploaded,
        analysis_data: serde_json::json!({}),
        charts: Json(vec![]),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
