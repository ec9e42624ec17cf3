use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::files::models::{File, FileStatus, SavedChart};
use crate::modules::spreadsheet::{CellValue, SheetData};
use crate::shared::constants::{ALLOWED_EXTENSIONS, ALLOWED_MIME_TYPES};

/// Upload request for OpenAPI documentation.
/// The handler reads the multipart body directly.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct UploadFileDto {
    /// Spreadsheet to upload (.xlsx, .xls, .xlsm, .xlsb, .ods)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub file: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UploadResponseDto {
    pub file_id: Uuid,
    /// Original file name
    pub file: String,
    /// Rows of the first sheet, header included
    pub rows: i32,
    pub columns: i32,
    pub headers: Vec<String>,
    pub sheet_count: usize,
}

/// Listing entry for a stored workbook
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct FileSummaryDto {
    pub id: Uuid,
    pub original_name: String,
    pub file_size: i64,
    pub row_count: i32,
    pub column_count: i32,
    pub status: FileStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileStatsDto {
    pub row_count: i32,
    pub column_count: i32,
    pub sheet_count: usize,
    pub file_size: i64,
}

/// Full parsed representation of a workbook
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileDetailDto {
    pub id: Uuid,
    pub original_name: String,
    pub content_type: String,
    pub status: FileStatus,
    pub column_headers: Vec<String>,
    #[schema(value_type = Vec<Vec<Object>>)]
    pub sample_data: Vec<Vec<CellValue>>,
    #[schema(value_type = Vec<Object>)]
    pub sheets: Vec<SheetData>,
    pub charts: Vec<SavedChart>,
    #[schema(value_type = Object)]
    pub analysis_data: serde_json::Value,
    pub stats: FileStatsDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<File> for FileDetailDto {
    fn from(file: File) -> Self {
        let stats = FileStatsDto {
            row_count: file.row_count,
            column_count: file.column_count,
            sheet_count: file.sheets.len(),
            file_size: file.file_size,
        };
        Self {
            id: file.id,
            original_name: file.original_name,
            content_type: file.content_type,
            status: file.status,
            column_headers: file.column_headers.0,
            sample_data: file.sample_data.0,
            sheets: file.sheets.0,
            charts: file.charts.0,
            analysis_data: file.analysis_data,
            stats,
            created_at: file.created_at,
            updated_at: file.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteFileResponseDto {
    pub deleted: bool,
    /// History entries linked to the deletion record
    pub related_activities: usize,
}

/// Lower-cased extension of a file name
pub fn file_extension(file_name: &str) -> Option<String> {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Check an upload's size, extension and declared MIME type
pub fn validate_upload(
    file_name: &str,
    content_type: &str,
    size: usize,
    max_size: usize,
) -> Result<(), AppError> {
    if size == 0 {
        return Err(AppError::BadRequest("Uploaded file is empty".to_string()));
    }

    if size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File too large. Maximum size is {} MB",
            max_size / 1024 / 1024
        )));
    }

    let extension_ok = file_extension(file_name)
        .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false);
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let mime_ok = ALLOWED_MIME_TYPES.contains(&mime.as_str()) || mime == "application/octet-stream";

    if !extension_ok || !mime_ok {
        return Err(AppError::BadRequest(format!(
            "Invalid file format. Allowed extensions: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    const MAX: usize = 10 * 1024 * 1024;

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("Report.XLSX").as_deref(), Some("xlsx"));
        assert_eq!(file_extension("archive.tar.ods").as_deref(), Some("ods"));
        assert!(file_extension("noext").is_none());
        assert!(file_extension("trailing.").is_none());
    }

    #[test]
    fn test_validate_upload_accepts_spreadsheets() {
        assert!(validate_upload("sales.xlsx", XLSX, 1024, MAX).is_ok());
        assert!(validate_upload("legacy.xls", "application/vnd.ms-excel", 1024, MAX).is_ok());
        assert!(validate_upload("sheet.ods", "application/octet-stream", 1024, MAX).is_ok());
    }

    #[test]
    fn test_validate_upload_rejects_wrong_type() {
        assert!(matches!(
            validate_upload("notes.txt", "text/plain", 10, MAX),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            validate_upload("sales.xlsx", "image/png", 10, MAX),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_validate_upload_size_limits() {
        assert!(matches!(
            validate_upload("sales.xlsx", XLSX, MAX + 1, MAX),
            Err(AppError::PayloadTooLarge(_))
        ));
        assert!(matches!(
            validate_upload("sales.xlsx", XLSX, 0, MAX),
            Err(AppError::BadRequest(_))
        ));
    }
}
