use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::modules::charts::{ChartData, ChartType};
use crate::shared::validation::sanitize_file_name;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct PdfDownloadDto {
    pub file_id: Uuid,
    #[schema(value_type = Option<Object>)]
    pub chart_data: Option<ChartData>,
    #[schema(value_type = Option<Object>)]
    pub analysis_data: Option<serde_json::Value>,
    /// Base name for the download; the file's own name when omitted
    #[validate(length(max = 200))]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CsvDownloadDto {
    pub file_id: Uuid,
    /// Columns to export, in order; every column when empty
    #[serde(default)]
    pub selected_columns: Vec<String>,
    #[validate(length(max = 200))]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChartDownloadDto {
    pub file_id: Uuid,
    #[schema(value_type = Object)]
    pub chart_data: ChartData,
    pub chart_type: ChartType,
    #[validate(length(max = 200))]
    pub file_name: Option<String>,
}

/// What a download contains, used in its file name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Analysis,
    Export,
    Chart(ChartType),
}

impl std::fmt::Display for DownloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadKind::Analysis => write!(f, "analysis"),
            DownloadKind::Export => write!(f, "export"),
            DownloadKind::Chart(chart_type) => write!(f, "{}_chart", chart_type),
        }
    }
}

/// `{base}_{kind}_{unix_millis}.{ext}`; base is the requested name or the stored file's base name
pub fn download_file_name(
    requested: Option<&str>,
    fallback_base: &str,
    kind: DownloadKind,
    unix_millis: i64,
    extension: &str,
) -> String {
    let base = requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_base);
    sanitize_file_name(&format!(
        "{}_{}_{}.{}",
        base, kind, unix_millis, extension
    ))
}

/// Rendered bytes ready to be sent as an attachment
#[derive(Debug, Clone)]
pub struct DownloadPayload {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_file_name_uses_fallback_base() {
        assert_eq!(
            download_file_name(None, "sales", DownloadKind::Analysis, 1718000000000, "pdf"),
            "sales_analysis_1718000000000.pdf"
        );
        assert_eq!(
            download_file_name(Some("  "), "sales", DownloadKind::Export, 1, "csv"),
            "sales_export_1.csv"
        );
    }

    #[test]
    fn test_download_file_name_chart_kind() {
        assert_eq!(
            download_file_name(
                Some("Q1 review"),
                "sales",
                DownloadKind::Chart(ChartType::Pie),
                42,
                "svg"
            ),
            "Q1 review_pie_chart_42.svg"
        );
    }

    #[test]
    fn test_download_file_name_is_header_safe() {
        let name = download_file_name(Some("a\"b/c"), "x", DownloadKind::Export, 7, "csv");
        assert_eq!(name, "a_b_c_export_7.csv");
    }
}
