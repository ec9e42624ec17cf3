use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::extractor::ClientContext;
use crate::modules::charts::ChartType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "history_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Upload,
    Analysis,
    ChartCreated,
    PdfDownloaded,
    CsvExported,
    FileDeleted,
    AnalysisDownloaded,
}

impl HistoryAction {
    pub fn is_download(&self) -> bool {
        matches!(
            self,
            HistoryAction::PdfDownloaded
                | HistoryAction::CsvExported
                | HistoryAction::AnalysisDownloaded
        )
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryAction::Upload => write!(f, "upload"),
            HistoryAction::Analysis => write!(f, "analysis"),
            HistoryAction::ChartCreated => write!(f, "chart_created"),
            HistoryAction::PdfDownloaded => write!(f, "pdf_downloaded"),
            HistoryAction::CsvExported => write!(f, "csv_exported"),
            HistoryAction::FileDeleted => write!(f, "file_deleted"),
            HistoryAction::AnalysisDownloaded => write!(f, "analysis_downloaded"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "analysis_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    BasicStats,
    Correlation,
    TrendAnalysis,
    OutlierDetection,
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "download_format", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DownloadFormat {
    Pdf,
    Csv,
    Excel,
    Png,
    Jpg,
    Svg,
}

impl DownloadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Pdf => "pdf",
            DownloadFormat::Csv => "csv",
            DownloadFormat::Excel => "xlsx",
            DownloadFormat::Png => "png",
            DownloadFormat::Jpg => "jpg",
            DownloadFormat::Svg => "svg",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema, Default)]
#[sqlx(type_name = "history_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    #[default]
    Completed,
    InProgress,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SelectedAxes {
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    pub z_axis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartConfig {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResults {
    pub summary: Option<String>,
    #[serde(default)]
    pub insights: Vec<String>,
    #[schema(value_type = Object)]
    #[serde(default)]
    pub statistics: serde_json::Value,
}

/// Request context and per-file counters captured with an entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HistoryMetadata {
    pub browser: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub screen_resolution: Option<String>,
    /// Seconds spent on the action
    pub time_spent: Option<i64>,
    pub chart_count: Option<i64>,
    pub download_count: Option<i64>,
    pub analysis_count: Option<i64>,
}

impl HistoryMetadata {
    pub fn from_client(ctx: &ClientContext) -> Self {
        Self {
            browser: ctx
                .user_agent
                .as_deref()
                .and_then(|ua| ua.split('/').next())
                .map(|name| name.trim().to_string()),
            user_agent: ctx.user_agent.clone(),
            ip_address: ctx.ip_address.clone(),
            screen_resolution: Some(ctx.screen_resolution.clone()),
            ..Default::default()
        }
    }
}

/// Database model for a file history entry
#[derive(Debug, Clone, FromRow)]
pub struct FileHistory {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub file_name: String,
    pub action: HistoryAction,
    pub chart_type: Option<ChartType>,
    pub selected_axes: Option<Json<SelectedAxes>>,
    pub chart_config: Option<Json<ChartConfig>>,
    pub chart_id: Option<String>,
    pub analysis_type: Option<AnalysisType>,
    pub analysis_results: Option<Json<AnalysisResults>>,
    pub analysis_id: Option<String>,
    pub download_format: Option<DownloadFormat>,
    pub download_url: Option<String>,
    pub download_file_name: Option<String>,
    pub download_size: Option<i64>,
    pub file_size: Option<i64>,
    pub row_count: Option<i32>,
    pub column_count: Option<i32>,
    pub analysis_time: Option<DateTime<Utc>>,
    pub download_time: Option<DateTime<Utc>>,
    pub chart_creation_time: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
    pub metadata: Json<HistoryMetadata>,
    pub related_activities: Vec<Uuid>,
    pub tags: Vec<String>,
    pub status: HistoryStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for appending a history entry
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub user_id: Uuid,
    pub file_id: Uuid,
    pub file_name: String,
    pub action: HistoryAction,
    pub chart_type: Option<ChartType>,
    pub selected_axes: Option<SelectedAxes>,
    pub chart_config: Option<ChartConfig>,
    pub chart_id: Option<String>,
    pub analysis_type: Option<AnalysisType>,
    pub analysis_results: Option<AnalysisResults>,
    pub analysis_id: Option<String>,
    pub download_format: Option<DownloadFormat>,
    pub download_url: Option<String>,
    pub download_file_name: Option<String>,
    pub download_size: Option<i64>,
    pub file_size: Option<i64>,
    pub row_count: Option<i32>,
    pub column_count: Option<i32>,
    pub session_id: Option<String>,
    pub metadata: HistoryMetadata,
    pub related_activities: Vec<Uuid>,
    pub tags: Vec<String>,
    pub status: HistoryStatus,
    pub error_message: Option<String>,
}

impl NewHistoryEntry {
    pub fn new(user_id: Uuid, file_id: Uuid, file_name: impl Into<String>, action: HistoryAction) -> Self {
        Self {
            user_id,
            file_id,
            file_name: file_name.into(),
            action,
            chart_type: None,
            selected_axes: None,
            chart_config: None,
            chart_id: None,
            analysis_type: None,
            analysis_results: None,
            analysis_id: None,
            download_format: None,
            download_url: None,
            download_file_name: None,
            download_size: None,
            file_size: None,
            row_count: None,
            column_count: None,
            session_id: None,
            metadata: HistoryMetadata::default(),
            related_activities: Vec::new(),
            tags: Vec::new(),
            status: HistoryStatus::Completed,
            error_message: None,
        }
    }

    /// Timestamp column matching the action: (analysis_time, chart_creation_time, download_time)
    pub fn action_timestamps(
        &self,
        now: DateTime<Utc>,
    ) -> (
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
        Option<DateTime<Utc>>,
    ) {
        match self.action {
            HistoryAction::Analysis => (Some(now), None, None),
            HistoryAction::ChartCreated => (None, Some(now), None),
            action if action.is_download() => (None, None, Some(now)),
            _ => (None, None, None),
        }
    }
}

pub const HISTORY_COLUMNS: &str = "id, user_id, file_id, file_name, action, chart_type, \
    selected_axes, chart_config, chart_id, analysis_type, analysis_results, analysis_id, \
    download_format, download_url, download_file_name, download_size, file_size, row_count, \
    column_count, analysis_time, download_time, chart_creation_time, session_id, metadata, \
    related_activities, tags, status, error_message, created_at";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_timestamps() {
        let now = Utc::now();
        let entry = |action| NewHistoryEntry::new(Uuid::new_v4(), Uuid::new_v4(), "a.xlsx", action);

        assert_eq!(
            entry(HistoryAction::Analysis).action_timestamps(now),
            (Some(now), None, None)
        );
        assert_eq!(
            entry(HistoryAction::ChartCreated).action_timestamps(now),
            (None, Some(now), None)
        );
        for action in [
            HistoryAction::PdfDownloaded,
            HistoryAction::CsvExported,
            HistoryAction::AnalysisDownloaded,
        ] {
            assert_eq!(entry(action).action_timestamps(now), (None, None, Some(now)));
        }
        assert_eq!(
            entry(HistoryAction::Upload).action_timestamps(now),
            (None, None, None)
        );
    }

    #[test]
    fn test_metadata_from_client() {
        let ctx = ClientContext {
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)".to_string()),
            ip_address: Some("198.51.100.4".to_string()),
            screen_resolution: "1920x1080".to_string(),
            session_id: None,
        };
        let meta = HistoryMetadata::from_client(&ctx);
        assert_eq!(meta.browser.as_deref(), Some("Mozilla"));
        assert_eq!(meta.ip_address.as_deref(), Some("198.51.100.4"));
        assert_eq!(meta.screen_resolution.as_deref(), Some("1920x1080"));
        assert!(meta.chart_count.is_none());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_value(HistoryAction::AnalysisDownloaded).unwrap(),
            "analysis_downloaded"
        );
        assert_eq!(
            serde_json::from_value::<AnalysisType>(serde_json::json!("trend_analysis")).unwrap(),
            AnalysisType::TrendAnalysis
        );
        assert_eq!(HistoryAction::FileDeleted.to_string(), "file_deleted");
    }
}
