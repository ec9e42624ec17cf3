use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::history::models::{
    AnalysisResults, AnalysisType, ChartConfig, DownloadFormat, FileHistory, HistoryAction,
    HistoryMetadata, HistoryStatus, SelectedAxes,
};
use crate::modules::charts::ChartType;
use crate::shared::constants::{HISTORY_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::types::PaginationInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileHistoryDto {
    pub id: Uuid,
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
    pub analysis_time: Option<DateTime<Utc>>,
    pub download_time: Option<DateTime<Utc>>,
    pub chart_creation_time: Option<DateTime<Utc>>,
    pub session_id: Option<String>,
    pub metadata: HistoryMetadata,
    pub related_activities: Vec<Uuid>,
    pub tags: Vec<String>,
    pub status: HistoryStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<FileHistory> for FileHistoryDto {
    fn from(h: FileHistory) -> Self {
        Self {
            id: h.id,
            user_id: h.user_id,
            file_id: h.file_id,
            file_name: h.file_name,
            action: h.action,
            chart_type: h.chart_type,
            selected_axes: h.selected_axes.map(|j| j.0),
            chart_config: h.chart_config.map(|j| j.0),
            chart_id: h.chart_id,
            analysis_type: h.analysis_type,
            analysis_results: h.analysis_results.map(|j| j.0),
            analysis_id: h.analysis_id,
            download_format: h.download_format,
            download_url: h.download_url,
            download_file_name: h.download_file_name,
            download_size: h.download_size,
            file_size: h.file_size,
            row_count: h.row_count,
            column_count: h.column_count,
            analysis_time: h.analysis_time,
            download_time: h.download_time,
            chart_creation_time: h.chart_creation_time,
            session_id: h.session_id,
            metadata: h.metadata.0,
            related_activities: h.related_activities,
            tags: h.tags,
            status: h.status,
            error_message: h.error_message,
            created_at: h.created_at,
        }
    }
}

/// Filters for the caller's history listing
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
pub struct HistoryQuery {
    /// Page number (1-indexed, default: 1)
    pub page: Option<i64>,
    /// Entries per page (default: 20)
    pub limit: Option<i64>,
    pub action: Option<HistoryAction>,
    pub chart_type: Option<ChartType>,
    pub download_format: Option<DownloadFormat>,
    pub analysis_type: Option<AnalysisType>,
    /// Case-insensitive substring of the file name
    pub file_name: Option<String>,
    /// First day included (YYYY-MM-DD)
    pub date_from: Option<NaiveDate>,
    /// Last day included (YYYY-MM-DD)
    pub date_to: Option<NaiveDate>,
}

impl HistoryQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(HISTORY_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    /// Trimmed file name filter, if any
    pub fn file_name_filter(&self) -> Option<&str> {
        self.file_name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Whole-day UTC bounds: inclusive start, exclusive end
    pub fn created_bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), AppError> {
        let start_of = |d: NaiveDate| Utc.from_utc_datetime(&d.and_time(NaiveTime::MIN));
        let end = match self.date_to {
            Some(d) => Some(
                d.succ_opt()
                    .map(start_of)
                    .ok_or_else(|| AppError::BadRequest("date_to is out of range".to_string()))?,
            ),
            None => None,
        };
        Ok((self.date_from.map(start_of), end))
    }
}

/// Entries created on one calendar day
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryDateGroup {
    pub date: NaiveDate,
    pub entries: Vec<FileHistoryDto>,
}

/// Groups entries already ordered newest first, keeping that order
pub fn group_by_date(entries: Vec<FileHistoryDto>) -> Vec<HistoryDateGroup> {
    let mut groups: Vec<HistoryDateGroup> = Vec::new();
    for entry in entries {
        let date = entry.created_at.date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.entries.push(entry),
            _ => groups.push(HistoryDateGroup {
                date,
                entries: vec![entry],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryListResponseDto {
    pub history: Vec<HistoryDateGroup>,
    pub pagination: PaginationInfo,
    pub filters: HistoryQuery,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct BreakdownItem {
    pub key: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct FileActivitySummary {
    pub file_id: Uuid,
    pub file_name: String,
    pub total_actions: i64,
    pub chart_count: i64,
    pub download_count: i64,
    pub analysis_count: i64,
    pub last_activity: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, FromRow, ToSchema)]
pub struct HistoryTotals {
    pub total_actions: i64,
    pub total_files: i64,
    pub total_charts: i64,
    pub total_downloads: i64,
    pub total_analyses: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HistoryStatsDto {
    pub total_actions: i64,
    pub total_files: i64,
    pub total_charts: i64,
    pub total_downloads: i64,
    pub total_analyses: i64,
    pub action_breakdown: Vec<BreakdownItem>,
    pub chart_type_breakdown: Vec<BreakdownItem>,
    pub download_format_breakdown: Vec<BreakdownItem>,
    pub analysis_type_breakdown: Vec<BreakdownItem>,
    /// Latest entries of the last seven days
    pub recent_activity: Vec<FileHistoryDto>,
    /// Most recently active files
    pub file_activity_summary: Vec<FileActivitySummary>,
}

/// Client-supplied history entry
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateHistoryDto {
    pub file_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "File name is required"))]
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
    #[validate(range(min = 0))]
    pub download_size: Option<i64>,
    #[validate(range(min = 0))]
    pub file_size: Option<i64>,
    #[validate(range(min = 0))]
    pub row_count: Option<i32>,
    #[validate(range(min = 0))]
    pub column_count: Option<i32>,
    pub session_id: Option<String>,
    /// Seconds spent on the action
    pub time_spent: Option<i64>,
    #[serde(default)]
    pub related_activities: Vec<Uuid>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: Option<HistoryStatus>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TimelineSummary {
    pub uploads: Vec<FileHistoryDto>,
    pub analyses: Vec<FileHistoryDto>,
    pub charts: Vec<FileHistoryDto>,
    pub downloads: Vec<FileHistoryDto>,
    pub deletions: Vec<FileHistoryDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileTimelineDto {
    pub file_history: Vec<FileHistoryDto>,
    pub activity_summary: TimelineSummary,
    pub total_actions: usize,
    pub chart_count: usize,
    pub download_count: usize,
    pub analysis_count: usize,
}

impl FileTimelineDto {
    /// Builds the timeline from entries ordered oldest first
    pub fn from_entries(entries: Vec<FileHistoryDto>) -> Self {
        let mut summary = TimelineSummary::default();
        for entry in &entries {
            let bucket = match entry.action {
                HistoryAction::Upload => &mut summary.uploads,
                HistoryAction::Analysis => &mut summary.analyses,
                HistoryAction::ChartCreated => &mut summary.charts,
                HistoryAction::FileDeleted => &mut summary.deletions,
                HistoryAction::PdfDownloaded
                | HistoryAction::CsvExported
                | HistoryAction::AnalysisDownloaded => &mut summary.downloads,
            };
            bucket.push(entry.clone());
        }

        Self {
            total_actions: entries.len(),
            chart_count: summary.charts.len(),
            download_count: summary.downloads.len(),
            analysis_count: summary.analyses.len(),
            activity_summary: summary,
            file_history: entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(action: HistoryAction, created_at: DateTime<Utc>) -> FileHistoryDto {
        FileHistoryDto {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            file_id: Uuid::nil(),
            file_name: "sales.xlsx".to_string(),
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
            analysis_time: None,
            download_time: None,
            chart_creation_time: None,
            session_id: None,
            metadata: HistoryMetadata::default(),
            related_activities: vec![],
            tags: vec![],
            status: HistoryStatus::Completed,
            error_message: None,
            created_at,
        }
    }

    #[test]
    fn test_group_by_date_keeps_order() {
        let day2 = Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap();
        let day2_early = Utc.with_ymd_and_hms(2025, 6, 2, 8, 0, 0).unwrap();
        let day1 = Utc.with_ymd_and_hms(2025, 6, 1, 23, 59, 0).unwrap();

        let groups = group_by_date(vec![
            entry(HistoryAction::Analysis, day2),
            entry(HistoryAction::Upload, day2_early),
            entry(HistoryAction::Upload, day1),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].date, NaiveDate::from_ymd_opt(2025, 6, 2).unwrap());
        assert_eq!(groups[0].entries.len(), 2);
        assert_eq!(groups[1].date, NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert!(group_by_date(vec![]).is_empty());
    }

    #[test]
    fn test_created_bounds_cover_whole_days() {
        let query = HistoryQuery {
            date_from: NaiveDate::from_ymd_opt(2025, 6, 1),
            date_to: NaiveDate::from_ymd_opt(2025, 6, 3),
            ..Default::default()
        };
        let (from, to) = query.created_bounds().unwrap();
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()));
        assert_eq!(to, Some(Utc.with_ymd_and_hms(2025, 6, 4, 0, 0, 0).unwrap()));

        assert_eq!(HistoryQuery::default().created_bounds().unwrap(), (None, None));
    }

    #[test]
    fn test_created_bounds_reject_last_representable_day() {
        let query = HistoryQuery {
            date_to: Some(NaiveDate::MAX),
            ..Default::default()
        };
        assert!(matches!(query.created_bounds(), Err(AppError::BadRequest(_))));

        let query = HistoryQuery {
            date_from: Some(NaiveDate::MAX),
            ..Default::default()
        };
        assert!(query.created_bounds().unwrap().0.is_some());
    }

    #[test]
    fn test_offset_saturates_on_huge_pages() {
        let query = HistoryQuery {
            page: Some(i64::MAX),
            limit: Some(MAX_PAGE_SIZE),
            ..Default::default()
        };
        assert_eq!(query.offset(), i64::MAX);
    }

    #[test]
    fn test_query_paging_defaults() {
        let query = HistoryQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), HISTORY_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = HistoryQuery {
            page: Some(3),
            limit: Some(500),
            file_name: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 2 * MAX_PAGE_SIZE);
        assert!(query.file_name_filter().is_none());
    }

    #[test]
    fn test_timeline_buckets() {
        let t = Utc::now();
        let timeline = FileTimelineDto::from_entries(vec![
            entry(HistoryAction::Upload, t),
            entry(HistoryAction::Analysis, t),
            entry(HistoryAction::ChartCreated, t),
            entry(HistoryAction::PdfDownloaded, t),
            entry(HistoryAction::CsvExported, t),
            entry(HistoryAction::AnalysisDownloaded, t),
        ]);

        assert_eq!(timeline.total_actions, 6);
        assert_eq!(timeline.download_count, 3);
        assert_eq!(timeline.chart_count, 1);
        assert_eq!(timeline.analysis_count, 1);
        assert_eq!(timeline.activity_summary.uploads.len(), 1);
        assert!(timeline.activity_summary.deletions.is_empty());
    }
}
