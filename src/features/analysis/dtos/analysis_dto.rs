use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::activities::dtos::ActivityDto;
use crate::modules::charts::{ChartData, ChartType};
use crate::modules::spreadsheet::{CellValue, SheetData};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChartRequestDto {
    pub file_id: Uuid,
    pub chart_type: ChartType,
    #[validate(length(min = 1, message = "x_axis is required"))]
    pub x_axis: String,
    #[validate(length(min = 1, message = "y_axis is required"))]
    pub y_axis: String,
    /// Sheet name; the first sheet when omitted
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartResponseDto {
    pub chart_type: ChartType,
    pub x_axis: String,
    pub y_axis: String,
    pub sheet_name: String,
    #[schema(value_type = Object)]
    pub chart_data: ChartData,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisFileMetadata {
    pub sheet_name: Option<String>,
    pub rows: i32,
    pub columns: i32,
    pub headers: Vec<String>,
}

/// First sheet of a file, ready for column selection
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalysisFileDto {
    pub id: Uuid,
    pub filename: String,
    pub metadata: AnalysisFileMetadata,
    #[schema(value_type = Vec<Vec<Object>>)]
    pub parsed_data: Vec<Vec<CellValue>>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SaveChartDto {
    pub file_id: Uuid,
    pub chart_type: ChartType,
    pub x_axis: Option<String>,
    pub y_axis: Option<String>,
    #[schema(value_type = Object)]
    pub chart_data: ChartData,
    #[schema(value_type = Option<Object>)]
    pub chart_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SaveChartResponseDto {
    pub file_id: Uuid,
    /// Charts now saved on the file
    pub chart_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PdfFileStatsDto {
    pub total_rows: i32,
    pub total_columns: i32,
    pub total_sheets: usize,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PdfFileDto {
    pub id: Uuid,
    pub original_name: String,
    pub stats: PdfFileStatsDto,
    #[schema(value_type = Vec<Object>)]
    pub sheets: Vec<SheetData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AnalysisStatsDto {
    pub total_analyses: usize,
    /// Distinct chart types, in order of first appearance
    pub chart_types: Vec<String>,
    pub last_analysis: Option<DateTime<Utc>>,
    pub chart_type_usage: BTreeMap<String, usize>,
}

impl AnalysisStatsDto {
    /// Summarise analysis activities ordered newest first
    pub fn from_activities(analyses: &[ActivityDto]) -> Self {
        let mut stats = AnalysisStatsDto {
            total_analyses: analyses.len(),
            last_analysis: analyses.first().map(|a| a.created_at),
            ..Default::default()
        };

        for chart_type in analyses
            .iter()
            .filter_map(|a| a.metadata.get("chart_type").and_then(|v| v.as_str()))
        {
            if !stats.chart_types.iter().any(|t| t == chart_type) {
                stats.chart_types.push(chart_type.to_string());
            }
            *stats
                .chart_type_usage
                .entry(chart_type.to_string())
                .or_insert(0) += 1;
        }

        stats
    }
}

/// Everything needed to build an analysis report for one file
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PdfDataDto {
    pub file: PdfFileDto,
    pub analyses: Vec<ActivityDto>,
    pub chart_history: Vec<ActivityDto>,
    pub analysis_stats: AnalysisStatsDto,
    pub generated_at: DateTime<Utc>,
}
