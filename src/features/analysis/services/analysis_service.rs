use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ClientContext;
use crate::features::activities::dtos::ActivityDto;
use crate::features::activities::models::{ActivityType, NewActivity};
use crate::features::activities::ActivityService;
use crate::features::analysis::dtos::{
    AnalysisFileDto, AnalysisFileMetadata, AnalysisStatsDto, ChartRequestDto, ChartResponseDto,
    PdfDataDto, PdfFileDto, PdfFileStatsDto, SaveChartDto, SaveChartResponseDto,
};
use crate::features::files::models::SavedChart;
use crate::features::files::FileService;
use crate::features::history::models::{
    ChartConfig, HistoryAction, HistoryMetadata, NewHistoryEntry, SelectedAxes,
};
use crate::features::history::HistoryService;
use crate::modules::charts::project_chart;
use crate::shared::constants::PDF_CHART_HISTORY_LIMIT;

/// Chart projection and analysis bookkeeping over stored workbooks
pub struct AnalysisService {
    files: Arc<FileService>,
    activities: Arc<ActivityService>,
    history: Arc<HistoryService>,
}

impl AnalysisService {
    pub fn new(
        files: Arc<FileService>,
        activities: Arc<ActivityService>,
        history: Arc<HistoryService>,
    ) -> Self {
        Self {
            files,
            activities,
            history,
        }
    }

    /// Project two columns of a sheet into chart data and log it
    pub async fn generate_chart(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        dto: ChartRequestDto,
    ) -> Result<ChartResponseDto> {
        let file = self.files.get_owned(user_id, dto.file_id).await?;

        let sheet = file
            .sheet(dto.sheet.as_deref())
            .ok_or_else(|| match &dto.sheet {
                Some(name) => AppError::BadRequest(format!("Sheet '{}' not found", name)),
                None => AppError::BadRequest("Selected columns not found".to_string()),
            })?;

        let (x_index, y_index) = match (
            sheet.column_index(&dto.x_axis),
            sheet.column_index(&dto.y_axis),
        ) {
            (Some(x), Some(y)) => (x, y),
            _ => {
                return Err(AppError::BadRequest(
                    "Selected columns not found".to_string(),
                ))
            }
        };

        let chart_data = project_chart(&sheet.data, x_index, y_index, dto.chart_type)?;
        let sheet_name = sheet.name.clone();

        let activity = self
            .activities
            .log(
                NewActivity::new(
                    user_id,
                    ActivityType::Analysis,
                    format!(
                        "{} chart generated for {} ({} vs {})",
                        dto.chart_type, file.original_name, dto.x_axis, dto.y_axis
                    ),
                )
                .file(file.id)
                .metadata(json!({
                    "chart_type": dto.chart_type,
                    "x_axis": dto.x_axis,
                    "y_axis": dto.y_axis,
                    "sheet": sheet_name,
                    "chart_data": chart_data,
                })),
            )
            .await?;

        let mut entry =
            NewHistoryEntry::new(user_id, file.id, &file.original_name, HistoryAction::ChartCreated);
        entry.chart_type = Some(dto.chart_type);
        entry.selected_axes = Some(SelectedAxes {
            x_axis: Some(dto.x_axis.clone()),
            y_axis: Some(dto.y_axis.clone()),
            z_axis: None,
        });
        entry.chart_config = Some(ChartConfig {
            title: Some(format!("{} vs {}", dto.y_axis, dto.x_axis)),
            ..Default::default()
        });
        entry.chart_id = Some(activity.id.to_string());
        entry.file_size = Some(file.file_size);
        entry.row_count = Some(file.row_count);
        entry.column_count = Some(file.column_count);
        entry.session_id = ctx.session_id.clone();
        entry.metadata = HistoryMetadata::from_client(ctx);
        entry.tags = vec!["chart".to_string(), dto.chart_type.to_string()];
        self.history.record(entry).await?;

        info!(
            "Chart generated: file={}, type={}, labels={}",
            file.id,
            dto.chart_type,
            chart_data.labels.len()
        );

        Ok(ChartResponseDto {
            chart_type: dto.chart_type,
            x_axis: dto.x_axis,
            y_axis: dto.y_axis,
            sheet_name,
            chart_data,
        })
    }

    pub async fn file_for_analysis(&self, user_id: Uuid, file_id: Uuid) -> Result<AnalysisFileDto> {
        let file = self.files.get_owned(user_id, file_id).await?;
        let first = file.sheet(None);

        Ok(AnalysisFileDto {
            id: file.id,
            filename: file.original_name.clone(),
            metadata: AnalysisFileMetadata {
                sheet_name: first.map(|s| s.name.clone()),
                rows: file.row_count,
                columns: file.column_count,
                headers: file.column_headers.0.clone(),
            },
            parsed_data: first.map(|s| s.data.clone()).unwrap_or_default(),
        })
    }

    /// The caller's analysis activities for a file, newest first
    pub async fn history(&self, user_id: Uuid, file_id: Uuid) -> Result<Vec<ActivityDto>> {
        let rows = self
            .activities
            .list_for_file(user_id, file_id, &[ActivityType::Analysis], None)
            .await?;
        Ok(rows.into_iter().map(ActivityDto::from).collect())
    }

    pub async fn save_chart(&self, user_id: Uuid, dto: SaveChartDto) -> Result<SaveChartResponseDto> {
        let chart = SavedChart {
            chart_type: dto.chart_type,
            x_axis: dto.x_axis,
            y_axis: dto.y_axis,
            data: dto.chart_data,
            config: dto.chart_config,
            created_at: Utc::now(),
        };
        let activity_metadata = json!({
            "chart_type": chart.chart_type,
            "x_axis": chart.x_axis,
            "y_axis": chart.y_axis,
            "chart_data": chart.data,
            "chart_config": chart.config,
        });

        let file = self.files.append_chart(user_id, dto.file_id, chart).await?;

        self.activities
            .log(
                NewActivity::new(
                    user_id,
                    ActivityType::Analysis,
                    format!("Chart analysis saved for {}", file.original_name),
                )
                .file(file.id)
                .metadata(activity_metadata),
            )
            .await?;

        Ok(SaveChartResponseDto {
            file_id: file.id,
            chart_count: file.charts.len(),
        })
    }

    /// File stats, sheets and analysis history for report generation
    pub async fn pdf_data(&self, user_id: Uuid, file_id: Uuid) -> Result<PdfDataDto> {
        let file = self.files.get_owned(user_id, file_id).await?;

        let analyses = self.history(user_id, file.id).await?;
        let chart_history = self
            .activities
            .list_for_file(
                user_id,
                file.id,
                &[ActivityType::Analysis],
                Some(PDF_CHART_HISTORY_LIMIT),
            )
            .await?
            .into_iter()
            .map(ActivityDto::from)
            .collect();
        let analysis_stats = AnalysisStatsDto::from_activities(&analyses);

        Ok(PdfDataDto {
            file: PdfFileDto {
                id: file.id,
                original_name: file.original_name,
                stats: PdfFileStatsDto {
                    total_rows: file.row_count,
                    total_columns: file.column_count,
                    total_sheets: file.sheets.len(),
                    file_size: file.file_size,
                    upload_date: file.created_at,
                    last_modified: file.updated_at,
                },
                sheets: file.sheets.0,
            },
            analyses,
            chart_history,
            analysis_stats,
            generated_at: Utc::now(),
        })
    }
}
