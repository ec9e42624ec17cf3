use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ClientContext;
use crate::features::activities::models::{ActivityType, NewActivity};
use crate::features::activities::ActivityService;
use crate::features::downloads::dtos::{
    download_file_name, ChartDownloadDto, CsvDownloadDto, DownloadKind, DownloadPayload,
    PdfDownloadDto,
};
use crate::features::files::models::File;
use crate::features::files::FileService;
use crate::features::history::models::{
    DownloadFormat, HistoryAction, HistoryMetadata, NewHistoryEntry,
};
use crate::features::history::HistoryService;
use crate::modules::charts::{check_renderable, render_svg, ChartData, ChartType};
use crate::modules::export::{export_csv, json_lines, render_pdf, PdfReport, ReportSection};

/// Chart points listed in a PDF report
const PDF_CHART_POINTS: usize = 50;

/// How a download is recorded in history
struct DownloadRecord {
    action: HistoryAction,
    format: DownloadFormat,
    chart_type: Option<ChartType>,
    tags: Vec<String>,
    chart_count: i64,
    analysis_count: i64,
}

/// Renders exports and records every download
pub struct DownloadService {
    files: Arc<FileService>,
    activities: Arc<ActivityService>,
    history: Arc<HistoryService>,
}

impl DownloadService {
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

    pub async fn pdf(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        dto: PdfDownloadDto,
    ) -> Result<DownloadPayload> {
        let file = self.files.get_owned(user_id, dto.file_id).await?;

        let report = build_report(
            &file,
            dto.file_name.as_deref(),
            dto.chart_data.as_ref(),
            dto.analysis_data.as_ref(),
        );
        let bytes = tokio::task::spawn_blocking(move || render_pdf(&report))
            .await
            .map_err(|e| AppError::Internal(format!("PDF rendering task failed: {}", e)))??;

        let payload = DownloadPayload {
            file_name: download_file_name(
                dto.file_name.as_deref(),
                file.base_name(),
                DownloadKind::Analysis,
                Utc::now().timestamp_millis(),
                DownloadFormat::Pdf.extension(),
            ),
            content_type: "application/pdf",
            bytes,
        };

        self.record(
            user_id,
            ctx,
            &file,
            &payload,
            DownloadRecord {
                action: HistoryAction::AnalysisDownloaded,
                format: DownloadFormat::Pdf,
                chart_type: None,
                tags: vec!["pdf_download".to_string(), "analysis_export".to_string()],
                chart_count: i64::from(dto.chart_data.is_some()),
                analysis_count: 1,
            },
        )
        .await?;

        Ok(payload)
    }

    pub async fn csv(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        dto: CsvDownloadDto,
    ) -> Result<DownloadPayload> {
        let file = self.files.get_owned(user_id, dto.file_id).await?;
        let sheet = file
            .sheet(None)
            .ok_or_else(|| AppError::BadRequest("File has no data to export".to_string()))?;

        let bytes = export_csv(sheet, &dto.selected_columns)?;
        let payload = DownloadPayload {
            file_name: download_file_name(
                dto.file_name.as_deref(),
                file.base_name(),
                DownloadKind::Export,
                Utc::now().timestamp_millis(),
                DownloadFormat::Csv.extension(),
            ),
            content_type: "text/csv; charset=utf-8",
            bytes,
        };

        self.record(
            user_id,
            ctx,
            &file,
            &payload,
            DownloadRecord {
                action: HistoryAction::CsvExported,
                format: DownloadFormat::Csv,
                chart_type: None,
                tags: vec!["csv_export".to_string(), "data_export".to_string()],
                chart_count: 0,
                analysis_count: 0,
            },
        )
        .await?;

        Ok(payload)
    }

    pub async fn chart(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        dto: ChartDownloadDto,
    ) -> Result<DownloadPayload> {
        let file = self.files.get_owned(user_id, dto.file_id).await?;
        check_renderable(&dto.chart_data, dto.chart_type)?;

        let title = format!("{} chart - {}", dto.chart_type, file.original_name);
        let chart_type = dto.chart_type;
        let chart_data = dto.chart_data;
        let svg = tokio::task::spawn_blocking(move || render_svg(&chart_data, chart_type, &title))
            .await
            .map_err(|e| AppError::Internal(format!("Chart rendering task failed: {}", e)))??;

        let format = DownloadFormat::Svg;
        let payload = DownloadPayload {
            file_name: download_file_name(
                dto.file_name.as_deref(),
                file.base_name(),
                DownloadKind::Chart(chart_type),
                Utc::now().timestamp_millis(),
                format.extension(),
            ),
            content_type: "image/svg+xml",
            bytes: svg.into_bytes(),
        };

        self.record(
            user_id,
            ctx,
            &file,
            &payload,
            DownloadRecord {
                action: HistoryAction::AnalysisDownloaded,
                format,
                chart_type: Some(chart_type),
                tags: vec![
                    "chart_download".to_string(),
                    format!("{}_export", format.extension()),
                    chart_type.to_string(),
                ],
                chart_count: 1,
                analysis_count: 1,
            },
        )
        .await?;

        Ok(payload)
    }

    async fn record(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        file: &File,
        payload: &DownloadPayload,
        record: DownloadRecord,
    ) -> Result<()> {
        let size = payload.bytes.len() as i64;

        let mut entry = NewHistoryEntry::new(user_id, file.id, &file.original_name, record.action);
        entry.chart_type = record.chart_type;
        entry.download_format = Some(record.format);
        entry.download_url = Some(format!("/downloads/{}", payload.file_name));
        entry.download_file_name = Some(payload.file_name.clone());
        entry.download_size = Some(size);
        entry.file_size = Some(file.file_size);
        entry.row_count = Some(file.row_count);
        entry.column_count = Some(file.column_count);
        entry.session_id = ctx.session_id.clone();
        entry.metadata = HistoryMetadata {
            time_spent: Some(0),
            chart_count: Some(record.chart_count),
            download_count: Some(1),
            analysis_count: Some(record.analysis_count),
            ..HistoryMetadata::from_client(ctx)
        };
        entry.tags = record.tags;
        self.history.record(entry).await?;

        self.activities
            .log(
                NewActivity::new(
                    user_id,
                    ActivityType::Download,
                    format!(
                        "{} downloaded as {}",
                        file.original_name,
                        record.format.extension().to_uppercase()
                    ),
                )
                .file(file.id)
                .metadata(json!({
                    "file_name": payload.file_name,
                    "format": record.format,
                    "size": size,
                })),
            )
            .await?;

        info!(
            "Download served: file={}, name={}, bytes={}",
            file.id, payload.file_name, size
        );
        Ok(())
    }
}

fn build_report(
    file: &File,
    requested_name: Option<&str>,
    chart_data: Option<&ChartData>,
    analysis_data: Option<&serde_json::Value>,
) -> PdfReport {
    let display_name = requested_name
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(&file.original_name);

    let mut sections = vec![ReportSection {
        heading: "File overview".to_string(),
        lines: vec![
            format!("File: {}", file.original_name),
            format!("Rows: {}", file.row_count),
            format!("Columns: {}", file.column_count),
            format!("Sheets: {}", file.sheets.len()),
            format!("Size: {} bytes", file.file_size),
            format!("Uploaded: {}", file.created_at.format("%Y-%m-%d %H:%M UTC")),
        ],
    }];

    if !file.column_headers.is_empty() {
        sections.push(ReportSection {
            heading: "Columns".to_string(),
            lines: vec![file.column_headers.join(", ")],
        });
    }

    if let Some(chart) = chart_data {
        let values = chart.values();
        let mut lines: Vec<String> = values
            .iter()
            .take(PDF_CHART_POINTS)
            .enumerate()
            .map(|(i, v)| format!("{}: {}", chart.label_at(i), v))
            .collect();
        if values.len() > PDF_CHART_POINTS {
            lines.push(format!("... {} more points", values.len() - PDF_CHART_POINTS));
        }
        sections.push(ReportSection {
            heading: "Chart data".to_string(),
            lines,
        });
    }

    if let Some(analysis) = analysis_data {
        sections.push(ReportSection {
            heading: "Analysis".to_string(),
            lines: json_lines(analysis),
        });
    }

    PdfReport {
        title: format!("Analysis report: {}", display_name),
        subtitle: Some(format!(
            "Generated {}",
            Utc::now().format("%Y-%m-%d %H:%M UTC")
        )),
        sections,
    }
}
