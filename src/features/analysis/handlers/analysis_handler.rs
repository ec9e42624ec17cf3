use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientContext};
use crate::features::activities::dtos::ActivityDto;
use crate::features::analysis::dtos::{
    AnalysisFileDto, ChartRequestDto, ChartResponseDto, PdfDataDto, SaveChartDto,
    SaveChartResponseDto,
};
use crate::features::analysis::services::AnalysisService;
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::types::{ApiResponse, Meta};
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// Project two columns into chart data
#[utoipa::path(
    post,
    path = "/api/analysis/chart",
    request_body = ChartRequestDto,
    responses(
        (status = 200, description = "Chart generated", body = ApiResponse<ChartResponseDto>),
        (status = 400, description = "Unknown column, sheet or chart type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "analysis",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn generate_chart(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<AnalysisService>>,
    AppJson(dto): AppJson<ChartRequestDto>,
) -> Result<Json<ApiResponse<ChartResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let chart = service.generate_chart(user.user_id, &ctx, dto).await?;
    let message = format!("{} chart generated successfully", chart.chart_type);
    Ok(Json(ApiResponse::success(Some(chart), Some(message), None)))
}

/// First sheet of a file with its metadata
#[utoipa::path(
    get,
    path = "/api/analysis/{file_id}",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File data retrieved", body = ApiResponse<AnalysisFileDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "analysis",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_analysis_file(
    user: AuthenticatedUser,
    State(service): State<Arc<AnalysisService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<AnalysisFileDto>>> {
    let file = service.file_for_analysis(user.user_id, file_id).await?;
    Ok(Json(ApiResponse::success(Some(file), None, None)))
}

/// Analysis activities for a file
#[utoipa::path(
    get,
    path = "/api/analysis/history/{file_id}",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Analysis history retrieved", body = ApiResponse<Vec<ActivityDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "analysis",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn analysis_history(
    user: AuthenticatedUser,
    State(service): State<Arc<AnalysisService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ActivityDto>>>> {
    let analyses = service.history(user.user_id, file_id).await?;
    let total = analyses.len() as i64;
    Ok(Json(ApiResponse::success(
        Some(analyses),
        None,
        Some(Meta { total }),
    )))
}

/// Keep a chart on the file
#[utoipa::path(
    post,
    path = "/api/analysis/save-chart",
    request_body = SaveChartDto,
    responses(
        (status = 200, description = "Chart saved", body = ApiResponse<SaveChartResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "analysis",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn save_chart(
    user: AuthenticatedUser,
    State(service): State<Arc<AnalysisService>>,
    AppJson(dto): AppJson<SaveChartDto>,
) -> Result<Json<ApiResponse<SaveChartResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let saved = service.save_chart(user.user_id, dto).await?;
    Ok(Json(ApiResponse::success(
        Some(saved),
        Some("Chart analysis saved successfully".to_string()),
        None,
    )))
}

/// Data for building an analysis report
#[utoipa::path(
    get,
    path = "/api/analysis/pdf-data/{file_id}",
    params(
        ("file_id" = Uuid, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "Report data retrieved", body = ApiResponse<PdfDataDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "analysis",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn pdf_data(
    user: AuthenticatedUser,
    State(service): State<Arc<AnalysisService>>,
    Path(file_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PdfDataDto>>> {
    let data = service.pdf_data(user.user_id, file_id).await?;
    Ok(Json(ApiResponse::success(Some(data), None, None)))
}
