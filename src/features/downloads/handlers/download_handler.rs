use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, ClientContext};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::downloads::dtos::{
    ChartDownloadDto, CsvDownloadDto, DownloadPayload, PdfDownloadDto,
};
use crate::features::downloads::services::DownloadService;
use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use validator::Validate;

impl IntoResponse for DownloadPayload {
    fn into_response(self) -> Response {
        let ascii_name: String = self
            .file_name
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        let disposition = format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            ascii_name,
            urlencoding::encode(&self.file_name)
        );
        let disposition = HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

        (
            [
                (header::CONTENT_TYPE, HeaderValue::from_static(self.content_type)),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Download an analysis report as PDF
#[utoipa::path(
    post,
    path = "/api/download/pdf",
    request_body = PdfDownloadDto,
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf"),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "downloads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_pdf(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<DownloadService>>,
    AppJson(dto): AppJson<PdfDownloadDto>,
) -> Result<DownloadPayload> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    service.pdf(user.user_id, &ctx, dto).await
}

/// Export the first sheet as CSV
#[utoipa::path(
    post,
    path = "/api/download/csv",
    request_body = CsvDownloadDto,
    responses(
        (status = 200, description = "CSV export", content_type = "text/csv"),
        (status = 400, description = "Unknown column or empty file"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "downloads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_csv(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<DownloadService>>,
    AppJson(dto): AppJson<CsvDownloadDto>,
) -> Result<DownloadPayload> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    service.csv(user.user_id, &ctx, dto).await
}

/// Download a chart as an SVG image
#[utoipa::path(
    post,
    path = "/api/download/chart",
    request_body = ChartDownloadDto,
    responses(
        (status = 200, description = "Chart image", content_type = "image/svg+xml"),
        (status = 400, description = "Validation error or unsupported chart"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    tag = "downloads",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn download_chart(
    user: AuthenticatedUser,
    ctx: ClientContext,
    State(service): State<Arc<DownloadService>>,
    AppJson(dto): AppJson<ChartDownloadDto>,
) -> Result<DownloadPayload> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    service.chart(user.user_id, &ctx, dto).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_response_headers() {
        let response = DownloadPayload {
            file_name: "sales_export_1.csv".to_string(),
            content_type: "text/csv; charset=utf-8",
            bytes: b"Month,Revenue\n".to_vec(),
        }
        .into_response();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"sales_export_1.csv\"; filename*=UTF-8''sales_export_1.csv"
        );
    }

    #[test]
    fn test_payload_non_ascii_name_is_encoded() {
        let response = DownloadPayload {
            file_name: "ventes_été_export_1.csv".to_string(),
            content_type: "text/csv; charset=utf-8",
            bytes: vec![],
        }
        .into_response();

        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ventes__t__export_1.csv\"; \
             filename*=UTF-8''ventes_%C3%A9t%C3%A9_export_1.csv"
        );
    }
}
