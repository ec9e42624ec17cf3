use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::activities::{dtos as activities_dtos, models as activities_models};
use crate::features::admin::{dtos as admin_dtos, handlers as admin_handlers};
use crate::features::analysis::{dtos as analysis_dtos, handlers as analysis_handlers};
use crate::features::auth;
use crate::features::dashboard::{dtos as dashboard_dtos, handlers as dashboard_handlers};
use crate::features::downloads::{dtos as downloads_dtos, handlers as downloads_handlers};
use crate::features::files::{dtos as files_dtos, handlers as files_handlers, models as files_models};
use crate::features::history::{
    dtos as history_dtos, handlers as history_handlers, models as history_models,
};
use crate::features::users::{dtos as users_dtos, handlers::profile_handler};
use crate::modules::charts::ChartType;
use crate::shared::types::{ApiResponse, Meta, PaginationInfo};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::handlers::register,
        auth::handlers::login,
        auth::handlers::get_me,
        // Profile
        profile_handler::get_profile,
        profile_handler::update_profile,
        profile_handler::change_password,
        profile_handler::delete_account,
        // Files
        files_handlers::upload_file,
        files_handlers::list_files,
        files_handlers::get_file,
        files_handlers::reparse_file,
        files_handlers::delete_file,
        // Analysis
        analysis_handlers::generate_chart,
        analysis_handlers::get_analysis_file,
        analysis_handlers::analysis_history,
        analysis_handlers::save_chart,
        analysis_handlers::pdf_data,
        // Downloads
        downloads_handlers::download_pdf,
        downloads_handlers::download_csv,
        downloads_handlers::download_chart,
        // History
        history_handlers::list_history,
        history_handlers::history_stats,
        history_handlers::create_history,
        history_handlers::get_history,
        history_handlers::delete_history,
        history_handlers::file_timeline,
        // Dashboard
        dashboard_handlers::get_stats,
        dashboard_handlers::get_files,
        // Admin
        admin_handlers::get_stats,
        admin_handlers::list_users,
        admin_handlers::update_user_status,
        admin_handlers::change_user_status,
        admin_handlers::list_activities,
    ),
    components(
        schemas(
            // Shared
            Meta,
            PaginationInfo,
            ChartType,
            // Auth
            auth::model::AuthenticatedUser,
            auth::models::UserRole,
            auth::models::UserStatus,
            auth::dtos::RegisterRequestDto,
            auth::dtos::LoginRequestDto,
            auth::dtos::AuthResponseDto,
            auth::dtos::AuthUserDto,
            ApiResponse<auth::dtos::AuthResponseDto>,
            ApiResponse<auth::dtos::AuthUserDto>,
            // Profile
            users_dtos::UserProfileDto,
            users_dtos::UpdateProfileDto,
            users_dtos::ChangePasswordDto,
            users_dtos::DeleteAccountDto,
            users_dtos::DeleteAccountResponseDto,
            ApiResponse<users_dtos::UserProfileDto>,
            ApiResponse<users_dtos::DeleteAccountResponseDto>,
            // Activities
            activities_models::ActivityType,
            activities_dtos::ActivityDto,
            activities_dtos::AdminActivityDto,
            // Files
            files_models::FileStatus,
            files_models::SavedChart,
            files_dtos::UploadFileDto,
            files_dtos::UploadResponseDto,
            files_dtos::FileSummaryDto,
            files_dtos::FileStatsDto,
            files_dtos::FileDetailDto,
            files_dtos::DeleteFileResponseDto,
            ApiResponse<files_dtos::UploadResponseDto>,
            ApiResponse<Vec<files_dtos::FileSummaryDto>>,
            ApiResponse<files_dtos::FileDetailDto>,
            ApiResponse<files_dtos::DeleteFileResponseDto>,
            // Analysis
            analysis_dtos::ChartRequestDto,
            analysis_dtos::ChartResponseDto,
            analysis_dtos::AnalysisFileMetadata,
            analysis_dtos::AnalysisFileDto,
            analysis_dtos::SaveChartDto,
            analysis_dtos::SaveChartResponseDto,
            analysis_dtos::PdfFileStatsDto,
            analysis_dtos::PdfFileDto,
            analysis_dtos::AnalysisStatsDto,
            analysis_dtos::PdfDataDto,
            ApiResponse<analysis_dtos::ChartResponseDto>,
            ApiResponse<analysis_dtos::AnalysisFileDto>,
            ApiResponse<Vec<activities_dtos::ActivityDto>>,
            ApiResponse<analysis_dtos::SaveChartResponseDto>,
            ApiResponse<analysis_dtos::PdfDataDto>,
            // Downloads
            downloads_dtos::PdfDownloadDto,
            downloads_dtos::CsvDownloadDto,
            downloads_dtos::ChartDownloadDto,
            // History
            history_models::HistoryAction,
            history_models::AnalysisType,
            history_models::DownloadFormat,
            history_models::HistoryStatus,
            history_models::SelectedAxes,
            history_models::ChartConfig,
            history_models::AnalysisResults,
            history_models::HistoryMetadata,
            history_dtos::FileHistoryDto,
            history_dtos::HistoryQuery,
            history_dtos::HistoryDateGroup,
            history_dtos::HistoryListResponseDto,
            history_dtos::BreakdownItem,
            history_dtos::FileActivitySummary,
            history_dtos::HistoryTotals,
            history_dtos::HistoryStatsDto,
            history_dtos::CreateHistoryDto,
            history_dtos::TimelineSummary,
            history_dtos::FileTimelineDto,
            ApiResponse<history_dtos::FileHistoryDto>,
            ApiResponse<history_dtos::HistoryListResponseDto>,
            ApiResponse<history_dtos::HistoryStatsDto>,
            ApiResponse<history_dtos::FileTimelineDto>,
            // Dashboard
            dashboard_dtos::FileTotals,
            dashboard_dtos::DashboardStatsDto,
            ApiResponse<dashboard_dtos::DashboardStatsDto>,
            // Admin
            admin_dtos::AdminStatsDto,
            admin_dtos::AdminUserDto,
            admin_dtos::UpdateUserStatusDto,
            ApiResponse<admin_dtos::AdminStatsDto>,
            ApiResponse<Vec<admin_dtos::AdminUserDto>>,
            ApiResponse<admin_dtos::AdminUserDto>,
            ApiResponse<Vec<activities_dtos::AdminActivityDto>>,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and token identity"),
        (name = "profile", description = "Account settings of the signed-in user"),
        (name = "files", description = "Workbook upload and management"),
        (name = "analysis", description = "Chart generation and saved charts"),
        (name = "downloads", description = "PDF, CSV and chart exports"),
        (name = "history", description = "Per-file history and timelines"),
        (name = "Dashboard", description = "Per-user overview"),
        (name = "admin", description = "Admin endpoints (admin role only)"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Sheetlytics API",
        version = "0.1.0",
        description = "API documentation for Sheetlytics",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_feature() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/auth/profile",
            "/api/upload",
            "/api/analysis/chart",
            "/api/download/pdf",
            "/api/history/user",
            "/api/dashboard/stats",
            "/api/admin/users",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
