use serde_json::json;
use sqlx::{types::Json, PgPool};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::config::UploadConfig;
use crate::core::error::{AppError, Result};
use crate::core::extractor::ClientContext;
use crate::features::activities::models::{ActivityType, NewActivity};
use crate::features::activities::ActivityService;
use crate::features::files::dtos::{
    file_extension, DeleteFileResponseDto, FileDetailDto, FileSummaryDto, UploadResponseDto,
};
use crate::features::files::models::{
    File, FileStatus, SavedChart, FILE_COLUMNS, FILE_SUMMARY_COLUMNS,
};
use crate::features::history::models::{HistoryAction, HistoryMetadata, NewHistoryEntry};
use crate::features::history::HistoryService;
use crate::modules::spreadsheet::{parse_workbook_blocking, ParsedWorkbook};
use crate::modules::storage::ObjectStorage;

/// Upload, parse and manage a user's workbooks
pub struct FileService {
    pool: PgPool,
    storage: Arc<dyn ObjectStorage>,
    activities: Arc<ActivityService>,
    history: Arc<HistoryService>,
    config: UploadConfig,
}

impl FileService {
    pub fn new(
        pool: PgPool,
        storage: Arc<dyn ObjectStorage>,
        activities: Arc<ActivityService>,
        history: Arc<HistoryService>,
        config: UploadConfig,
    ) -> Self {
        Self {
            pool,
            storage,
            activities,
            history,
            config,
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.config.max_file_size
    }

    /// Parse a workbook, store the raw bytes and persist the parsed form
    pub async fn upload(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        data: Vec<u8>,
        original_name: &str,
        content_type: &str,
    ) -> Result<UploadResponseDto> {
        let file_size = data.len() as i64;

        let (parsed, data) = match parse_workbook_blocking(data, self.config.sample_rows).await {
            Ok(parsed) => parsed,
            Err(e) => {
                self.log_error_activity(
                    user_id,
                    None,
                    format!("Failed to parse {}: {}", original_name, e),
                )
                .await;
                return Err(e);
            }
        };

        let file_id = Uuid::new_v4();
        let extension = file_extension(original_name).unwrap_or_else(|| "bin".to_string());
        let storage_key = self
            .storage
            .generate_key(&format!("spreadsheets/{}/{}.{}", user_id, file_id, extension));
        let storage_url = self
            .storage
            .upload(&storage_key, data, content_type)
            .await?;

        let file = match self
            .insert_file(
                file_id,
                user_id,
                original_name,
                &storage_key,
                &storage_url,
                content_type,
                file_size,
                &parsed,
            )
            .await
        {
            Ok(file) => file,
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(&storage_key).await {
                    warn!("Failed to remove orphaned upload {}: {}", storage_key, cleanup);
                }
                return Err(e);
            }
        };

        info!(
            "File uploaded: id={}, user={}, rows={}, columns={}, backend={}",
            file.id,
            user_id,
            file.row_count,
            file.column_count,
            self.storage.backend_name()
        );

        // The file row is committed; a missing trail entry must not fail the upload
        let activity = NewActivity::new(
            user_id,
            ActivityType::Upload,
            format!(
                "{} uploaded successfully ({} rows, {} columns)",
                original_name, file.row_count, file.column_count
            ),
        )
        .file(file.id)
        .metadata(json!({
            "filename": original_name,
            "size": file_size,
            "rows": file.row_count,
            "columns": file.column_count,
        }));
        if let Err(e) = self.activities.log(activity).await {
            warn!("Failed to log upload activity for file {}: {}", file.id, e);
        }

        let mut entry = NewHistoryEntry::new(user_id, file.id, original_name, HistoryAction::Upload);
        entry.file_size = Some(file_size);
        entry.row_count = Some(file.row_count);
        entry.column_count = Some(file.column_count);
        entry.session_id = ctx.session_id.clone();
        entry.metadata = HistoryMetadata::from_client(ctx);
        entry.tags = vec!["upload".to_string(), extension];
        if let Err(e) = self.history.record(entry).await {
            warn!("Failed to record upload history for file {}: {}", file.id, e);
        }

        Ok(UploadResponseDto {
            file_id: file.id,
            file: file.original_name,
            rows: file.row_count,
            columns: file.column_count,
            headers: file.column_headers.0,
            sheet_count: file.sheets.len(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn insert_file(
        &self,
        file_id: Uuid,
        user_id: Uuid,
        original_name: &str,
        storage_key: &str,
        storage_url: &str,
        content_type: &str,
        file_size: i64,
        parsed: &ParsedWorkbook,
    ) -> Result<File> {
        let file = sqlx::query_as::<_, File>(&format!(
            r#"
            INSERT INTO files (
                id, user_id, original_name, storage_key, storage_url, content_type, file_size,
                row_count, column_count, column_headers, sample_data, sheets, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(file_id)
        .bind(user_id)
        .bind(original_name)
        .bind(storage_key)
        .bind(storage_url)
        .bind(content_type)
        .bind(file_size)
        .bind(parsed.row_count as i32)
        .bind(parsed.column_count as i32)
        .bind(Json(&parsed.column_headers))
        .bind(Json(&parsed.sample_data))
        .bind(Json(&parsed.sheets))
        .bind(FileStatus::Uploaded)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save file: {:?}", e);
            AppError::Database(e)
        })?;

        Ok(file)
    }

    /// Caller's files, newest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<FileSummaryDto>> {
        let files = sqlx::query_as::<_, FileSummaryDto>(&format!(
            "SELECT {} FROM files WHERE user_id = $1 ORDER BY created_at DESC",
            FILE_SUMMARY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }

    /// Load a file the caller owns; foreign ids are reported as missing
    pub async fn get_owned(&self, user_id: Uuid, file_id: Uuid) -> Result<File> {
        sqlx::query_as::<_, File>(&format!(
            "SELECT {} FROM files WHERE id = $1 AND user_id = $2",
            FILE_COLUMNS
        ))
        .bind(file_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    pub async fn detail(&self, user_id: Uuid, file_id: Uuid) -> Result<FileDetailDto> {
        Ok(self.get_owned(user_id, file_id).await?.into())
    }

    /// Download the stored bytes and parse them again
    pub async fn reparse(&self, user_id: Uuid, file_id: Uuid) -> Result<FileDetailDto> {
        let file = self.get_owned(user_id, file_id).await?;
        self.set_status(file.id, FileStatus::Processing).await?;

        let parsed = match self.storage.download(&file.storage_key).await {
            Ok(bytes) => parse_workbook_blocking(bytes, self.config.sample_rows)
                .await
                .map(|(parsed, _)| parsed),
            Err(e) => Err(e),
        };

        let parsed = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                self.set_status(file.id, FileStatus::Error).await?;
                self.log_error_activity(
                    user_id,
                    Some(file.id),
                    format!("Failed to re-parse {}: {}", file.original_name, e),
                )
                .await;
                return Err(e);
            }
        };

        let updated = sqlx::query_as::<_, File>(&format!(
            r#"
            UPDATE files
            SET row_count = $3, column_count = $4, column_headers = $5, sample_data = $6,
                sheets = $7, status = $8, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(file.id)
        .bind(user_id)
        .bind(parsed.row_count as i32)
        .bind(parsed.column_count as i32)
        .bind(Json(&parsed.column_headers))
        .bind(Json(&parsed.sample_data))
        .bind(Json(&parsed.sheets))
        .bind(FileStatus::Completed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save re-parsed file: {:?}", e);
            AppError::Database(e)
        })?;

        info!("File re-parsed: id={}, rows={}", updated.id, updated.row_count);
        Ok(updated.into())
    }

    async fn set_status(&self, file_id: Uuid, status: FileStatus) -> Result<()> {
        sqlx::query("UPDATE files SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(file_id)
            .bind(status)
            .execute(&self.pool)
            .await?;
        debug!("File {} status set to {}", file_id, status);
        Ok(())
    }

    /// Append a chart to the file and mark it completed
    pub async fn append_chart(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        chart: SavedChart,
    ) -> Result<File> {
        sqlx::query_as::<_, File>(&format!(
            r#"
            UPDATE files
            SET charts = charts || $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {}
            "#,
            FILE_COLUMNS
        ))
        .bind(file_id)
        .bind(user_id)
        .bind(Json(vec![chart]))
        .bind(FileStatus::Completed)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to save chart: {:?}", e);
            AppError::Database(e)
        })?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))
    }

    /// Remove the stored copy, record the deletion in history and drop the row
    pub async fn delete(
        &self,
        user_id: Uuid,
        ctx: &ClientContext,
        file_id: Uuid,
    ) -> Result<DeleteFileResponseDto> {
        let file = self.get_owned(user_id, file_id).await?;
        let footprint = self.history.footprint(user_id, file.id).await?;

        if let Err(e) = self.storage.delete(&file.storage_key).await {
            warn!("Failed to remove stored copy {}: {}", file.storage_key, e);
        }

        let related = footprint.ids.len();
        let mut entry =
            NewHistoryEntry::new(user_id, file.id, &file.original_name, HistoryAction::FileDeleted);
        entry.file_size = Some(file.file_size);
        entry.row_count = Some(file.row_count);
        entry.column_count = Some(file.column_count);
        entry.session_id = ctx.session_id.clone();
        entry.metadata = HistoryMetadata {
            chart_count: Some(footprint.chart_count),
            download_count: Some(footprint.download_count),
            analysis_count: Some(footprint.analysis_count),
            ..HistoryMetadata::from_client(ctx)
        };
        entry.related_activities = footprint.ids;
        entry.tags = vec!["file_deletion".to_string(), "permanent_removal".to_string()];
        self.history.record(entry).await?;

        sqlx::query("DELETE FROM files WHERE id = $1 AND user_id = $2")
            .bind(file.id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to delete file: {:?}", e);
                AppError::Database(e)
            })?;

        let activity = NewActivity::new(
            user_id,
            ActivityType::Delete,
            format!("{} deleted", file.original_name),
        )
        .file(file.id)
        .metadata(json!({
            "filename": file.original_name,
            "size": file.file_size,
        }));
        if let Err(e) = self.activities.log(activity).await {
            warn!("Failed to log delete activity for file {}: {}", file.id, e);
        }

        info!("File deleted: id={}, user={}", file.id, user_id);
        Ok(DeleteFileResponseDto {
            deleted: true,
            related_activities: related,
        })
    }

    async fn log_error_activity(&self, user_id: Uuid, file_id: Option<Uuid>, description: String) {
        let mut activity = NewActivity::new(user_id, ActivityType::Error, description);
        if let Some(id) = file_id {
            activity = activity.file(id);
        }
        if let Err(e) = self.activities.log(activity).await {
            warn!("Failed to log error activity: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::LocalStorageConfig;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{insert_account, sample_workbook};

    async fn file_service(pool: &PgPool) -> FileService {
        let root_dir = std::env::temp_dir().join(format!("sheetlytics-files-{}", Uuid::new_v4()));
        let storage = Arc::new(LocalStorage::new(LocalStorageConfig { root_dir }).await.unwrap());
        FileService::new(
            pool.clone(),
            storage,
            Arc::new(ActivityService::new(pool.clone())),
            Arc::new(HistoryService::new(pool.clone())),
            UploadConfig {
                max_file_size: 1024 * 1024,
                sample_rows: 10,
            },
        )
    }

    async fn upload_sample(service: &FileService, user_id: Uuid) -> UploadResponseDto {
        service
            .upload(
                user_id,
                &ClientContext::default(),
                sample_workbook(),
                "sales.xlsx",
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            )
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_other_users_files_are_not_found(pool: PgPool) {
        let service = file_service(&pool).await;
        let owner = insert_account(&pool, "owner@example.com").await;
        let stranger = insert_account(&pool, "stranger@example.com").await;
        let uploaded = upload_sample(&service, owner).await;
        assert_eq!(uploaded.rows, 4);

        let ctx = ClientContext::default();
        assert!(matches!(
            service.detail(stranger, uploaded.file_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.reparse(stranger, uploaded.file_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(stranger, &ctx, uploaded.file_id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(service.list(stranger).await.unwrap().is_empty());

        service.detail(owner, uploaded.file_id).await.unwrap();
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_delete_links_deletion_to_earlier_history(pool: PgPool) {
        let service = file_service(&pool).await;
        let owner = insert_account(&pool, "owner@example.com").await;
        let uploaded = upload_sample(&service, owner).await;

        let chart = service
            .history
            .record(NewHistoryEntry::new(
                owner,
                uploaded.file_id,
                "sales.xlsx",
                HistoryAction::ChartCreated,
            ))
            .await
            .unwrap();

        let result = service
            .delete(owner, &ClientContext::default(), uploaded.file_id)
            .await
            .unwrap();
        assert!(result.deleted);
        assert_eq!(result.related_activities, 2);

        let (deletion_id, related): (Uuid, Vec<Uuid>) = sqlx::query_as(
            "SELECT id, related_activities FROM file_history WHERE file_id = $1 AND action = 'file_deleted'",
        )
        .bind(uploaded.file_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(related.len(), 2);
        assert!(related.contains(&chart.id));

        let back_links: Vec<Vec<Uuid>> = sqlx::query_scalar(
            "SELECT related_activities FROM file_history WHERE file_id = $1 AND action <> 'file_deleted'",
        )
        .bind(uploaded.file_id)
        .fetch_all(&pool)
        .await
        .unwrap();
        assert_eq!(back_links.len(), 2);
        assert!(back_links.iter().all(|links| links.contains(&deletion_id)));

        let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE id = $1")
            .bind(uploaded.file_id)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_survives_failed_activity_trail(pool: PgPool) {
        let service = file_service(&pool).await;
        let owner = insert_account(&pool, "owner@example.com").await;
        sqlx::query("DROP TABLE activities, file_history")
            .execute(&pool)
            .await
            .unwrap();

        let uploaded = upload_sample(&service, owner).await;

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE user_id = $1")
            .bind(owner)
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(stored, 1);
        assert_eq!(uploaded.columns, 2);
    }
}
