use chrono::Utc;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::core::extractor::ClientContext;
use crate::features::history::dtos::{
    group_by_date, BreakdownItem, CreateHistoryDto, FileActivitySummary, FileHistoryDto,
    FileTimelineDto, HistoryListResponseDto, HistoryQuery, HistoryStatsDto, HistoryTotals,
};
use crate::features::history::models::{
    FileHistory, HistoryMetadata, NewHistoryEntry, HISTORY_COLUMNS,
};
use crate::shared::types::PaginationInfo;

const DOWNLOAD_ACTIONS_SQL: &str = "('pdf_downloaded', 'csv_exported', 'analysis_downloaded')";

/// Ids and counters of a file's history, captured before the file is removed
#[derive(Debug, Clone, Default, sqlx::FromRow)]
pub struct FileHistoryFootprint {
    pub ids: Vec<Uuid>,
    pub chart_count: i64,
    pub download_count: i64,
    pub analysis_count: i64,
}

pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append an entry and link it from the related entries the same user owns
    pub async fn record(&self, entry: NewHistoryEntry) -> Result<FileHistory> {
        let (analysis_time, chart_creation_time, download_time) =
            entry.action_timestamps(Utc::now());

        let mut tx = self.pool.begin().await?;

        let saved = sqlx::query_as::<_, FileHistory>(&format!(
            r#"
            INSERT INTO file_history (
                user_id, file_id, file_name, action, chart_type, selected_axes, chart_config,
                chart_id, analysis_type, analysis_results, analysis_id, download_format,
                download_url, download_file_name, download_size, file_size, row_count,
                column_count, analysis_time, download_time, chart_creation_time, session_id,
                metadata, related_activities, tags, status, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27)
            RETURNING {}
            "#,
            HISTORY_COLUMNS
        ))
        .bind(entry.user_id)
        .bind(entry.file_id)
        .bind(&entry.file_name)
        .bind(entry.action)
        .bind(entry.chart_type)
        .bind(entry.selected_axes.map(Json))
        .bind(entry.chart_config.map(Json))
        .bind(&entry.chart_id)
        .bind(entry.analysis_type)
        .bind(entry.analysis_results.map(Json))
        .bind(&entry.analysis_id)
        .bind(entry.download_format)
        .bind(&entry.download_url)
        .bind(&entry.download_file_name)
        .bind(entry.download_size)
        .bind(entry.file_size)
        .bind(entry.row_count)
        .bind(entry.column_count)
        .bind(analysis_time)
        .bind(download_time)
        .bind(chart_creation_time)
        .bind(&entry.session_id)
        .bind(Json(&entry.metadata))
        .bind(&entry.related_activities)
        .bind(&entry.tags)
        .bind(entry.status)
        .bind(&entry.error_message)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record history entry: {:?}", e);
            AppError::Database(e)
        })?;

        if !entry.related_activities.is_empty() {
            sqlx::query(
                r#"
                UPDATE file_history
                SET related_activities = array_append(related_activities, $1)
                WHERE id = ANY($2) AND user_id = $3
                "#,
            )
            .bind(saved.id)
            .bind(&entry.related_activities)
            .bind(entry.user_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!("Failed to link related history entries: {:?}", e);
                AppError::Database(e)
            })?;
        }

        tx.commit().await?;

        debug!(
            "History recorded: id={}, action={}, file={}",
            saved.id, saved.action, saved.file_id
        );
        Ok(saved)
    }

    /// Record an entry sent by the client, attaching request details
    pub async fn create(
        &self,
        user_id: Uuid,
        dto: CreateHistoryDto,
        ctx: &ClientContext,
    ) -> Result<FileHistoryDto> {
        let mut entry = NewHistoryEntry::new(user_id, dto.file_id, dto.file_name, dto.action);
        entry.chart_type = dto.chart_type;
        entry.selected_axes = dto.selected_axes;
        entry.chart_config = dto.chart_config;
        entry.chart_id = dto.chart_id;
        entry.analysis_type = dto.analysis_type;
        entry.analysis_results = dto.analysis_results;
        entry.analysis_id = dto.analysis_id;
        entry.download_format = dto.download_format;
        entry.download_url = dto.download_url;
        entry.download_file_name = dto.download_file_name;
        entry.download_size = dto.download_size;
        entry.file_size = dto.file_size;
        entry.row_count = dto.row_count;
        entry.column_count = dto.column_count;
        entry.session_id = dto.session_id.or_else(|| ctx.session_id.clone());
        entry.metadata = HistoryMetadata {
            time_spent: dto.time_spent,
            ..HistoryMetadata::from_client(ctx)
        };
        entry.related_activities = dto.related_activities;
        entry.tags = dto.tags;
        entry.status = dto.status.unwrap_or_default();
        entry.error_message = dto.error_message;

        Ok(self.record(entry).await?.into())
    }

    /// Filtered, paginated history grouped by day
    pub async fn list(&self, user_id: Uuid, query: HistoryQuery) -> Result<HistoryListResponseDto> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM file_history");
        push_filters(&mut count_qb, user_id, &query)?;
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to count history: {:?}", e);
                AppError::Database(e)
            })?;

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM file_history",
            HISTORY_COLUMNS
        ));
        push_filters(&mut qb, user_id, &query)?;
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(query.limit())
            .push(" OFFSET ")
            .push_bind(query.offset());

        let rows = qb
            .build_query_as::<FileHistory>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list history: {:?}", e);
                AppError::Database(e)
            })?;

        Ok(HistoryListResponseDto {
            history: group_by_date(rows.into_iter().map(FileHistoryDto::from).collect()),
            pagination: PaginationInfo::new(query.page(), query.limit(), total),
            filters: query,
        })
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<HistoryStatsDto> {
        let totals = sqlx::query_as::<_, HistoryTotals>(&format!(
            r#"
            SELECT
                COUNT(*) AS total_actions,
                COUNT(DISTINCT file_id) AS total_files,
                COUNT(*) FILTER (WHERE action = 'chart_created') AS total_charts,
                COUNT(*) FILTER (WHERE action IN {}) AS total_downloads,
                COUNT(*) FILTER (WHERE action = 'analysis') AS total_analyses
            FROM file_history
            WHERE user_id = $1
            "#,
            DOWNLOAD_ACTIONS_SQL
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let action_breakdown = self.breakdown(user_id, "action").await?;
        let chart_type_breakdown = self.breakdown(user_id, "chart_type").await?;
        let download_format_breakdown = self.breakdown(user_id, "download_format").await?;
        let analysis_type_breakdown = self.breakdown(user_id, "analysis_type").await?;

        let recent = sqlx::query_as::<_, FileHistory>(&format!(
            r#"
            SELECT {} FROM file_history
            WHERE user_id = $1 AND created_at >= NOW() - INTERVAL '7 days'
            ORDER BY created_at DESC
            LIMIT 10
            "#,
            HISTORY_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let file_activity_summary = sqlx::query_as::<_, FileActivitySummary>(&format!(
            r#"
            SELECT
                file_id,
                (ARRAY_AGG(file_name ORDER BY created_at DESC))[1] AS file_name,
                COUNT(*) AS total_actions,
                COUNT(*) FILTER (WHERE action = 'chart_created') AS chart_count,
                COUNT(*) FILTER (WHERE action IN {}) AS download_count,
                COUNT(*) FILTER (WHERE action = 'analysis') AS analysis_count,
                MAX(created_at) AS last_activity
            FROM file_history
            WHERE user_id = $1
            GROUP BY file_id
            ORDER BY last_activity DESC
            LIMIT 5
            "#,
            DOWNLOAD_ACTIONS_SQL
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(HistoryStatsDto {
            total_actions: totals.total_actions,
            total_files: totals.total_files,
            total_charts: totals.total_charts,
            total_downloads: totals.total_downloads,
            total_analyses: totals.total_analyses,
            action_breakdown,
            chart_type_breakdown,
            download_format_breakdown,
            analysis_type_breakdown,
            recent_activity: recent.into_iter().map(FileHistoryDto::from).collect(),
            file_activity_summary,
        })
    }

    /// Counts per value of an enum column, most frequent first
    async fn breakdown(&self, user_id: Uuid, column: &'static str) -> Result<Vec<BreakdownItem>> {
        let rows = sqlx::query_as::<_, BreakdownItem>(&format!(
            r#"
            SELECT {col}::text AS key, COUNT(*) AS count
            FROM file_history
            WHERE user_id = $1 AND {col} IS NOT NULL
            GROUP BY {col}
            ORDER BY count DESC, key ASC
            "#,
            col = column
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<FileHistoryDto> {
        let entry = sqlx::query_as::<_, FileHistory>(&format!(
            "SELECT {} FROM file_history WHERE id = $1 AND user_id = $2",
            HISTORY_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("History entry not found".to_string()))?;

        Ok(entry.into())
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM file_history WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("History entry not found".to_string()));
        }

        debug!("History entry deleted: id={}", id);
        Ok(())
    }

    /// All of a user's entries for one file, oldest first
    pub async fn file_timeline(&self, user_id: Uuid, file_id: Uuid) -> Result<FileTimelineDto> {
        let rows = sqlx::query_as::<_, FileHistory>(&format!(
            r#"
            SELECT {} FROM file_history
            WHERE user_id = $1 AND file_id = $2
            ORDER BY created_at ASC
            "#,
            HISTORY_COLUMNS
        ))
        .bind(user_id)
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(AppError::NotFound(
                "No history found for this file".to_string(),
            ));
        }

        Ok(FileTimelineDto::from_entries(
            rows.into_iter().map(FileHistoryDto::from).collect(),
        ))
    }

    /// Existing entry ids and counters for a file
    pub async fn footprint(&self, user_id: Uuid, file_id: Uuid) -> Result<FileHistoryFootprint> {
        let footprint = sqlx::query_as::<_, FileHistoryFootprint>(&format!(
            r#"
            SELECT
                COALESCE(ARRAY_AGG(id ORDER BY created_at), '{{}}') AS ids,
                COUNT(*) FILTER (WHERE action = 'chart_created') AS chart_count,
                COUNT(*) FILTER (WHERE action IN {}) AS download_count,
                COUNT(*) FILTER (WHERE action = 'analysis') AS analysis_count
            FROM file_history
            WHERE user_id = $1 AND file_id = $2
            "#,
            DOWNLOAD_ACTIONS_SQL
        ))
        .bind(user_id)
        .bind(file_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(footprint)
    }

    /// Chart and analysis entries for one file, newest first
    pub async fn chart_history(
        &self,
        user_id: Uuid,
        file_id: Uuid,
        limit: i64,
    ) -> Result<Vec<FileHistoryDto>> {
        let rows = sqlx::query_as::<_, FileHistory>(&format!(
            r#"
            SELECT {} FROM file_history
            WHERE user_id = $1 AND file_id = $2 AND action IN ('chart_created', 'analysis')
            ORDER BY created_at DESC
            LIMIT $3
            "#,
            HISTORY_COLUMNS
        ))
        .bind(user_id)
        .bind(file_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(FileHistoryDto::from).collect())
    }
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    user_id: Uuid,
    query: &HistoryQuery,
) -> Result<()> {
    qb.push(" WHERE user_id = ").push_bind(user_id);

    if let Some(action) = query.action {
        qb.push(" AND action = ").push_bind(action);
    }
    if let Some(chart_type) = query.chart_type {
        qb.push(" AND chart_type = ").push_bind(chart_type);
    }
    if let Some(format) = query.download_format {
        qb.push(" AND download_format = ").push_bind(format);
    }
    if let Some(analysis_type) = query.analysis_type {
        qb.push(" AND analysis_type = ").push_bind(analysis_type);
    }
    if let Some(name) = query.file_name_filter() {
        qb.push(" AND file_name ILIKE ")
            .push_bind(format!("%{}%", escape_like(name)));
    }

    let (from, to) = query.created_bounds()?;
    if let Some(from) = from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = to {
        qb.push(" AND created_at < ").push_bind(to);
    }
    Ok(())
}

/// Escape LIKE wildcards so the filter matches literally
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
