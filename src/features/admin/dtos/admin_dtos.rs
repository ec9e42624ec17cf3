use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::auth::models::{UserRole, UserStatus};

/// Platform-wide counters
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, FromRow)]
pub struct AdminStatsDto {
    pub total_users: i64,
    pub total_files: i64,
    pub total_activities: i64,
    pub new_users_today: i64,
    pub files_today: i64,
    /// Sum of stored file sizes in bytes
    pub total_storage: i64,
}

/// Account as listed to admins; never carries the password hash
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct AdminUserDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub file_count: i64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateUserStatusDto {
    pub status: UserStatus,
}
