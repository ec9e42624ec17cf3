use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::activities::models::{Activity, ActivityType};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ActivityDto {
    pub id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub file_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<Activity> for ActivityDto {
    fn from(activity: Activity) -> Self {
        Self {
            id: activity.id,
            activity_type: activity.activity_type,
            description: activity.description,
            file_id: activity.file_id,
            metadata: activity.metadata,
            created_at: activity.created_at,
        }
    }
}

/// Activity joined with its owner, for the admin feed
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, FromRow)]
pub struct AdminActivityDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_email: String,
    pub activity_type: ActivityType,
    pub description: String,
    pub file_id: Option<Uuid>,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
