use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Activity type enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "activity_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Upload,
    Analysis,
    Download,
    Delete,
    Profile,
    Error,
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityType::Upload => write!(f, "upload"),
            ActivityType::Analysis => write!(f, "analysis"),
            ActivityType::Download => write!(f, "download"),
            ActivityType::Delete => write!(f, "delete"),
            ActivityType::Profile => write!(f, "profile"),
            ActivityType::Error => write!(f, "error"),
        }
    }
}

/// Database model for an activity log entry
#[derive(Debug, Clone, FromRow)]
pub struct Activity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub file_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Data for appending an activity
#[derive(Debug)]
pub struct NewActivity {
    pub user_id: Uuid,
    pub activity_type: ActivityType,
    pub description: String,
    pub file_id: Option<Uuid>,
    pub metadata: serde_json::Value,
}

impl NewActivity {
    pub fn new(user_id: Uuid, activity_type: ActivityType, description: impl Into<String>) -> Self {
        Self {
            user_id,
            activity_type,
            description: description.into(),
            file_id: None,
            metadata: serde_json::json!({}),
        }
    }

    pub fn file(mut self, file_id: Uuid) -> Self {
        self.file_id = Some(file_id);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

pub const ACTIVITY_COLUMNS: &str =
    "id, user_id, activity_type, description, file_id, metadata, created_at";
