use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::features::activities::dtos::ActivityDto;

/// File counters of one user
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, FromRow)]
pub struct FileTotals {
    pub total_files: i64,
    pub files_today: i64,
    pub total_rows: i64,
    /// Sum of stored file sizes in bytes
    pub storage_used: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStatsDto {
    #[serde(flatten)]
    pub totals: FileTotals,
    pub recent_activities: Vec<ActivityDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_flatten_totals() {
        let dto = DashboardStatsDto {
            totals: FileTotals {
                total_files: 3,
                files_today: 1,
                total_rows: 420,
                storage_used: 65536,
            },
            recent_activities: vec![],
        };
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(value["total_files"], 3);
        assert_eq!(value["storage_used"], 65536);
        assert!(value["recent_activities"].as_array().unwrap().is_empty());
    }
}
