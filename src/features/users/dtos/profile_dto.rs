use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::auth::models::{User, UserRole, UserStatus};

/// The caller's account, without credentials
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfileDto {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserProfileDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            status: user.status,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileDto {
    #[validate(length(max = 128, message = "Name must not exceed 128 characters"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UpdateProfileDto {
    /// Names of the fields this request changes
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_some() {
            fields.push("name");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        fields
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordDto {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DeleteAccountDto {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteAccountResponseDto {
    pub deleted: bool,
    /// Stored workbooks removed with the account
    pub files_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_fields() {
        let dto = UpdateProfileDto {
            name: Some("Dana".to_string()),
            email: None,
        };
        assert_eq!(dto.changed_fields(), vec!["name"]);

        let dto = UpdateProfileDto {
            name: None,
            email: None,
        };
        assert!(dto.changed_fields().is_empty());
    }

    #[test]
    fn test_update_profile_validates_email() {
        let dto = UpdateProfileDto {
            name: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_change_password_min_length() {
        let dto = ChangePasswordDto {
            current_password: "secret1".to_string(),
            new_password: "123".to_string(),
        };
        assert!(dto.validate().is_err());
    }
}
