//! Role-based authorization guards.
//!
//! The auth middleware reloads role and status from `users` on every request,
//! so guards read the extension it inserts.

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Guard for admin-only handlers.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(user): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

        if !user.is_admin() {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(RequireAdmin(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::models::UserRole;
    use axum::http::Request;
    use uuid::Uuid;

    fn parts_with(user: Option<AuthenticatedUser>) -> Parts {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        parts
    }

    fn user(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_require_admin_accepts_admin() {
        let mut parts = parts_with(Some(user(UserRole::Admin)));
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(admin.is_admin());
    }

    #[tokio::test]
    async fn test_require_admin_rejects_regular_user() {
        let mut parts = parts_with(Some(user(UserRole::User)));
        let result = RequireAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_require_admin_rejects_anonymous() {
        let mut parts = parts_with(None);
        let result = RequireAdmin::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }
}
