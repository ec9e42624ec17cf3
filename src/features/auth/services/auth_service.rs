use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::dtos::{
    normalize_email, AuthResponseDto, AuthUserDto, LoginRequestDto, RegisterRequestDto,
};
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::models::{User, UserRole, UserStatus, USER_COLUMNS};
use crate::features::auth::password::{hash_password_async, verify_password_async};
use crate::features::auth::JwtService;

/// Service for authentication operations (register, login)
pub struct AuthService {
    pool: PgPool,
    jwt: Arc<JwtService>,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt: Arc<JwtService>) -> Self {
        Self { pool, jwt }
    }

    /// Register a new account with the `user` role
    pub async fn register(&self, dto: RegisterRequestDto) -> Result<AuthResponseDto> {
        let email = normalize_email(&dto.email);
        let password_hash = hash_password_async(dto.password).await?;
        let name = dto
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let user = self
            .insert_user(&email, &password_hash, name.as_deref(), UserRole::User)
            .await?;

        info!("User registered: id={}", user.id);
        self.token_response(user)
    }

    /// Login with email and password
    pub async fn login(&self, dto: LoginRequestDto) -> Result<AuthResponseDto> {
        let email = normalize_email(&dto.email);

        let user = self
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::Auth("Invalid credentials".to_string()))?;

        if !verify_password_async(dto.password, user.password_hash.clone()).await? {
            return Err(AppError::Auth("Invalid credentials".to_string()));
        }

        if user.is_blocked() {
            warn!("Blocked user attempted login: id={}", user.id);
            return Err(AppError::Forbidden(
                "Your account has been blocked".to_string(),
            ));
        }

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET last_login_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user.id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record login: {:?}", e);
            AppError::Database(e)
        })?;

        self.token_response(user)
    }

    /// Verify a bearer token and resolve it against the account as stored now,
    /// so role changes, blocks and deletions apply to tokens already issued.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser> {
        let claimed = self.jwt.validate_token(token)?;

        let account = sqlx::query_as::<_, (String, UserRole, UserStatus)>(
            "SELECT email, role, status FROM users WHERE id = $1",
        )
        .bind(claimed.user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to load account for token: {:?}", e);
            AppError::Database(e)
        })?;

        resolve_account(claimed, account)
    }

    /// Current account as stored
    pub async fn get_me(&self, user_id: Uuid) -> Result<AuthUserDto> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user.into())
    }

    /// Create the configured admin account when it does not exist yet.
    /// An existing account with that email is promoted to admin.
    pub async fn ensure_admin(&self, email: &str, password: &str) -> Result<()> {
        let email = normalize_email(email);

        if let Some(existing) = self.find_by_email(&email).await? {
            if existing.role != UserRole::Admin {
                sqlx::query("UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2")
                    .bind(UserRole::Admin)
                    .bind(existing.id)
                    .execute(&self.pool)
                    .await?;
                info!("Promoted existing user to admin: id={}", existing.id);
            }
            return Ok(());
        }

        let password_hash = hash_password_async(password.to_string()).await?;
        let user = self
            .insert_user(&email, &password_hash, Some("Administrator"), UserRole::Admin)
            .await?;
        info!("Bootstrap admin created: id={}", user.id);
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
        role: UserRole,
    ) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, name, role) VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AppError::Conflict("Email already registered".to_string())
            }
            e => {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::Database(e)
            }
        })
    }

    fn token_response(&self, user: User) -> Result<AuthResponseDto> {
        let access_token = self.jwt.issue_token(&user)?;
        Ok(AuthResponseDto {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt.expiry_secs(),
            user: user.into(),
        })
    }
}

/// Identity to act as: the stored email and role replace the claimed ones
fn resolve_account(
    claimed: AuthenticatedUser,
    account: Option<(String, UserRole, UserStatus)>,
) -> Result<AuthenticatedUser> {
    let (email, role, status) = account
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".to_string()))?;

    if status == UserStatus::Blocked {
        warn!("Blocked user presented a token: id={}", claimed.user_id);
        return Err(AppError::Forbidden(
            "Your account has been blocked".to_string(),
        ));
    }

    Ok(AuthenticatedUser {
        user_id: claimed.user_id,
        email,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claimed(role: UserRole) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "old@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_resolve_account_uses_stored_role_and_email() {
        let user = resolve_account(
            claimed(UserRole::Admin),
            Some(("new@example.com".to_string(), UserRole::User, UserStatus::Active)),
        )
        .unwrap();
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.email, "new@example.com");
    }

    #[test]
    fn test_resolve_account_rejects_blocked_and_deleted() {
        let blocked = resolve_account(
            claimed(UserRole::Admin),
            Some(("a@example.com".to_string(), UserRole::Admin, UserStatus::Blocked)),
        );
        assert!(matches!(blocked, Err(AppError::Forbidden(_))));

        let deleted = resolve_account(claimed(UserRole::User), None);
        assert!(matches!(deleted, Err(AppError::Unauthorized(_))));
    }
}
