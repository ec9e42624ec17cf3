use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use crate::core::config::AuthConfig;
use crate::core::error::AppError;
use crate::features::auth::model::{AuthenticatedUser, Claims};
use crate::features::auth::models::User;

/// Issues and verifies HS256 access tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: i64,
}

impl JwtService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.jwt_leeway.as_secs();

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            expiry_secs: config.token_expiry.as_secs() as i64,
        }
    }

    pub fn expiry_secs(&self) -> i64 {
        self.expiry_secs
    }

    /// Sign a token for the given account
    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.expiry_secs,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify signature and expiry, returning the caller's identity
    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!("Token validation failed: {}", e);
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AppError::Unauthorized("Token has expired".to_string())
                }
                _ => AppError::Unauthorized("Invalid token".to_string()),
            }
        })?;

        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::models::{UserRole, UserStatus};
    use std::time::Duration;
    use uuid::Uuid;

    fn config(expiry: u64) -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret-that-is-at-least-32-characters".to_string(),
            token_expiry: Duration::from_secs(expiry),
            jwt_leeway: Duration::from_secs(0),
        }
    }

    fn user(role: UserRole) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "analyst@example.com".to_string(),
            password_hash: String::new(),
            name: Some("Analyst".to_string()),
            role,
            status: UserStatus::Active,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_validate_token() {
        let service = JwtService::new(&config(3600));
        let account = user(UserRole::Admin);

        let token = service.issue_token(&account).unwrap();
        let identity = service.validate_token(&token).unwrap();

        assert_eq!(identity.user_id, account.id);
        assert_eq!(identity.email, account.email);
        assert!(identity.is_admin());
    }

    #[test]
    fn test_rejects_token_signed_with_other_secret() {
        let issuer = JwtService::new(&AuthConfig {
            jwt_secret: "another-secret-that-is-at-least-32-chars".to_string(),
            ..config(3600)
        });
        let verifier = JwtService::new(&config(3600));

        let token = issuer.issue_token(&user(UserRole::User)).unwrap();
        assert!(matches!(
            verifier.validate_token(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = JwtService::new(&config(3600));
        let account = user(UserRole::User);
        let past = Utc::now().timestamp() - 7200;
        let claims = Claims {
            sub: account.id,
            email: account.email.clone(),
            role: account.role,
            iat: past,
            exp: past + 60,
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        match service.validate_token(&token) {
            Err(AppError::Unauthorized(msg)) => assert_eq!(msg, "Token has expired"),
            other => panic!("expected expiry error, got {:?}", other.map(|u| u.user_id)),
        }
    }

    #[test]
    fn test_rejects_garbage() {
        let service = JwtService::new(&config(3600));
        assert!(service.validate_token("not-a-token").is_err());
    }
}
