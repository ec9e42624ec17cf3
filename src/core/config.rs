use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    pub bootstrap: BootstrapConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Settings for locally issued HS256 access tokens
#[derive(Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry: Duration,
    pub jwt_leeway: Duration,
}

// Keep the secret out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"***")
            .field("token_expiry", &self.token_expiry)
            .field("jwt_leeway", &self.jwt_leeway)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Where raw uploaded workbooks are kept
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// MinIO or any S3-compatible service
    MinIO(MinIOConfig),
    /// Plain directory on the server's filesystem
    Local(LocalStorageConfig),
}

/// MinIO/S3 storage configuration for file uploads
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Public endpoint URL used when building object URLs (defaults to endpoint)
    pub public_endpoint: String,
    /// Access key for authentication
    pub access_key: String,
    /// Secret key for authentication
    pub secret_key: String,
    /// Bucket name for storing files
    pub bucket: String,
    /// AWS region (for S3 compatibility)
    pub region: String,
    /// Prefix under which every workbook is stored
    pub prefix: String,
}

#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    pub root_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Maximum accepted workbook size in bytes
    pub max_file_size: usize,
    /// Number of data rows kept as the quick-look sample
    pub sample_rows: usize,
}

/// Optional admin account created at startup when missing
#[derive(Clone)]
pub struct BootstrapConfig {
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("admin_email", &self.admin_email)
            .field("admin_password", &self.admin_password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            storage: StorageConfig::from_env()?,
            upload: UploadConfig::from_env()?,
            bootstrap: BootstrapConfig::from_env(),
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins = parse_list(
            &env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_var("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_var("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 24 * 3600;
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;
    const MIN_SECRET_LEN: usize = 32;

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| "JWT_SECRET environment variable is required".to_string())?;

        if jwt_secret.len() < Self::MIN_SECRET_LEN {
            return Err(format!(
                "JWT_SECRET must be at least {} characters",
                Self::MIN_SECRET_LEN
            ));
        }

        let token_expiry_secs = parse_var("JWT_EXPIRY_SECS", Self::DEFAULT_TOKEN_EXPIRY_SECS)?;
        let jwt_leeway_secs = parse_var("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            jwt_secret,
            token_expiry: Duration::from_secs(token_expiry_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Sheetlytics API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Spreadsheet upload, charting and export API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl StorageConfig {
    /// `STORAGE_BACKEND` selects `minio` or `local` (default)
    pub fn from_env() -> Result<Self, String> {
        let backend = env::var("STORAGE_BACKEND").unwrap_or_else(|_| "local".to_string());

        match backend.to_lowercase().as_str() {
            "minio" | "s3" => Ok(StorageConfig::MinIO(MinIOConfig::from_env()?)),
            "local" => Ok(StorageConfig::Local(LocalStorageConfig::from_env())),
            other => Err(format!(
                "STORAGE_BACKEND must be 'minio' or 'local', got '{}'",
                other
            )),
        }
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());

        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());

        let bucket =
            env::var("MINIO_BUCKET").unwrap_or_else(|_| "sheetlytics-uploads".to_string());

        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let prefix = env::var("MINIO_PREFIX").unwrap_or_else(|_| "workbooks".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
            prefix,
        })
    }
}

impl LocalStorageConfig {
    pub fn from_env() -> Self {
        let root_dir = env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string());
        Self {
            root_dir: PathBuf::from(root_dir),
        }
    }
}

impl UploadConfig {
    const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB
    const DEFAULT_SAMPLE_ROWS: usize = 10;

    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            max_file_size: parse_var("MAX_UPLOAD_SIZE", Self::DEFAULT_MAX_FILE_SIZE)?,
            sample_rows: parse_var("SAMPLE_ROWS", Self::DEFAULT_SAMPLE_ROWS)?,
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            sample_rows: Self::DEFAULT_SAMPLE_ROWS,
        }
    }
}

impl BootstrapConfig {
    pub fn from_env() -> Self {
        Self {
            admin_email: env::var("ADMIN_EMAIL").ok().filter(|s| !s.is_empty()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|s| !s.is_empty()),
        }
    }
}

/// Split a comma-separated list, dropping blanks
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Read `name` from the environment, falling back to `default` when unset
fn parse_var<T>(name: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr + ToString,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|_| format!("{} must be a valid number", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_trims_and_drops_blanks() {
        assert_eq!(
            parse_list(" http://a.test , ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let value: u64 = parse_var("SHEETLYTICS_TEST_SURELY_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("docs".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert!(swagger.credentials().is_none());

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials().as_deref(), Some("docs:secret"));
    }

    #[test]
    fn test_auth_config_debug_hides_secret() {
        let auth = AuthConfig {
            jwt_secret: "super-secret-value-that-is-long-enough".to_string(),
            token_expiry: Duration::from_secs(60),
            jwt_leeway: Duration::from_secs(0),
        };
        let printed = format!("{:?}", auth);
        assert!(!printed.contains("super-secret"));
    }
}
