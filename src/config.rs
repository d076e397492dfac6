//! Server configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration, loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database file path
    pub db_path: String,
    /// Root directory of the blob store (print files, merch designs)
    pub blob_root: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// Public base URL, used to build checkout success/cancel URLs
    pub public_base_url: String,
    /// Payment gateway secret key
    pub gateway_secret_key: String,
    /// Payment gateway webhook signing secret
    pub gateway_webhook_secret: String,
    /// JWT secret for storefront session tokens
    pub jwt_secret: String,
}

impl Config {
    /// Require a secret env var: must be set and non-empty outside development.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        Ok(Self {
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "data/printshop.db".into()),
            blob_root: std::env::var("BLOB_ROOT").unwrap_or_else(|_| "data/blobs".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            gateway_secret_key: Self::require_secret("GATEWAY_SECRET_KEY", &environment)?,
            gateway_webhook_secret: Self::require_secret("GATEWAY_WEBHOOK_SECRET", &environment)?,
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            environment,
        })
    }
}
