use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Push gateway submission URL (default: Expo push API)
    pub gateway_url: String,

    /// Optional bearer token for authenticated gateway access
    pub gateway_access_token: Option<String>,

    /// JWT secret for API authentication
    pub jwt_secret: String,

    /// JWT token expiry in hours
    pub jwt_expiry_hours: u64,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            gateway_url: std::env::var("GATEWAY_URL")
                .unwrap_or_else(|_| "https://exp.host/--/api/v2/push/send".to_string()),
            gateway_access_token: std::env::var("GATEWAY_ACCESS_TOKEN").ok(),
            jwt_secret: std::env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?,
            jwt_expiry_hours: std::env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "168".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("JWT_EXPIRY_HOURS must be a valid u64"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
        })
    }
}
