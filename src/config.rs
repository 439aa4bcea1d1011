use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    /// Lifetime of a password-reset token, in minutes.
    pub reset_ttl_minutes: i64,
    pub host: String,
    pub port: u16,
    /// Prefix all routes are nested under, e.g. "api/v1".
    pub api_prefix: String,
    pub cors_enabled: bool,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "doorman".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "doorman-users".into()),
            ttl_minutes: env_or("JWT_TTL_MINUTES", 60),
        };
        Ok(Self {
            database_url,
            jwt,
            reset_ttl_minutes: env_or("RESET_TTL_MINUTES", 60),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_or("PORT", 5000),
            api_prefix: std::env::var("API_PREFIX")
                .ok()
                .filter(|p| !p.trim_matches('/').is_empty())
                .unwrap_or_else(|| "api/v1".into()),
            cors_enabled: std::env::var("CORS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        })
    }
}
