use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub secret: String,
    pub issuer: String,
    pub reset_ttl_minutes: i64,
    pub session_ttl_hours: i64,
    pub remember_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Base URL used when rendering links sent to users (reset emails).
    pub public_base_url: String,
    pub auth: AuthConfig,
    pub smtp: SmtpConfig,
    pub minio_endpoint: String,
    pub minio_bucket: String,
    pub minio_access_key: String,
    pub minio_secret_key: String,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let auth = AuthConfig {
            secret: std::env::var("AUTH_SECRET")?,
            issuer: env_or("AUTH_ISSUER", "quillpost"),
            reset_ttl_minutes: env_parse("RESET_TOKEN_TTL_MINUTES", 30),
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", 12),
            remember_ttl_days: env_parse("REMEMBER_SESSION_TTL_DAYS", 30),
        };
        let smtp = SmtpConfig {
            host: env_or("SMTP_HOST", "localhost"),
            port: env_parse("SMTP_PORT", 587),
            username: env_or("SMTP_USERNAME", ""),
            password: env_or("SMTP_PASSWORD", ""),
            from: env_or("SMTP_FROM", "Quillpost <noreply@quillpost.local>"),
        };
        Ok(Self {
            database_url,
            public_base_url: env_or("PUBLIC_BASE_URL", "http://localhost:8080"),
            auth,
            smtp,
            minio_endpoint: env_or("MINIO_ENDPOINT", "http://localhost:9000"),
            minio_bucket: env_or("MINIO_BUCKET", "quillpost"),
            minio_access_key: env_or("MINIO_ACCESS_KEY", "minioadmin"),
            minio_secret_key: env_or("MINIO_SECRET_KEY", "minioadmin"),
        })
    }
}
