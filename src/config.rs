use serde::Deserialize;
use tracing::warn;

/// Fallback signing secret for local development. Deployments must set
/// JWT_SECRET; the fallback is logged loudly at startup.
const DEV_JWT_SECRET: &str = "secret123";

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

impl SmtpConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub smtp: SmtpConfig,
    /// Public base URL of this API, used to build confirmation links.
    pub api_url: String,
    /// Public web frontend URL, target of the post-confirmation redirect.
    pub web_url: String,
    pub uploads_dir: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:shopdesk.db?mode=rwc".into());

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!("JWT_SECRET not set, falling back to the development secret");
                DEV_JWT_SECRET.into()
            }
        };

        let smtp = SmtpConfig {
            host: std::env::var("SMTP_HOST").ok(),
            port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            username: std::env::var("SMTP_USERNAME").ok(),
            password: std::env::var("SMTP_PASSWORD").ok(),
            from: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Shopdesk <no-reply@shopdesk.local>".into()),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            smtp,
            api_url: std::env::var("API_URL").unwrap_or_else(|_| "http://localhost:4000".into()),
            web_url: std::env::var("WEB_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            uploads_dir: std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".into()),
        })
    }
}
