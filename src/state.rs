use std::sync::Arc;

use anyhow::Context;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::mailer::Mailer;
use crate::storage::{LocalStorage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub mailer: Arc<Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = crate::db::init_pool(&config.database_url).await?;

        tokio::fs::create_dir_all(&config.uploads_dir)
            .await
            .with_context(|| format!("create uploads dir {}", config.uploads_dir))?;
        let storage =
            Arc::new(LocalStorage::new(&config.uploads_dir)) as Arc<dyn StorageClient>;

        let mailer = Arc::new(Mailer::new(config.smtp.clone()));

        Ok(Self {
            db,
            config,
            storage,
            mailer,
        })
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory database with the embedded migrations applied, a storage
    /// fake, and an unconfigured mailer (sends are skipped, not attempted).
    pub async fn for_tests() -> Self {
        use crate::config::SmtpConfig;
        use async_trait::async_trait;
        use bytes::Bytes;

        struct FakeStorage;

        #[async_trait]
        impl StorageClient for FakeStorage {
            async fn put_object(
                &self,
                key: &str,
                _body: Bytes,
                _content_type: &str,
            ) -> anyhow::Result<String> {
                Ok(format!("/uploads/{key}"))
            }
            async fn delete_object(&self, _key: &str) -> anyhow::Result<()> {
                Ok(())
            }
        }

        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("run migrations");

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            jwt_secret: "test-secret".into(),
            smtp: SmtpConfig {
                host: None,
                port: 587,
                username: None,
                password: None,
                from: "Shopdesk <no-reply@shopdesk.local>".into(),
            },
            api_url: "http://localhost:4000".into(),
            web_url: "http://web.local".into(),
            uploads_dir: "uploads".into(),
        });

        let mailer = Arc::new(Mailer::new(config.smtp.clone()));

        Self {
            db,
            config,
            storage: Arc::new(FakeStorage) as Arc<dyn StorageClient>,
            mailer,
        }
    }
}
