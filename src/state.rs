use std::sync::Arc;

use crate::auth::{jwt::JwtKeys, password::Argon2Hasher, repo::PgUserStore, services::AuthService};
use crate::config::AppConfig;
use crate::db;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);

        let pool = db::connect(&config.database).await?;
        db::migrate(&pool).await?;
        tracing::info!("database connected");

        let auth = Arc::new(AuthService::new(
            PgUserStore::new(pool),
            Argon2Hasher,
            JwtKeys::from_config(&config.jwt),
        ));

        Ok(Self::from_parts(config, auth))
    }

    pub fn from_parts(config: Arc<AppConfig>, auth: Arc<AuthService>) -> Self {
        Self { config, auth }
    }
}
