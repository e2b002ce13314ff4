use sqlx::mysql::MySqlPool;
use tracing::info;

use crate::api::paypal::PayPalClient;
use crate::config::Config;
use crate::db::{self, AnyTokenStore, MemoryTokenStore, MySqlTokenStore};
use crate::error::AppError;
use crate::services::TokenProvider;

/// Everything a PayPal-facing command needs
pub struct AppContext {
    pub config: Config,
    pub client: PayPalClient,
    pub pool: Option<MySqlPool>,
    pub tokens: TokenProvider<AnyTokenStore>,
}

impl AppContext {
    pub async fn init(config: Config) -> Result<Self, AppError> {
        let client = PayPalClient::new(&config.base_url, config.timeout)?;
        info!("Using PayPal API at {}", client.base_url());

        let pool = match &config.database_url {
            Some(url) => {
                info!("Initializing database...");
                Some(db::init_db(url).await.map_err(crate::error::StoreError::from)?)
            }
            None => None,
        };

        let store = match &pool {
            Some(pool) => {
                AnyTokenStore::MySql(MySqlTokenStore::new(pool.clone(), config.encryption_key.clone()))
            }
            None => {
                info!("DATABASE_URL not set; tokens are kept in memory");
                AnyTokenStore::Memory(MemoryTokenStore::new())
            }
        };

        let tokens = TokenProvider::from_config(&config, client.clone(), store);

        Ok(Self {
            config,
            client,
            pool,
            tokens,
        })
    }

    pub fn require_pool(&self, flag: &str) -> Result<&MySqlPool, AppError> {
        self.pool
            .as_ref()
            .ok_or_else(|| AppError::Usage(format!("{} needs DATABASE_URL to be set", flag)))
    }
}

/// Pool for commands that only touch the database
pub async fn connect_database() -> Result<MySqlPool, AppError> {
    let url = Config::database_url_from_env()?;

    db::init_db(&url)
        .await
        .map_err(|e| AppError::Store(e.into()))
}
