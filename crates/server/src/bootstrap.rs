use std::sync::Arc;

use mandi_core::config::{AppConfig, ConfigError, LoadOptions};
use mandi_core::discovery::{DiscoveryEngine, DiscoveryPolicy};
use mandi_db::{connect_with_settings, migrations, DbPool, SqlCatalogStore};
use mandi_recs::HttpRecommendationClient;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub engine: Arc<DiscoveryEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("recommendation client init failed: {0}")]
    Recommender(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let store = Arc::new(SqlCatalogStore::new(db_pool.clone()));
    let recommender = Arc::new(
        HttpRecommendationClient::from_config(&config.recommender)
            .map_err(|error| BootstrapError::Recommender(error.to_string()))?,
    );
    let engine = Arc::new(DiscoveryEngine::with_policy(
        store,
        recommender,
        DiscoveryPolicy { similar_in_stock_only: config.discovery.similar_in_stock_only },
    ));
    info!(
        event_name = "system.bootstrap.engine_wired",
        correlation_id = "bootstrap",
        similar_in_stock_only = config.discovery.similar_in_stock_only,
        "discovery engine wired to store and delegate"
    );

    Ok(Application { config, db_pool, engine })
}

#[cfg(test)]
mod tests {
    use mandi_core::config::{ConfigOverrides, LoadOptions};
    use mandi_core::discovery::TrendingRequest;
    use mandi_db::DemoCatalog;

    use crate::bootstrap::bootstrap;

    fn valid_overrides(database_url: &str) -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some(database_url.to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_on_invalid_delegate_url() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                recommender_base_url: Some("not-a-url".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
        let message = result.err().expect("error").to_string();
        assert!(message.contains("recommender.base_url"));
    }

    #[tokio::test]
    async fn integration_smoke_covers_startup_and_discovery_read_path() {
        let app = bootstrap(valid_overrides("sqlite::memory:?cache=shared"))
            .await
            .expect("bootstrap should succeed with valid overrides");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'product'",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected product table to be available after bootstrap");
        assert_eq!(table_count, 1, "bootstrap should expose the product catalog table");

        DemoCatalog::load(&app.db_pool).await.expect("load demo catalog");

        let trending = app
            .engine
            .trending(TrendingRequest::new().with_category("Spices").with_limit(3))
            .await
            .expect("trending query should succeed over seeded catalog");
        assert!(!trending.is_empty());
        assert!(trending.len() <= 3);
        for pair in trending.windows(2) {
            assert!(
                pair[0].popularity >= pair[1].popularity,
                "trending results should be ordered by popularity",
            );
        }

        app.db_pool.close().await;
    }
}
