//! Ad-hoc discovery queries against the configured store and delegate.
//! These run the same engine the server wires up, from a short-lived
//! current-thread runtime.

use std::sync::Arc;

use mandi_core::config::{AppConfig, LoadOptions};
use mandi_core::discovery::{
    validate_limit, CatalogFilter, CatalogQuery, CatalogStore, DiscoveryEngine, DiscoveryPolicy,
    PersonalizedRequest, SimilarRequest, SortKey, SortSpec, TrendingRequest,
};
use mandi_core::domain::product::Product;
use mandi_core::errors::DiscoveryError;
use mandi_db::{connect_with_settings, DbPool, SqlCatalogStore};
use mandi_recs::HttpRecommendationClient;

use crate::commands::CommandResult;

type Failure = (&'static str, String, u8);

struct Session {
    runtime: tokio::runtime::Runtime,
    config: AppConfig,
}

fn session(command: &'static str) -> Result<Session, CommandResult> {
    let config = AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })?;

    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            CommandResult::failure(
                command,
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        })?;

    Ok(Session { runtime, config })
}

async fn open_engine(config: &AppConfig) -> Result<(DbPool, DiscoveryEngine), Failure> {
    let pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

    let store = Arc::new(SqlCatalogStore::new(pool.clone()));
    let recommender = Arc::new(
        HttpRecommendationClient::from_config(&config.recommender)
            .map_err(|error| ("recommender_init", error.to_string(), 5u8))?,
    );
    let engine = DiscoveryEngine::with_policy(
        store,
        recommender,
        DiscoveryPolicy { similar_in_stock_only: config.discovery.similar_in_stock_only },
    );

    Ok((pool, engine))
}

fn discovery_failure(error: DiscoveryError) -> Failure {
    let exit_code = if error.is_client_error() { 2u8 } else { 5u8 };
    (
        match &error {
            DiscoveryError::InvalidFilter(_) => "invalid_filter",
            DiscoveryError::NotFound(_) => "not_found",
            DiscoveryError::RecommendationUnavailable(_) => "recommendation_unavailable",
            DiscoveryError::StoreUnavailable(_) => "store_unavailable",
        },
        error.to_string(),
        exit_code,
    )
}

fn render_products(products: &[Product]) -> String {
    if products.is_empty() {
        return "no products matched".to_string();
    }
    products
        .iter()
        .enumerate()
        .map(|(index, product)| {
            format!(
                "{}. {} ({}) popularity={} rating={:.1}",
                index + 1,
                product.name,
                product.id,
                product.popularity,
                product.ratings.average,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn trending(
    state: Option<String>,
    category: Option<String>,
    limit: Option<i64>,
) -> CommandResult {
    let session = match session("trending") {
        Ok(session) => session,
        Err(result) => return result,
    };

    let result = session.runtime.block_on(async {
        let (pool, engine) = open_engine(&session.config).await?;
        let outcome = engine
            .trending(TrendingRequest { state, category, limit })
            .await
            .map_err(discovery_failure);
        pool.close().await;
        outcome
    });

    match result {
        Ok(products) => CommandResult::success("trending", render_products(&products)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("trending", error_class, message, exit_code)
        }
    }
}

pub fn similar(product_id: String, limit: Option<i64>) -> CommandResult {
    let session = match session("similar") {
        Ok(session) => session,
        Err(result) => return result,
    };

    let result = session.runtime.block_on(async {
        let (pool, engine) = open_engine(&session.config).await?;
        let mut request = SimilarRequest::new(product_id);
        request.limit = limit;
        let outcome = engine.similar(request).await.map_err(discovery_failure);
        pool.close().await;
        outcome
    });

    match result {
        Ok(products) => CommandResult::success("similar", render_products(&products)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("similar", error_class, message, exit_code)
        }
    }
}

pub fn recommend(
    user_id: String,
    category: Option<String>,
    limit: Option<i64>,
) -> CommandResult {
    let session = match session("recommend") {
        Ok(session) => session,
        Err(result) => return result,
    };

    let result = session.runtime.block_on(async {
        let (pool, engine) = open_engine(&session.config).await?;
        let mut request = PersonalizedRequest::new(user_id);
        request.category = category;
        request.limit = limit;
        let outcome = engine.personalized(request).await.map_err(discovery_failure);
        pool.close().await;
        outcome
    });

    match result {
        Ok(recommended) => {
            let message = format!(
                "algorithm: {}\n{}",
                recommended.algorithm,
                render_products(&recommended.products)
            );
            CommandResult::success("recommend", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("recommend", error_class, message, exit_code)
        }
    }
}

pub fn search(query: String, limit: Option<i64>) -> CommandResult {
    let session = match session("search") {
        Ok(session) => session,
        Err(result) => return result,
    };

    let result = session.runtime.block_on(async {
        let resolved_limit = validate_limit(limit, 20).map_err(discovery_failure)?;
        let pool = connect_with_settings(
            &session.config.database.url,
            session.config.database.max_connections,
            session.config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let store = SqlCatalogStore::new(pool.clone());
        let catalog_query = CatalogQuery::new(CatalogFilter::new().with_text_search(query))
            .with_sort(vec![
                SortSpec::descending(SortKey::Popularity),
                SortSpec::ascending(SortKey::Id),
            ])
            .with_limit(resolved_limit);
        let outcome = store.query(&catalog_query).await.map_err(discovery_failure);
        pool.close().await;
        outcome
    });

    match result {
        Ok(products) => CommandResult::success("search", render_products(&products)),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("search", error_class, message, exit_code)
        }
    }
}
