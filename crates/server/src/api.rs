//! Discovery API routes.
//!
//! - `GET /api/recommendations/personalized/{user_id}?limit&category`
//! - `GET /api/recommendations/trending?state&category&limit`
//! - `GET /api/recommendations/similar/{product_id}?limit`
//!
//! Response envelopes and error messages follow the service contract:
//! clients always see `{"success": true, ...}` or `{"error": "..."}` with
//! a status that distinguishes bad input (400), a missing reference
//! product (404), and dependency failure (500).

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use mandi_core::discovery::{
    DiscoveryEngine, PersonalizedRequest, SimilarRequest, TrendingRequest,
};
use mandi_core::domain::product::Product;
use mandi_core::errors::DiscoveryError;

#[derive(Clone)]
pub struct ApiState {
    engine: Arc<DiscoveryEngine>,
}

pub fn router(engine: Arc<DiscoveryEngine>) -> Router {
    Router::new()
        .route("/api/recommendations/personalized/{user_id}", get(personalized))
        .route("/api/recommendations/trending", get(trending))
        .route("/api/recommendations/similar/{product_id}", get(similar))
        .with_state(ApiState { engine })
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PersonalizedParams {
    pub limit: Option<i64>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrendingParams {
    pub state: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SimilarParams {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PersonalizedResponse {
    pub success: bool,
    pub recommendations: Vec<Product>,
    pub algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub success: bool,
    pub trending: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct SimilarResponse {
    pub success: bool,
    pub similar: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Clone, Copy, Debug)]
enum Operation {
    Personalized,
    Trending,
    Similar,
}

impl Operation {
    fn failure_message(self) -> &'static str {
        match self {
            Self::Personalized => "Failed to get recommendations",
            Self::Trending => "Failed to get trending products",
            Self::Similar => "Failed to get similar products",
        }
    }
}

fn error_response(operation: Operation, error: &DiscoveryError) -> (StatusCode, Json<ApiError>) {
    match error {
        DiscoveryError::InvalidFilter(detail) => {
            (StatusCode::BAD_REQUEST, Json(ApiError { error: detail.clone() }))
        }
        DiscoveryError::NotFound(_) => {
            (StatusCode::NOT_FOUND, Json(ApiError { error: "Product not found".to_string() }))
        }
        DiscoveryError::RecommendationUnavailable(_) | DiscoveryError::StoreUnavailable(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError { error: operation.failure_message().to_string() }),
        ),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn personalized(
    State(state): State<ApiState>,
    Path(user_id): Path<String>,
    Query(params): Query<PersonalizedParams>,
) -> Result<Json<PersonalizedResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let mut request = PersonalizedRequest::new(user_id);
    if let Some(category) = params.category {
        request = request.with_category(category);
    }
    if let Some(limit) = params.limit {
        request = request.with_limit(limit);
    }

    match state.engine.personalized(request).await {
        Ok(result) => {
            info!(
                event_name = "api.personalized.served",
                correlation_id = %correlation_id,
                algorithm = %result.algorithm,
                returned = result.products.len(),
                "personalized recommendations served"
            );
            Ok(Json(PersonalizedResponse {
                success: true,
                recommendations: result.products,
                algorithm: result.algorithm,
                confidence: result.confidence,
            }))
        }
        Err(error) => {
            warn!(
                event_name = "api.personalized.failed",
                correlation_id = %correlation_id,
                error_kind = error.kind(),
                error = %error,
                "personalized recommendations failed"
            );
            Err(error_response(Operation::Personalized, &error))
        }
    }
}

pub async fn trending(
    State(state): State<ApiState>,
    Query(params): Query<TrendingParams>,
) -> Result<Json<TrendingResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let mut request = TrendingRequest::new();
    if let Some(state_filter) = params.state {
        request = request.with_state(state_filter);
    }
    if let Some(category) = params.category {
        request = request.with_category(category);
    }
    if let Some(limit) = params.limit {
        request = request.with_limit(limit);
    }

    match state.engine.trending(request).await {
        Ok(products) => {
            info!(
                event_name = "api.trending.served",
                correlation_id = %correlation_id,
                returned = products.len(),
                "trending products served"
            );
            Ok(Json(TrendingResponse { success: true, trending: products }))
        }
        Err(error) => {
            warn!(
                event_name = "api.trending.failed",
                correlation_id = %correlation_id,
                error_kind = error.kind(),
                error = %error,
                "trending products failed"
            );
            Err(error_response(Operation::Trending, &error))
        }
    }
}

pub async fn similar(
    State(state): State<ApiState>,
    Path(product_id): Path<String>,
    Query(params): Query<SimilarParams>,
) -> Result<Json<SimilarResponse>, (StatusCode, Json<ApiError>)> {
    let correlation_id = Uuid::new_v4().to_string();

    let mut request = SimilarRequest::new(product_id);
    if let Some(limit) = params.limit {
        request = request.with_limit(limit);
    }

    match state.engine.similar(request).await {
        Ok(products) => {
            info!(
                event_name = "api.similar.served",
                correlation_id = %correlation_id,
                returned = products.len(),
                "similar products served"
            );
            Ok(Json(SimilarResponse { success: true, similar: products }))
        }
        Err(error) => {
            warn!(
                event_name = "api.similar.failed",
                correlation_id = %correlation_id,
                error_kind = error.kind(),
                error = %error,
                "similar products failed"
            );
            Err(error_response(Operation::Similar, &error))
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::Utc;
    use mandi_core::discovery::{
        RankedRecommendations, RecommendationClient, RecommendationRequest,
    };
    use mandi_core::domain::product::{Availability, ProductId, Ratings};
    use mandi_db::InMemoryCatalogStore;
    use rust_decimal::Decimal;

    use super::*;

    struct StaticRecommender {
        response: Result<RankedRecommendations, DiscoveryError>,
    }

    #[async_trait]
    impl RecommendationClient for StaticRecommender {
        async fn recommend(
            &self,
            _request: &RecommendationRequest,
        ) -> Result<RankedRecommendations, DiscoveryError> {
            self.response.clone()
        }
    }

    fn product(id: &str, category: &str, popularity: f64) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: format!("Product {id}"),
            category: category.to_string(),
            subcategory: None,
            brand: None,
            description: None,
            images: Vec::new(),
            tags: Vec::new(),
            price: Decimal::new(7_500, 2),
            currency: "INR".to_string(),
            availability: Availability::default(),
            supplier: None,
            ratings: Ratings { average: 4.0, count: 25 },
            popularity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    async fn state_with(
        products: Vec<Product>,
        response: Result<RankedRecommendations, DiscoveryError>,
    ) -> ApiState {
        let store = InMemoryCatalogStore::default();
        for item in products {
            store.save(item).await.expect("seed product");
        }
        ApiState {
            engine: Arc::new(DiscoveryEngine::new(
                Arc::new(store),
                Arc::new(StaticRecommender { response }),
            )),
        }
    }

    #[tokio::test]
    async fn trending_envelope_carries_ordered_products() {
        let state = state_with(
            vec![product("p1", "Spices", 50.0), product("p2", "Spices", 80.0)],
            Err(DiscoveryError::RecommendationUnavailable("unused".into())),
        )
        .await;

        let Json(payload) = trending(
            State(state),
            Query(TrendingParams { state: None, category: None, limit: Some(2) }),
        )
        .await
        .expect("trending should succeed");

        assert!(payload.success);
        let ids: Vec<&str> = payload.trending.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p2", "p1"]);
    }

    #[tokio::test]
    async fn trending_rejects_bad_limit_with_400() {
        let state = state_with(
            Vec::new(),
            Err(DiscoveryError::RecommendationUnavailable("unused".into())),
        )
        .await;

        let (status, Json(payload)) = trending(
            State(state),
            Query(TrendingParams { state: None, category: None, limit: Some(0) }),
        )
        .await
        .expect_err("zero limit must be rejected");

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(payload.error.contains("limit"));
    }

    #[tokio::test]
    async fn personalized_envelope_carries_algorithm_label() {
        let state = state_with(
            vec![product("p1", "Spices", 10.0)],
            Ok(RankedRecommendations {
                product_ids: vec![ProductId("p1".to_string())],
                algorithm: "hybrid".to_string(),
                confidence: Some(0.82),
            }),
        )
        .await;

        let Json(payload) = personalized(
            State(state),
            Path("retailer-42".to_string()),
            Query(PersonalizedParams { limit: None, category: None }),
        )
        .await
        .expect("personalized should succeed");

        assert!(payload.success);
        assert_eq!(payload.algorithm, "hybrid");
        assert_eq!(payload.confidence, Some(0.82));
        assert_eq!(payload.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn delegate_failure_maps_to_500_with_contract_message() {
        let state = state_with(
            vec![product("p1", "Spices", 10.0)],
            Err(DiscoveryError::RecommendationUnavailable("request timed out".into())),
        )
        .await;

        let (status, Json(payload)) = personalized(
            State(state),
            Path("retailer-42".to_string()),
            Query(PersonalizedParams { limit: None, category: None }),
        )
        .await
        .expect_err("delegate failure must surface");

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload.error, "Failed to get recommendations");
    }

    #[tokio::test]
    async fn unknown_reference_product_maps_to_404() {
        let state = state_with(
            Vec::new(),
            Err(DiscoveryError::RecommendationUnavailable("unused".into())),
        )
        .await;

        let (status, Json(payload)) = similar(
            State(state),
            Path("nonexistent-id".to_string()),
            Query(SimilarParams { limit: None }),
        )
        .await
        .expect_err("missing reference must surface");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(payload.error, "Product not found");
    }

    #[tokio::test]
    async fn similar_excludes_the_reference_product() {
        let state = state_with(
            vec![product("ref", "Spices", 10.0), product("p1", "Spices", 20.0)],
            Err(DiscoveryError::RecommendationUnavailable("unused".into())),
        )
        .await;

        let Json(payload) =
            similar(State(state), Path("ref".to_string()), Query(SimilarParams { limit: None }))
                .await
                .expect("similar should succeed");

        assert!(payload.success);
        let ids: Vec<&str> = payload.similar.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p1"]);
    }
}
