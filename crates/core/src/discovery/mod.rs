//! Product discovery: filter composition, ranking, similarity matching,
//! and the orchestrator tying them to the two external collaborators.
//!
//! The catalog store and the recommendation delegate are capability
//! interfaces; any backend satisfying them is a valid substrate.

mod engine;
mod filter;
mod ranking;
mod similarity;

use async_trait::async_trait;

use crate::domain::product::{Product, ProductId};
use crate::errors::DiscoveryError;

pub use engine::{
    DiscoveryEngine, DiscoveryPolicy, PersonalizedRequest, RecommendedProducts, SimilarRequest,
    TrendingRequest,
};
pub use filter::{
    apply_sort, validate_limit, CatalogFilter, CatalogQuery, FilterClause, SortDirection,
    SortKey, SortSpec, MAX_RESULT_LIMIT,
};
pub use ranking::{compare_trending, rank_trending, resolve_in_delegate_order};
pub use similarity::{candidate_filter, match_strength, rank_similar};

/// Default result limits per operation.
pub const DEFAULT_PERSONALIZED_LIMIT: usize = 10;
pub const DEFAULT_TRENDING_LIMIT: usize = 20;
pub const DEFAULT_SIMILAR_LIMIT: usize = 8;

/// Read-only catalog access. Implementations must evaluate the full
/// filter, sort before truncating, and surface backend failures as
/// `StoreUnavailable`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn query(&self, query: &CatalogQuery) -> Result<Vec<Product>, DiscoveryError>;

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DiscoveryError>;

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, DiscoveryError>;
}

/// Outbound request to the recommendation delegate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub category: Option<String>,
    pub limit: usize,
}

/// Ranked response from the delegate: product ids in rank order plus the
/// algorithm label it chose (and a confidence figure when reported).
#[derive(Clone, Debug, PartialEq)]
pub struct RankedRecommendations {
    pub product_ids: Vec<ProductId>,
    pub algorithm: String,
    pub confidence: Option<f64>,
}

/// Scoring oracle behind a network boundary. Any transport failure,
/// non-success status, or schema mismatch surfaces as
/// `RecommendationUnavailable`.
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<RankedRecommendations, DiscoveryError>;
}
