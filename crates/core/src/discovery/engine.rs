//! Discovery orchestrator: composes the query builder, ranking engine,
//! and similarity matcher over the store and delegate capabilities.
//! Every operation is a stateless request/response cycle with no caching,
//! no retries, and no side effects.

use std::sync::Arc;

use crate::discovery::filter::{validate_limit, CatalogFilter, CatalogQuery, SortKey, SortSpec};
use crate::discovery::ranking::{rank_trending, resolve_in_delegate_order};
use crate::discovery::similarity::{candidate_filter, rank_similar};
use crate::discovery::{
    CatalogStore, RecommendationClient, RecommendationRequest, DEFAULT_PERSONALIZED_LIMIT,
    DEFAULT_SIMILAR_LIMIT, DEFAULT_TRENDING_LIMIT,
};
use crate::domain::product::{Product, ProductId};
use crate::errors::DiscoveryError;

/// Tunable discovery behavior that is policy, not contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiscoveryPolicy {
    /// Restrict similar-product candidates to in-stock items.
    pub similar_in_stock_only: bool,
}

#[derive(Clone, Debug)]
pub struct PersonalizedRequest {
    pub user_id: String,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

impl PersonalizedRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self { user_id: user_id.into(), category: None, limit: None }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct TrendingRequest {
    pub state: Option<String>,
    pub category: Option<String>,
    pub limit: Option<i64>,
}

impl TrendingRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Clone, Debug)]
pub struct SimilarRequest {
    pub product_id: ProductId,
    pub limit: Option<i64>,
}

impl SimilarRequest {
    pub fn new(product_id: impl Into<String>) -> Self {
        Self { product_id: ProductId(product_id.into()), limit: None }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Personalized results carry the delegate's algorithm label so callers
/// can tell which strategy produced the ranking.
#[derive(Clone, Debug, PartialEq)]
pub struct RecommendedProducts {
    pub products: Vec<Product>,
    pub algorithm: String,
    pub confidence: Option<f64>,
}

pub struct DiscoveryEngine {
    store: Arc<dyn CatalogStore>,
    recommender: Arc<dyn RecommendationClient>,
    policy: DiscoveryPolicy,
}

impl DiscoveryEngine {
    pub fn new(store: Arc<dyn CatalogStore>, recommender: Arc<dyn RecommendationClient>) -> Self {
        Self::with_policy(store, recommender, DiscoveryPolicy::default())
    }

    pub fn with_policy(
        store: Arc<dyn CatalogStore>,
        recommender: Arc<dyn RecommendationClient>,
        policy: DiscoveryPolicy,
    ) -> Self {
        Self { store, recommender, policy }
    }

    /// Personalized recommendations: the delegate's ranking is
    /// authoritative. A delegate failure surfaces as
    /// `RecommendationUnavailable`; there is no silent trending fallback,
    /// which would misrepresent personalization.
    pub async fn personalized(
        &self,
        request: PersonalizedRequest,
    ) -> Result<RecommendedProducts, DiscoveryError> {
        if request.user_id.trim().is_empty() {
            return Err(DiscoveryError::InvalidFilter("user id must not be empty".into()));
        }
        if let Some(category) = &request.category {
            if category.trim().is_empty() {
                return Err(DiscoveryError::InvalidFilter(
                    "category filter must not be empty".into(),
                ));
            }
        }
        let limit = validate_limit(request.limit, DEFAULT_PERSONALIZED_LIMIT)?;

        let ranked = self
            .recommender
            .recommend(&RecommendationRequest {
                user_id: request.user_id,
                category: request.category,
                limit,
            })
            .await?;

        // An empty delegate ranking is a valid answer, not a failure.
        if ranked.product_ids.is_empty() {
            return Ok(RecommendedProducts {
                products: Vec::new(),
                algorithm: ranked.algorithm,
                confidence: ranked.confidence,
            });
        }

        let fetched = self.store.find_by_ids(&ranked.product_ids).await?;
        let products = resolve_in_delegate_order(&ranked.product_ids, fetched);

        Ok(RecommendedProducts {
            products,
            algorithm: ranked.algorithm,
            confidence: ranked.confidence,
        })
    }

    /// Trending products under optional state/category filters.
    pub async fn trending(&self, request: TrendingRequest) -> Result<Vec<Product>, DiscoveryError> {
        let limit = validate_limit(request.limit, DEFAULT_TRENDING_LIMIT)?;

        let mut filter = CatalogFilter::new();
        if let Some(state) = request.state {
            filter = filter.with_supplier_state(state);
        }
        if let Some(category) = request.category {
            filter = filter.with_category(category);
        }

        // Sort pushed down for backends that can use it; no limit, since
        // the ranking engine truncates only after the full sort.
        let query = CatalogQuery::new(filter).with_sort(vec![
            SortSpec::descending(SortKey::Popularity),
            SortSpec::descending(SortKey::RatingAverage),
            SortSpec::ascending(SortKey::Id),
        ]);
        query.validate()?;

        let candidates = self.store.query(&query).await?;
        Ok(rank_trending(candidates, limit))
    }

    /// Products similar to a reference product by attribute overlap.
    pub async fn similar(&self, request: SimilarRequest) -> Result<Vec<Product>, DiscoveryError> {
        let limit = validate_limit(request.limit, DEFAULT_SIMILAR_LIMIT)?;

        let reference = self
            .store
            .find_by_id(&request.product_id)
            .await?
            .ok_or_else(|| DiscoveryError::NotFound(request.product_id.to_string()))?;

        let query =
            CatalogQuery::new(candidate_filter(&reference, self.policy.similar_in_stock_only));
        query.validate()?;

        let candidates = self.store.query(&query).await?;
        Ok(rank_similar(&reference, candidates, limit))
    }
}
