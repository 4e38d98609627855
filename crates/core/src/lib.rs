pub mod config;
pub mod discovery;
pub mod domain;
pub mod errors;

pub use discovery::{
    CatalogFilter, CatalogQuery, CatalogStore, DiscoveryEngine, DiscoveryPolicy, FilterClause,
    PersonalizedRequest, RankedRecommendations, RecommendationClient, RecommendationRequest,
    RecommendedProducts, SimilarRequest, SortDirection, SortKey, SortSpec, TrendingRequest,
};
pub use domain::product::{
    Availability, Product, ProductId, Ratings, SupplierLocation, SupplierRef,
};
pub use errors::{DiscoveryError, DomainError};
