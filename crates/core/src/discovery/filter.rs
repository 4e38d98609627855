//! Composable read predicates accepted by any catalog store backend.
//!
//! A `CatalogFilter` is a conjunction of clauses; a clause that was never
//! set contributes nothing (absence is not an empty-string match). The
//! similarity matcher nests one disjunctive `AnyOf` group inside the
//! outer AND.

use std::cmp::Ordering;

use crate::domain::product::{Product, ProductId};
use crate::errors::DiscoveryError;

/// Hard ceiling on caller-requested result limits.
pub const MAX_RESULT_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub enum FilterClause {
    CategoryEq(String),
    SupplierStateEq(String),
    BrandEq(String),
    /// Matches products whose tag set intersects the given tags.
    TagsAnyOf(Vec<String>),
    /// Case-insensitive substring match over name, description, and tags.
    TextSearch(String),
    ExcludeId(ProductId),
    IdIn(Vec<ProductId>),
    InStockOnly,
    /// Disjunctive group: matches when any inner clause matches.
    AnyOf(Vec<FilterClause>),
}

impl FilterClause {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Self::CategoryEq(category) => product.category == *category,
            Self::SupplierStateEq(state) => product.supplier_state() == Some(state.as_str()),
            Self::BrandEq(brand) => product.brand.as_deref() == Some(brand.as_str()),
            Self::TagsAnyOf(tags) => product.tags.iter().any(|tag| tags.contains(tag)),
            Self::TextSearch(needle) => {
                let needle = needle.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product
                        .description
                        .as_ref()
                        .is_some_and(|text| text.to_lowercase().contains(&needle))
                    || product.tags.iter().any(|tag| tag.to_lowercase().contains(&needle))
            }
            Self::ExcludeId(id) => product.id != *id,
            Self::IdIn(ids) => ids.contains(&product.id),
            Self::InStockOnly => product.availability.in_stock,
            Self::AnyOf(group) => group.iter().any(|clause| clause.matches(product)),
        }
    }

    fn validate(&self) -> Result<(), DiscoveryError> {
        match self {
            Self::CategoryEq(value) if value.trim().is_empty() => {
                Err(DiscoveryError::InvalidFilter("category filter must not be empty".into()))
            }
            Self::SupplierStateEq(value) if value.trim().is_empty() => {
                Err(DiscoveryError::InvalidFilter("supplier state filter must not be empty".into()))
            }
            Self::BrandEq(value) if value.trim().is_empty() => {
                Err(DiscoveryError::InvalidFilter("brand filter must not be empty".into()))
            }
            Self::TextSearch(value) if value.trim().is_empty() => {
                Err(DiscoveryError::InvalidFilter("text search filter must not be empty".into()))
            }
            Self::TagsAnyOf(tags) if tags.is_empty() => {
                Err(DiscoveryError::InvalidFilter("tag membership filter must name tags".into()))
            }
            Self::IdIn(ids) if ids.is_empty() => {
                Err(DiscoveryError::InvalidFilter("id membership filter must name ids".into()))
            }
            Self::AnyOf(group) => {
                if group.is_empty() {
                    return Err(DiscoveryError::InvalidFilter(
                        "disjunctive group must contain at least one clause".into(),
                    ));
                }
                group.iter().try_for_each(FilterClause::validate)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogFilter {
    clauses: Vec<FilterClause>,
}

impl CatalogFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.clauses.push(FilterClause::CategoryEq(category.into()));
        self
    }

    pub fn with_supplier_state(mut self, state: impl Into<String>) -> Self {
        self.clauses.push(FilterClause::SupplierStateEq(state.into()));
        self
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.clauses.push(FilterClause::BrandEq(brand.into()));
        self
    }

    pub fn with_tags_any_of(mut self, tags: Vec<String>) -> Self {
        self.clauses.push(FilterClause::TagsAnyOf(tags));
        self
    }

    pub fn with_text_search(mut self, needle: impl Into<String>) -> Self {
        self.clauses.push(FilterClause::TextSearch(needle.into()));
        self
    }

    pub fn excluding_id(mut self, id: ProductId) -> Self {
        self.clauses.push(FilterClause::ExcludeId(id));
        self
    }

    pub fn with_ids(mut self, ids: Vec<ProductId>) -> Self {
        self.clauses.push(FilterClause::IdIn(ids));
        self
    }

    pub fn in_stock_only(mut self) -> Self {
        self.clauses.push(FilterClause::InStockOnly);
        self
    }

    pub fn with_any_of(mut self, group: Vec<FilterClause>) -> Self {
        self.clauses.push(FilterClause::AnyOf(group));
        self
    }

    pub fn clauses(&self) -> &[FilterClause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn validate(&self) -> Result<(), DiscoveryError> {
        self.clauses.iter().try_for_each(FilterClause::validate)
    }

    /// Evaluate the conjunction in memory. An empty filter matches
    /// everything.
    pub fn matches(&self, product: &Product) -> bool {
        self.clauses.iter().all(|clause| clause.matches(product))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Popularity,
    RatingAverage,
    CreatedAt,
    Id,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        Self { key, direction: SortDirection::Ascending }
    }

    pub fn descending(key: SortKey) -> Self {
        Self { key, direction: SortDirection::Descending }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.key {
            SortKey::Popularity => a.popularity.total_cmp(&b.popularity),
            SortKey::RatingAverage => a.ratings.average.total_cmp(&b.ratings.average),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::Id => a.id.cmp(&b.id),
        };
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Apply a multi-key sort specification in place.
pub fn apply_sort(products: &mut [Product], sort: &[SortSpec]) {
    if sort.is_empty() {
        return;
    }
    products.sort_by(|a, b| {
        sort.iter()
            .map(|spec| spec.compare(a, b))
            .find(|ordering| !ordering.is_eq())
            .unwrap_or(Ordering::Equal)
    });
}

/// A read query: predicate, optional sort, optional truncation. Stores
/// must sort before truncating.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogQuery {
    pub filter: CatalogFilter,
    pub sort: Vec<SortSpec>,
    pub limit: Option<usize>,
}

impl CatalogQuery {
    pub fn new(filter: CatalogFilter) -> Self {
        Self { filter, sort: Vec::new(), limit: None }
    }

    pub fn with_sort(mut self, sort: Vec<SortSpec>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), DiscoveryError> {
        self.filter.validate()
    }
}

/// Resolve a caller-requested limit against an operation default.
pub fn validate_limit(requested: Option<i64>, default: usize) -> Result<usize, DiscoveryError> {
    match requested {
        None => Ok(default),
        Some(value) if value <= 0 => Err(DiscoveryError::InvalidFilter(format!(
            "limit must be a positive integer, got {value}"
        ))),
        Some(value) if value as usize > MAX_RESULT_LIMIT => Err(DiscoveryError::InvalidFilter(
            format!("limit must not exceed {MAX_RESULT_LIMIT}, got {value}"),
        )),
        Some(value) => Ok(value as usize),
    }
}
