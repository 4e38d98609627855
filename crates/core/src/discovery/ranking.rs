//! Result ordering policies for discovery queries.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::domain::product::{Product, ProductId};

/// Trending total order: popularity descending, then average rating
/// descending, then id ascending. The id key guarantees a deterministic
/// order under equal popularity and rating.
pub fn compare_trending(a: &Product, b: &Product) -> Ordering {
    b.popularity
        .total_cmp(&a.popularity)
        .then_with(|| b.ratings.average.total_cmp(&a.ratings.average))
        .then_with(|| a.id.cmp(&b.id))
}

/// Order the full candidate set, then truncate. Truncating first would
/// drop higher-ranked items that landed outside an unsorted prefix.
pub fn rank_trending(mut candidates: Vec<Product>, limit: usize) -> Vec<Product> {
    candidates.sort_by(compare_trending);
    candidates.truncate(limit);
    candidates
}

/// Re-order fetched products to the delegate's id ranking. Ids with no
/// catalog record are dropped silently (deleted products are expected);
/// an id repeated by the delegate resolves once, keeping its first rank.
pub fn resolve_in_delegate_order(ids: &[ProductId], products: Vec<Product>) -> Vec<Product> {
    let mut by_id: HashMap<String, Product> =
        products.into_iter().map(|product| (product.id.0.clone(), product)).collect();

    ids.iter().filter_map(|id| by_id.remove(id.as_str())).collect()
}
