//! Attribute-overlap similarity between a reference product and catalog
//! candidates. No precomputed index: candidates come from one disjunctive
//! store query and are scored in memory.

use crate::discovery::filter::{CatalogFilter, FilterClause};
use crate::domain::product::Product;

/// Candidate predicate for a reference product: same category, OR tag
/// intersection, OR same brand, always excluding the reference itself.
/// Clauses for attributes the reference lacks are omitted entirely.
pub fn candidate_filter(reference: &Product, in_stock_only: bool) -> CatalogFilter {
    let mut group = vec![FilterClause::CategoryEq(reference.category.clone())];
    if !reference.tags.is_empty() {
        group.push(FilterClause::TagsAnyOf(reference.tags.clone()));
    }
    if let Some(brand) = &reference.brand {
        group.push(FilterClause::BrandEq(brand.clone()));
    }

    let mut filter =
        CatalogFilter::new().excluding_id(reference.id.clone()).with_any_of(group);
    if in_stock_only {
        filter = filter.in_stock_only();
    }
    filter
}

/// Match strength: one point for a shared category, one per overlapping
/// tag, one for a shared brand. A candidate matching all three outranks
/// one matching a single criterion.
pub fn match_strength(reference: &Product, candidate: &Product) -> u32 {
    let mut strength = 0;
    if candidate.category == reference.category {
        strength += 1;
    }
    strength +=
        reference.tags.iter().filter(|tag| candidate.tags.contains(tag)).count() as u32;
    if reference.brand.is_some() && candidate.brand == reference.brand {
        strength += 1;
    }
    strength
}

/// Score, order (strength descending, id ascending), truncate.
pub fn rank_similar(reference: &Product, candidates: Vec<Product>, limit: usize) -> Vec<Product> {
    let mut scored: Vec<(u32, Product)> = candidates
        .into_iter()
        .filter(|candidate| candidate.id != reference.id)
        .map(|candidate| (match_strength(reference, &candidate), candidate))
        .collect();

    scored.sort_by(|(strength_a, a), (strength_b, b)| {
        strength_b.cmp(strength_a).then_with(|| a.id.cmp(&b.id))
    });

    scored.into_iter().take(limit).map(|(_, candidate)| candidate).collect()
}
