use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use mandi_core::discovery::{apply_sort, CatalogQuery, CatalogStore};
use mandi_core::domain::product::{dedup_tags, Product, ProductId};
use mandi_core::errors::DiscoveryError;

use crate::catalog::RepositoryError;

/// Catalog store for tests and contract mirroring: same capability
/// surface as the SQL store, evaluated in memory.
#[derive(Default)]
pub struct InMemoryCatalogStore {
    products: RwLock<HashMap<String, Product>>,
}

impl InMemoryCatalogStore {
    pub async fn save(&self, mut product: Product) -> Result<(), RepositoryError> {
        product.tags = dedup_tags(std::mem::take(&mut product.tags));
        product.validate()?;
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn query(&self, query: &CatalogQuery) -> Result<Vec<Product>, DiscoveryError> {
        query.validate()?;
        let mut matched: Vec<Product> = {
            let products = self.products.read().await;
            products.values().filter(|product| query.filter.matches(product)).cloned().collect()
        };
        apply_sort(&mut matched, &query.sort);
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DiscoveryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, DiscoveryError> {
        let products = self.products.read().await;
        Ok(ids.iter().filter_map(|id| products.get(&id.0).cloned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mandi_core::discovery::{CatalogFilter, SortKey, SortSpec};
    use mandi_core::domain::product::{Availability, Ratings};
    use rust_decimal::Decimal;

    use super::*;

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
            price: Decimal::new(5_000, 2),
            currency: "INR".to_string(),
            availability: Availability::default(),
            supplier: None,
            ratings: Ratings::default(),
            popularity,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trip() {
        let store = InMemoryCatalogStore::default();
        let item = product("p1", "Spices", 10.0);

        store.save(item.clone()).await.expect("save product");
        let found = store.find_by_id(&item.id).await.expect("find product");

        assert_eq!(found, Some(item));
    }

    #[tokio::test]
    async fn query_filters_sorts_and_truncates() {
        let store = InMemoryCatalogStore::default();
        store.save(product("p1", "Spices", 10.0)).await.expect("save");
        store.save(product("p2", "Spices", 90.0)).await.expect("save");
        store.save(product("p3", "Grains", 50.0)).await.expect("save");

        let query = CatalogQuery::new(CatalogFilter::new().with_category("Spices"))
            .with_sort(vec![SortSpec::descending(SortKey::Popularity)])
            .with_limit(1);
        let matched = store.query(&query).await.expect("query");

        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id.as_str(), "p2");
    }

    #[tokio::test]
    async fn find_by_ids_skips_unknown_ids() {
        let store = InMemoryCatalogStore::default();
        store.save(product("p1", "Spices", 0.0)).await.expect("save");

        let found = store
            .find_by_ids(&[ProductId("missing".to_string()), ProductId("p1".to_string())])
            .await
            .expect("find products");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id.as_str(), "p1");
    }
}
