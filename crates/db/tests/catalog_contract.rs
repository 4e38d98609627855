//! Contract test: the SQL store and the in-memory store must agree on
//! every query shape the discovery engine issues, over the same catalog.

use mandi_core::discovery::{
    CatalogFilter, CatalogQuery, CatalogStore, FilterClause, SortKey, SortSpec,
};
use mandi_core::domain::product::ProductId;
use mandi_db::{connect_with_settings, migrations, DemoCatalog, InMemoryCatalogStore, SqlCatalogStore};

async fn seeded_stores() -> (SqlCatalogStore, InMemoryCatalogStore) {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .expect("connect to test database");
    migrations::run_pending(&pool).await.expect("run migrations");
    DemoCatalog::load(&pool).await.expect("load demo catalog");

    let sql_store = SqlCatalogStore::new(pool);
    let memory_store = InMemoryCatalogStore::default();
    let everything = sql_store.query(&CatalogQuery::default()).await.expect("load all products");
    for product in everything {
        memory_store.save(product).await.expect("mirror product");
    }

    (sql_store, memory_store)
}

async fn assert_stores_agree(query: CatalogQuery) {
    let (sql_store, memory_store) = seeded_stores().await;

    let from_sql = sql_store.query(&query).await.expect("sql query");
    let from_memory = memory_store.query(&query).await.expect("memory query");

    let sql_ids: Vec<String> = from_sql.iter().map(|p| p.id.0.clone()).collect();
    let memory_ids: Vec<String> = from_memory.iter().map(|p| p.id.0.clone()).collect();
    assert_eq!(sql_ids, memory_ids, "stores disagree for query: {query:?}");
    assert_eq!(from_sql, from_memory);
}

#[tokio::test]
async fn stores_agree_on_the_trending_query_shape() {
    assert_stores_agree(
        CatalogQuery::new(CatalogFilter::new().with_category("Grains")).with_sort(vec![
            SortSpec::descending(SortKey::Popularity),
            SortSpec::descending(SortKey::RatingAverage),
            SortSpec::ascending(SortKey::Id),
        ]),
    )
    .await;
}

#[tokio::test]
async fn stores_agree_on_the_state_filtered_trending_query() {
    assert_stores_agree(
        CatalogQuery::new(CatalogFilter::new().with_supplier_state("Kerala")).with_sort(vec![
            SortSpec::descending(SortKey::Popularity),
            SortSpec::descending(SortKey::RatingAverage),
            SortSpec::ascending(SortKey::Id),
        ]),
    )
    .await;
}

#[tokio::test]
async fn stores_agree_on_the_similarity_query_shape() {
    assert_stores_agree(
        CatalogQuery::new(
            CatalogFilter::new()
                .excluding_id(ProductId("prod-pepper-001".to_string()))
                .with_any_of(vec![
                    FilterClause::CategoryEq("Spices".to_string()),
                    FilterClause::TagsAnyOf(vec![
                        "organic".to_string(),
                        "wholesale".to_string(),
                    ]),
                    FilterClause::BrandEq("Kerala Naturals".to_string()),
                ]),
        )
        .with_sort(vec![SortSpec::ascending(SortKey::Id)]),
    )
    .await;
}

#[tokio::test]
async fn stores_agree_on_text_search() {
    assert_stores_agree(
        CatalogQuery::new(CatalogFilter::new().with_text_search("handloom"))
            .with_sort(vec![SortSpec::ascending(SortKey::Id)]),
    )
    .await;
}

#[tokio::test]
async fn stores_agree_on_in_stock_filtering() {
    assert_stores_agree(
        CatalogQuery::new(CatalogFilter::new().with_category("Textiles").in_stock_only())
            .with_sort(vec![SortSpec::ascending(SortKey::Id)]),
    )
    .await;
}

#[tokio::test]
async fn stores_agree_on_id_membership_lookups() {
    let (sql_store, memory_store) = seeded_stores().await;
    let ids = vec![
        ProductId("prod-tea-010".to_string()),
        ProductId("prod-missing".to_string()),
        ProductId("prod-rice-004".to_string()),
    ];

    let mut from_sql = sql_store.find_by_ids(&ids).await.expect("sql lookup");
    let mut from_memory = memory_store.find_by_ids(&ids).await.expect("memory lookup");
    from_sql.sort_by(|a, b| a.id.cmp(&b.id));
    from_memory.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(from_sql, from_memory);
    assert_eq!(from_sql.len(), 2);
}

#[tokio::test]
async fn sort_happens_before_truncation_in_the_sql_store() {
    let (sql_store, _) = seeded_stores().await;

    let query = CatalogQuery::new(CatalogFilter::new())
        .with_sort(vec![SortSpec::descending(SortKey::Popularity)])
        .with_limit(3);
    let top = sql_store.query(&query).await.expect("query");

    let ids: Vec<&str> = top.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["prod-rice-004", "prod-cashew-009", "prod-wheat-005"]);
}
