use sqlx::Executor;

use crate::catalog::RepositoryError;
use crate::connection::DbPool;

/// Canonical demo catalog contract: one entry per seeded product.
const SEED_PRODUCTS: &[SeedProductContract] = &[
    SeedProductContract {
        id: "prod-pepper-001",
        category: "Spices",
        supplier_state: "Kerala",
        popularity: 310.0,
    },
    SeedProductContract {
        id: "prod-cardamom-002",
        category: "Spices",
        supplier_state: "Kerala",
        popularity: 280.0,
    },
    SeedProductContract {
        id: "prod-turmeric-003",
        category: "Spices",
        supplier_state: "Meghalaya",
        popularity: 350.0,
    },
    SeedProductContract {
        id: "prod-rice-004",
        category: "Grains",
        supplier_state: "Telangana",
        popularity: 520.0,
    },
    SeedProductContract {
        id: "prod-wheat-005",
        category: "Grains",
        supplier_state: "Madhya Pradesh",
        popularity: 410.0,
    },
    SeedProductContract {
        id: "prod-millet-006",
        category: "Grains",
        supplier_state: "Karnataka",
        popularity: 150.0,
    },
    SeedProductContract {
        id: "prod-saree-007",
        category: "Textiles",
        supplier_state: "Andhra Pradesh",
        popularity: 95.0,
    },
    SeedProductContract {
        id: "prod-fabric-008",
        category: "Textiles",
        supplier_state: "Gujarat",
        popularity: 60.0,
    },
    SeedProductContract {
        id: "prod-cashew-009",
        category: "Snacks",
        supplier_state: "Goa",
        popularity: 480.0,
    },
    SeedProductContract {
        id: "prod-tea-010",
        category: "Beverages",
        supplier_state: "Assam",
        popularity: 390.0,
    },
];

/// Deterministic wholesale catalog used by `mandi seed`, demos, and the
/// store contract tests.
pub struct DemoCatalog;

impl DemoCatalog {
    /// SQL fixture content for the demo catalog.
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_catalog.sql");

    /// Load the demo catalog into the database. Idempotent.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult { product_ids: SEED_PRODUCTS.iter().map(|seed| seed.id).collect() })
    }

    /// Verify that every seeded product exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for seed in SEED_PRODUCTS {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM product \
                 WHERE id = ?1 AND category = ?2 AND supplier_state = ?3 AND popularity = ?4)",
            )
            .bind(seed.id)
            .bind(seed.category)
            .bind(seed.supplier_state)
            .bind(seed.popularity)
            .fetch_one(pool)
            .await?;
            checks.push((seed.id, exists == 1));
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM product").fetch_one(pool).await?;
        checks.push(("catalog-not-empty", total >= SEED_PRODUCTS.len() as i64));

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded fixtures from a test database.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for seed in SEED_PRODUCTS {
            sqlx::query("DELETE FROM product WHERE id = ?1").bind(seed.id).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedProductContract {
    id: &'static str,
    category: &'static str,
    supplier_state: &'static str,
    popularity: f64,
}

#[derive(Debug)]
pub struct SeedResult {
    pub product_ids: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    #[test]
    fn sql_fixture_is_valid() {
        assert!(!DemoCatalog::SQL.is_empty());
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");

        let first = DemoCatalog::load(&pool).await.expect("load seed fixtures");
        let first_verification = DemoCatalog::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present);
        assert_eq!(first.product_ids.len(), 10);

        let second = DemoCatalog::load(&pool).await.expect("reload seed fixtures");
        let second_verification =
            DemoCatalog::verify(&pool).await.expect("re-verify seed fixtures");
        assert!(second_verification.all_present);
        assert_eq!(second.product_ids.len(), 10);
        assert_eq!(first_verification.checks, second_verification.checks);
    }

    #[tokio::test]
    async fn clean_removes_all_seeded_products() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");

        migrations::run_pending(&pool).await.expect("run migrations");
        DemoCatalog::load(&pool).await.expect("load seed fixtures");
        DemoCatalog::clean(&pool).await.expect("clean seed fixtures");

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(1) FROM product").fetch_one(&pool).await.expect("count");
        assert_eq!(total, 0);
    }

    #[test]
    fn seed_contract_json_matches_rust_seed_constants() {
        let contract: serde_json::Value = serde_json::from_str(include_str!(
            "../../../config/fixtures/demo_catalog_contract.json"
        ))
        .expect("demo catalog contract JSON must parse");

        assert_eq!(contract["dataset_version"].as_str(), Some("demo-catalog-1.0.0"));
        assert_eq!(contract["seed_dataset"].as_str(), Some("deterministic_wholesale_catalog"));

        let contract_products =
            contract["products"].as_array().expect("products should be an array");
        assert_eq!(contract_products.len(), SEED_PRODUCTS.len());

        for seed in SEED_PRODUCTS {
            let contract_product = contract_products
                .iter()
                .find(|candidate| candidate["id"].as_str() == Some(seed.id))
                .expect("contract should include every seeded product");

            assert_eq!(contract_product["category"].as_str(), Some(seed.category));
            assert_eq!(contract_product["supplier_state"].as_str(), Some(seed.supplier_state));
            assert_eq!(
                contract_product["popularity"].as_f64().unwrap_or_default(),
                seed.popularity
            );
        }
    }
}
