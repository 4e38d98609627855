//! SQLite-backed catalog store. Filters translate to SQL through
//! `sqlx::QueryBuilder`; tag and image collections live as JSON arrays
//! and are matched with `json_each`.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};
use thiserror::Error;
use uuid::Uuid;

use mandi_core::discovery::{
    CatalogQuery, CatalogStore, FilterClause, SortDirection, SortKey,
};
use mandi_core::domain::product::{
    dedup_tags, Availability, Product, ProductId, Ratings, SupplierLocation, SupplierRef,
};
use mandi_core::errors::{DiscoveryError, DomainError};

use crate::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl From<RepositoryError> for DiscoveryError {
    fn from(error: RepositoryError) -> Self {
        DiscoveryError::StoreUnavailable(error.to_string())
    }
}

const PRODUCT_COLUMNS: &str = "id, name, category, subcategory, brand, description, \
     images_json, tags_json, price, currency, in_stock, quantity, min_order_quantity, \
     supplier_id, supplier_name, supplier_state, supplier_city, supplier_pincode, \
     rating_average, rating_count, popularity, created_at, updated_at";

pub struct SqlCatalogStore {
    pool: DbPool,
}

impl SqlCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert a new product, minting a uuid when the caller supplies no
    /// id. Identity is store-assigned.
    pub async fn create(&self, mut product: Product) -> Result<Product, RepositoryError> {
        if product.id.0.trim().is_empty() {
            product.id = ProductId(Uuid::new_v4().to_string());
        }
        let now = Utc::now();
        product.created_at = now;
        product.updated_at = now;
        self.persist(&mut product).await?;
        Ok(product)
    }

    /// Upsert an existing product, refreshing `updated_at`.
    pub async fn save(&self, mut product: Product) -> Result<(), RepositoryError> {
        product.updated_at = Utc::now();
        self.persist(&mut product).await
    }

    async fn persist(&self, product: &mut Product) -> Result<(), RepositoryError> {
        product.tags = dedup_tags(std::mem::take(&mut product.tags));
        product.validate()?;

        let images_json = serde_json::to_string(&product.images)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let tags_json = serde_json::to_string(&product.tags)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let supplier = product.supplier.as_ref();

        sqlx::query(
            "INSERT INTO product (id, name, category, subcategory, brand, description, \
             images_json, tags_json, price, currency, in_stock, quantity, min_order_quantity, \
             supplier_id, supplier_name, supplier_state, supplier_city, supplier_pincode, \
             rating_average, rating_count, popularity, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, \
             ?17, ?18, ?19, ?20, ?21, ?22, ?23) \
             ON CONFLICT(id) DO UPDATE SET \
             name = excluded.name, category = excluded.category, \
             subcategory = excluded.subcategory, brand = excluded.brand, \
             description = excluded.description, images_json = excluded.images_json, \
             tags_json = excluded.tags_json, price = excluded.price, \
             currency = excluded.currency, in_stock = excluded.in_stock, \
             quantity = excluded.quantity, min_order_quantity = excluded.min_order_quantity, \
             supplier_id = excluded.supplier_id, supplier_name = excluded.supplier_name, \
             supplier_state = excluded.supplier_state, supplier_city = excluded.supplier_city, \
             supplier_pincode = excluded.supplier_pincode, \
             rating_average = excluded.rating_average, rating_count = excluded.rating_count, \
             popularity = excluded.popularity, updated_at = excluded.updated_at",
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.subcategory)
        .bind(&product.brand)
        .bind(&product.description)
        .bind(images_json)
        .bind(tags_json)
        .bind(product.price.to_string())
        .bind(&product.currency)
        .bind(product.availability.in_stock)
        .bind(product.availability.quantity)
        .bind(product.availability.min_order_quantity)
        .bind(supplier.and_then(|s| s.id.clone()))
        .bind(supplier.and_then(|s| s.name.clone()))
        .bind(supplier.and_then(|s| s.location.state.clone()))
        .bind(supplier.and_then(|s| s.location.city.clone()))
        .bind(supplier.and_then(|s| s.location.pincode.clone()))
        .bind(product.ratings.average)
        .bind(product.ratings.count)
        .bind(product.popularity)
        .bind(product.created_at.to_rfc3339())
        .bind(product.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, query: &CatalogQuery) -> Result<Vec<Product>, RepositoryError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM product"));

        if !query.filter.is_empty() {
            builder.push(" WHERE ");
            push_clauses(&mut builder, query.filter.clauses(), " AND ");
        }

        if !query.sort.is_empty() {
            builder.push(" ORDER BY ");
            let mut first = true;
            for spec in &query.sort {
                if !first {
                    builder.push(", ");
                }
                first = false;
                builder.push(sort_column(spec.key));
                builder.push(match spec.direction {
                    SortDirection::Ascending => " ASC",
                    SortDirection::Descending => " DESC",
                });
            }
        }

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(limit as i64);
        }

        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_product).collect()
    }
}

#[async_trait]
impl CatalogStore for SqlCatalogStore {
    async fn query(&self, query: &CatalogQuery) -> Result<Vec<Product>, DiscoveryError> {
        query.validate()?;
        Ok(self.fetch(query).await?)
    }

    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, DiscoveryError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?1"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::Database)?;

        match row {
            Some(row) => Ok(Some(row_to_product(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, DiscoveryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = CatalogQuery::new(
            mandi_core::discovery::CatalogFilter::new().with_ids(ids.to_vec()),
        );
        Ok(self.fetch(&query).await?)
    }
}

fn sort_column(key: SortKey) -> &'static str {
    match key {
        SortKey::Popularity => "popularity",
        SortKey::RatingAverage => "rating_average",
        SortKey::CreatedAt => "created_at",
        SortKey::Id => "id",
    }
}

fn push_clauses(builder: &mut QueryBuilder<'_, Sqlite>, clauses: &[FilterClause], separator: &str) {
    let mut first = true;
    for clause in clauses {
        if !first {
            builder.push(separator);
        }
        first = false;
        push_clause(builder, clause);
    }
}

fn push_clause(builder: &mut QueryBuilder<'_, Sqlite>, clause: &FilterClause) {
    match clause {
        FilterClause::CategoryEq(value) => {
            builder.push("category = ");
            builder.push_bind(value.clone());
        }
        FilterClause::SupplierStateEq(value) => {
            builder.push("supplier_state = ");
            builder.push_bind(value.clone());
        }
        FilterClause::BrandEq(value) => {
            builder.push("brand = ");
            builder.push_bind(value.clone());
        }
        FilterClause::TagsAnyOf(tags) => {
            builder.push(
                "EXISTS (SELECT 1 FROM json_each(product.tags_json) WHERE json_each.value IN (",
            );
            let mut first = true;
            for tag in tags {
                if !first {
                    builder.push(", ");
                }
                first = false;
                builder.push_bind(tag.clone());
            }
            builder.push("))");
        }
        FilterClause::TextSearch(needle) => {
            let pattern = format!("%{}%", needle.to_lowercase());
            builder.push("(LOWER(name) LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR LOWER(COALESCE(description, '')) LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(
                " OR EXISTS (SELECT 1 FROM json_each(product.tags_json) \
                 WHERE LOWER(json_each.value) LIKE ",
            );
            builder.push_bind(pattern);
            builder.push("))");
        }
        FilterClause::ExcludeId(id) => {
            builder.push("id <> ");
            builder.push_bind(id.0.clone());
        }
        FilterClause::IdIn(ids) => {
            builder.push("id IN (");
            let mut first = true;
            for id in ids {
                if !first {
                    builder.push(", ");
                }
                first = false;
                builder.push_bind(id.0.clone());
            }
            builder.push(")");
        }
        FilterClause::InStockOnly => {
            builder.push("in_stock = 1");
        }
        FilterClause::AnyOf(group) => {
            builder.push("(");
            push_clauses(builder, group, " OR ");
            builder.push(")");
        }
    }
}

fn row_to_product(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let images: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("images_json")?)
        .map_err(|error| RepositoryError::Decode(format!("images_json: {error}")))?;
    let tags: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("tags_json")?)
        .map_err(|error| RepositoryError::Decode(format!("tags_json: {error}")))?;

    let price_raw: String = row.try_get("price")?;
    let price = Decimal::from_str(&price_raw)
        .map_err(|error| RepositoryError::Decode(format!("price `{price_raw}`: {error}")))?;

    let supplier_id: Option<String> = row.try_get("supplier_id")?;
    let supplier_name: Option<String> = row.try_get("supplier_name")?;
    let supplier_state: Option<String> = row.try_get("supplier_state")?;
    let supplier_city: Option<String> = row.try_get("supplier_city")?;
    let supplier_pincode: Option<String> = row.try_get("supplier_pincode")?;
    let supplier = if supplier_id.is_none()
        && supplier_name.is_none()
        && supplier_state.is_none()
        && supplier_city.is_none()
        && supplier_pincode.is_none()
    {
        None
    } else {
        Some(SupplierRef {
            id: supplier_id,
            name: supplier_name,
            location: SupplierLocation {
                state: supplier_state,
                city: supplier_city,
                pincode: supplier_pincode,
            },
        })
    };

    Ok(Product {
        id: ProductId(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        category: row.try_get("category")?,
        subcategory: row.try_get("subcategory")?,
        brand: row.try_get("brand")?,
        description: row.try_get("description")?,
        images,
        tags,
        price,
        currency: row.try_get("currency")?,
        availability: Availability {
            in_stock: row.try_get::<i64, _>("in_stock")? != 0,
            quantity: row.try_get::<u32, _>("quantity")?,
            min_order_quantity: row.try_get::<u32, _>("min_order_quantity")?,
        },
        supplier,
        ratings: Ratings {
            average: row.try_get("rating_average")?,
            count: row.try_get::<u32, _>("rating_count")?,
        },
        popularity: row.try_get("popularity")?,
        created_at: parse_timestamp(row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp(row.try_get::<String, _>("updated_at")?)?,
    })
}

fn parse_timestamp(raw: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("timestamp `{raw}`: {error}")))
}
