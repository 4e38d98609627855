use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub in_stock: bool,
    pub quantity: u32,
    pub min_order_quantity: u32,
}

impl Default for Availability {
    fn default() -> Self {
        Self { in_stock: true, quantity: 0, min_order_quantity: 1 }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierLocation {
    pub state: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
}

/// Weak reference into the supplier collection; ownership of supplier
/// records lives outside the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: SupplierLocation,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratings {
    pub average: f64,
    pub count: u32,
}

/// One catalog item. The discovery core treats products as read-only;
/// mutation happens through catalog-write paths outside this crate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub price: Decimal,
    pub currency: String,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<SupplierRef>,
    #[serde(default)]
    pub ratings: Ratings,
    #[serde(default)]
    pub popularity: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const DEFAULT_CURRENCY: &str = "INR";

impl Product {
    pub fn supplier_state(&self) -> Option<&str> {
        self.supplier.as_ref().and_then(|supplier| supplier.location.state.as_deref())
    }

    /// Enforce the catalog invariants before a product enters the store.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvariantViolation("product name must not be empty".into()));
        }
        if self.category.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "product category must not be empty".into(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(format!(
                "product price must be non-negative, got {}",
                self.price
            )));
        }
        if !self.ratings.average.is_finite()
            || self.ratings.average < 0.0
            || self.ratings.average > 5.0
        {
            return Err(DomainError::InvariantViolation(format!(
                "ratings.average must be within [0, 5], got {}",
                self.ratings.average
            )));
        }
        if !self.popularity.is_finite() || self.popularity < 0.0 {
            return Err(DomainError::InvariantViolation(format!(
                "popularity must be a non-negative score, got {}",
                self.popularity
            )));
        }
        if self.availability.min_order_quantity < 1 {
            return Err(DomainError::InvariantViolation(
                "availability.minOrderQuantity must be at least 1".into(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for tag in &self.tags {
            if !seen.insert(tag.as_str()) {
                return Err(DomainError::InvariantViolation(format!(
                    "duplicate tag `{tag}` in product tag set"
                )));
            }
        }
        Ok(())
    }
}

/// Collapse duplicate tags while keeping first-seen insertion order for
/// display.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tags.into_iter().filter(|tag| seen.insert(tag.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_fixture() -> Product {
        Product {
            id: ProductId("prod-001".to_string()),
            name: "Malabar Black Pepper".to_string(),
            category: "Spices".to_string(),
            subcategory: Some("Whole Spices".to_string()),
            brand: Some("Kerala Naturals".to_string()),
            description: Some("Single-origin whole peppercorns".to_string()),
            images: vec!["https://img.example/pepper.jpg".to_string()],
            tags: vec!["organic".to_string(), "wholesale".to_string()],
            price: Decimal::new(45_000, 2),
            currency: DEFAULT_CURRENCY.to_string(),
            availability: Availability { in_stock: true, quantity: 120, min_order_quantity: 5 },
            supplier: Some(SupplierRef {
                id: Some("sup-001".to_string()),
                name: Some("Malabar Traders".to_string()),
                location: SupplierLocation {
                    state: Some("Kerala".to_string()),
                    city: Some("Kochi".to_string()),
                    pincode: Some("682001".to_string()),
                },
            }),
            ratings: Ratings { average: 4.4, count: 87 },
            popularity: 310.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn valid_product_passes_validation() {
        assert_eq!(product_fixture().validate(), Ok(()));
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut product = product_fixture();
        product.price = Decimal::new(-1, 0);
        assert!(matches!(product.validate(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn rating_above_five_is_rejected() {
        let mut product = product_fixture();
        product.ratings.average = 5.2;
        assert!(matches!(product.validate(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn zero_min_order_quantity_is_rejected() {
        let mut product = product_fixture();
        product.availability.min_order_quantity = 0;
        assert!(matches!(product.validate(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn duplicate_tags_are_rejected() {
        let mut product = product_fixture();
        product.tags = vec!["organic".to_string(), "organic".to_string()];
        assert!(matches!(product.validate(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn dedup_tags_preserves_first_seen_order() {
        let tags = vec![
            "organic".to_string(),
            "wholesale".to_string(),
            "organic".to_string(),
            "bulk".to_string(),
        ];
        assert_eq!(dedup_tags(tags), vec!["organic", "wholesale", "bulk"]);
    }

    #[test]
    fn wire_json_uses_camel_case_field_names() {
        let json = serde_json::to_value(product_fixture()).expect("serialize product");
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["availability"]["minOrderQuantity"], 5);
        assert_eq!(json["availability"]["inStock"], true);
    }
}
