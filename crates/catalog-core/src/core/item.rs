// crates/catalog-core/src/core/item.rs
// ============================================================================
// Module: Item Records
// Description: Inventory item schema and its sparse patch.
// Purpose: Describe priced, counted items grouped by category.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! An [`Item`] is a priced inventory entry. Prices are finite and never
//! negative; `0.0` and `-0.0` name the same price for both matching and
//! duplicate detection.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::CatalogError;
use crate::core::record::Record;
use crate::core::record::RecordId;
use crate::core::record::RecordPatch;
use crate::core::record::field_matches;
use crate::core::record::present;
use crate::core::record::required;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Item category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Reusable tools.
    Tools,
    /// Items used up on use.
    Consumables,
}

impl Category {
    /// Returns the serialized tag for the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tools => "tools",
            Self::Consumables => "consumables",
        }
    }
}

/// Inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item identifier.
    pub id: RecordId,
    /// Item name.
    pub name: String,
    /// Unit price (non-negative).
    pub price: f64,
    /// Units in stock.
    pub count: u64,
    /// Item category.
    pub category: Category,
}

/// Sparse item filter or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    /// Identifier constraint or new identifier.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Item name.
    #[serde(default)]
    pub name: Option<String>,
    /// Unit price.
    #[serde(default)]
    pub price: Option<f64>,
    /// Units in stock.
    #[serde(default)]
    pub count: Option<u64>,
    /// Item category.
    #[serde(default)]
    pub category: Option<Category>,
}

// ============================================================================
// SECTION: Record Implementation
// ============================================================================

impl Record for Item {
    type Patch = ItemPatch;

    const RESOURCE: &'static str = "items";
    const FIELDS: &'static [&'static str] = &["name", "price", "count", "category"];

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    #[allow(clippy::float_cmp, reason = "Duplicate checks compare prices like filters do.")]
    fn same_attributes(&self, other: &Self) -> bool {
        self.name == other.name
            && self.price == other.price
            && self.count == other.count
            && self.category == other.category
    }

    fn validate(&self) -> Result<(), CatalogError> {
        validate_price(self.price)
    }
}

impl RecordPatch<Item> for ItemPatch {
    fn id(&self) -> Option<RecordId> {
        self.id
    }

    fn present_fields(&self) -> Vec<&'static str> {
        present([
            ("name", self.name.is_some()),
            ("price", self.price.is_some()),
            ("count", self.count.is_some()),
            ("category", self.category.is_some()),
        ])
    }

    fn matches(&self, record: &Item) -> bool {
        field_matches(self.id.as_ref(), &record.id)
            && field_matches(self.name.as_ref(), &record.name)
            && field_matches(self.price.as_ref(), &record.price)
            && field_matches(self.count.as_ref(), &record.count)
            && field_matches(self.category.as_ref(), &record.category)
    }

    fn apply(&self, record: &mut Item) {
        if let Some(name) = &self.name {
            record.name.clone_from(name);
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(count) = self.count {
            record.count = count;
        }
        if let Some(category) = self.category {
            record.category = category;
        }
    }

    fn build(&self, id: RecordId) -> Result<Item, CatalogError> {
        let mut missing = Vec::new();
        let name = required(self.name.as_ref(), "name", &mut missing);
        let price = required(self.price.as_ref(), "price", &mut missing);
        let count = required(self.count.as_ref(), "count", &mut missing);
        let category = required(self.category.as_ref(), "category", &mut missing);
        match (name, price, count, category) {
            (Some(name), Some(price), Some(count), Some(category)) => Ok(Item {
                id,
                name,
                price,
                count,
                category,
            }),
            _ => Err(CatalogError::IncompleteForCreate {
                missing,
            }),
        }
    }

    fn validate(&self) -> Result<(), CatalogError> {
        self.price.map_or(Ok(()), validate_price)
    }
}

impl From<&Item> for ItemPatch {
    fn from(item: &Item) -> Self {
        Self {
            id: Some(item.id),
            name: Some(item.name.clone()),
            price: Some(item.price),
            count: Some(item.count),
            category: Some(item.category),
        }
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Rejects negative or non-finite prices.
fn validate_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Validation(format!(
            "price must be a finite number >= 0 (got {price})"
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        reason = "Test-only assertions."
    )]

    use super::*;

    fn hammer() -> Item {
        Item {
            id: RecordId::new(0),
            name: "Hammer".to_string(),
            price: 9.99,
            count: 20,
            category: Category::Tools,
        }
    }

    #[test]
    fn count_patch_updates_count_not_name() {
        let mut item = hammer();
        let patch = ItemPatch {
            count: Some(7),
            ..ItemPatch::default()
        };
        patch.apply(&mut item);
        assert_eq!(item.count, 7);
        assert_eq!(item.name, "Hammer");
    }

    #[test]
    fn build_reports_every_missing_field() {
        let patch = ItemPatch {
            name: Some("Saw".to_string()),
            count: Some(1),
            ..ItemPatch::default()
        };
        let err = patch.build(RecordId::new(4)).unwrap_err();
        assert_eq!(
            err,
            CatalogError::IncompleteForCreate {
                missing: vec!["price", "category"],
            }
        );
    }

    #[test]
    fn negative_price_is_rejected() {
        let patch = ItemPatch {
            price: Some(-0.5),
            ..ItemPatch::default()
        };
        assert!(matches!(patch.validate(), Err(CatalogError::Validation(_))));
    }

    #[test]
    fn negative_zero_price_is_the_same_attribute_and_match() {
        let mut free = hammer();
        free.price = 0.0;
        let mut signed = hammer();
        signed.price = -0.0;
        assert!(free.same_attributes(&signed));
        let filter = ItemPatch {
            price: Some(-0.0),
            ..ItemPatch::default()
        };
        assert!(filter.validate().is_ok());
        assert!(filter.matches(&free));
    }

    #[test]
    fn category_tags_use_snake_case() {
        let json = serde_json::to_value(hammer()).unwrap();
        assert_eq!(json["category"], "tools");
        assert_eq!(Category::Consumables.as_str(), "consumables");
    }
}
