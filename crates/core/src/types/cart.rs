//! Cart state: entries, totals, and the pure mutation rules.
//!
//! `CartContents` is the session-persisted shape of a visitor's cart. It is
//! a plain map with no I/O; the storefront's cart manager owns reading and
//! writing it through the session layer.
//!
//! # Persisted representation
//!
//! The cart serializes as a JSON object keyed by the *string* form of the
//! product id, with each entry's unit price string-encoded:
//!
//! ```json
//! { "3": { "quantity": 2, "unit_price": "19.99" } }
//! ```
//!
//! String-encoding the price preserves decimal precision across any session
//! backend; it is never stored as a float.

use std::collections::HashMap;
use std::collections::hash_map;

use rust_decimal::Decimal;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Product, ProductId};

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// Adding with quantity zero is rejected rather than creating an entry
    /// that violates the `quantity >= 1` invariant. Quantities are unsigned,
    /// so negative amounts are unrepresentable.
    #[error("quantity must be at least 1")]
    ZeroQuantity,

    /// Accumulating would push an entry's quantity past `u32::MAX`.
    /// Rejected rather than wrapping back below the `quantity >= 1`
    /// invariant.
    #[error("quantity exceeds the representable maximum")]
    QuantityOverflow,
}

/// One product's quantity and captured unit price within a cart.
///
/// `unit_price` is captured when the product is first added and is not
/// refreshed by later adds or by live catalog price changes. Removing and
/// re-adding the product recaptures the current price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    /// Always >= 1 for an entry that exists in the cart.
    pub quantity: u32,
    /// Price captured at first add, string-encoded when persisted.
    #[serde(with = "rust_decimal::serde::str")]
    pub unit_price: Decimal,
}

impl CartEntry {
    /// `unit_price * quantity`, exact decimal arithmetic.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// A cart entry enriched with its resolved catalog product.
///
/// Produced by cart iteration; `product` is the *live* record while
/// `unit_price` remains the captured price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

/// The session-persisted cart state: an unordered map from product id to
/// [`CartEntry`]. Entry order is not meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartContents {
    entries: HashMap<ProductId, CartEntry>,
}

impl CartContents {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a product, capturing `unit_price` if the product
    /// is not yet in the cart.
    ///
    /// With `override_quantity` the given quantity replaces the stored one;
    /// otherwise it accumulates. Duplicate adds are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ZeroQuantity`] if `quantity` is zero and
    /// [`CartError::QuantityOverflow`] if accumulating would exceed
    /// `u32::MAX`. The cart is unchanged on error.
    pub fn add(
        &mut self,
        product_id: ProductId,
        unit_price: Decimal,
        quantity: u32,
        override_quantity: bool,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }

        let entry = self.entries.entry(product_id).or_insert(CartEntry {
            quantity: 0,
            unit_price,
        });
        if override_quantity {
            entry.quantity = quantity;
        } else {
            // A fresh entry starts at 0, so overflow here implies the entry
            // already existed; erroring leaves it as it was.
            entry.quantity = entry
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::QuantityOverflow)?;
        }
        Ok(())
    }

    /// Remove a product's entry, returning it if one existed.
    ///
    /// Removing a product that is not in the cart is a no-op.
    pub fn remove(&mut self, product_id: ProductId) -> Option<CartEntry> {
        self.entries.remove(&product_id)
    }

    /// Total item count: the sum of quantities, not the number of distinct
    /// products. Saturates at `u32::MAX` rather than wrapping.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.entries
            .values()
            .fold(0u32, |count, entry| count.saturating_add(entry.quantity))
    }

    /// Cart total from the *captured* unit prices. Exact decimal
    /// arithmetic; never consults the live catalog.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.entries.values().map(CartEntry::line_total).sum()
    }

    /// The entry for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartEntry> {
        self.entries.get(&product_id)
    }

    /// Every product id currently in the cart.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.entries.keys().copied().collect()
    }

    /// Iterate over `(product_id, entry)` pairs in no particular order.
    pub fn entries(&self) -> hash_map::Iter<'_, ProductId, CartEntry> {
        self.entries.iter()
    }

    /// Number of distinct products in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Manual serde: JSON object keys must be strings, and the persisted form
// keys entries by the string form of the product id.

impl Serialize for CartContents {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (product_id, entry) in &self.entries {
            map.serialize_entry(&product_id.to_string(), entry)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CartContents {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ContentsVisitor;

        impl<'de> Visitor<'de> for ContentsVisitor {
            type Value = CartContents;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map from string product id to cart entry")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = HashMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, entry)) = access.next_entry::<String, CartEntry>()? {
                    let id = key.parse::<i32>().map_err(|_| {
                        de::Error::custom(format!("invalid product id key: {key:?}"))
                    })?;
                    entries.insert(ProductId::new(id), entry);
                }
                Ok(CartContents { entries })
            }
        }

        deserializer.deserialize_map(ContentsVisitor)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn repeated_adds_accumulate_quantity() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), 2, false).unwrap();
        cart.add(ProductId::new(1), price(10_00), 3, false).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 5);
    }

    #[test]
    fn override_replaces_quantity() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), 2, true).unwrap();
        cart.add(ProductId::new(1), price(10_00), 7, true).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, 7);
    }

    #[test]
    fn zero_quantity_is_rejected_without_mutation() {
        let mut cart = CartContents::new();
        assert_eq!(
            cart.add(ProductId::new(1), price(10_00), 0, false),
            Err(CartError::ZeroQuantity)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn overflowing_accumulate_is_rejected_without_mutation() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), u32::MAX, false)
            .unwrap();
        assert_eq!(
            cart.add(ProductId::new(1), price(10_00), 1, false),
            Err(CartError::QuantityOverflow)
        );
        assert_eq!(cart.get(ProductId::new(1)).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn item_count_saturates_across_entries() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), u32::MAX, false)
            .unwrap();
        cart.add(ProductId::new(2), price(5_50), 2, false).unwrap();
        assert_eq!(cart.item_count(), u32::MAX);
    }

    #[test]
    fn unit_price_is_captured_at_first_add() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(19_99), 1, false).unwrap();
        // A later add with a different live price must not refresh the
        // captured price.
        cart.add(ProductId::new(1), price(24_99), 1, false).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().unit_price, price(19_99));
    }

    #[test]
    fn remove_and_readd_recaptures_price() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(19_99), 1, false).unwrap();
        cart.remove(ProductId::new(1));
        cart.add(ProductId::new(1), price(24_99), 1, false).unwrap();
        assert_eq!(cart.get(ProductId::new(1)).unwrap().unit_price, price(24_99));
    }

    #[test]
    fn remove_of_absent_product_is_a_noop() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), 1, false).unwrap();
        assert!(cart.remove(ProductId::new(2)).is_none());
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn count_sums_quantities_not_distinct_products() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), 2, false).unwrap();
        cart.add(ProductId::new(2), price(5_50), 2, false).unwrap();
        assert_eq!(cart.item_count(), 4);
        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn total_price_is_exact_decimal() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(19_99), 3, false).unwrap();
        // 19.99 * 3 == 59.97 exactly, no float drift.
        assert_eq!(cart.total_price(), price(59_97));
    }

    #[test]
    fn line_total_multiplies_captured_price() {
        let entry = CartEntry {
            quantity: 4,
            unit_price: price(2_25),
        };
        assert_eq!(entry.line_total(), price(9_00));
    }

    #[test]
    fn serializes_with_string_keys_and_string_prices() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(3), price(19_99), 2, false).unwrap();

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "3": { "quantity": 2, "unit_price": "19.99" } })
        );
    }

    #[test]
    fn round_trips_through_json() {
        let mut cart = CartContents::new();
        cart.add(ProductId::new(1), price(10_00), 2, false).unwrap();
        cart.add(ProductId::new(2), price(5_50), 1, false).unwrap();

        let json = serde_json::to_string(&cart).unwrap();
        let back: CartContents = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn rejects_non_numeric_id_keys() {
        let result = serde_json::from_str::<CartContents>(
            r#"{ "not-a-number": { "quantity": 1, "unit_price": "1.00" } }"#,
        );
        assert!(result.is_err());
    }
}
