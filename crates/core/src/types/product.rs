//! Catalog records: categories and products.
//!
//! These are plain read-model records. The storefront resolves them from
//! `PostgreSQL`; the cart only ever needs `id` and `price`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CategoryId, ProductId};

/// A product category. Every product belongs to exactly one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL-safe unique identifier.
    pub slug: String,
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub name: String,
    /// URL-safe unique identifier.
    pub slug: String,
    pub description: String,
    /// Path of the product image, when one has been uploaded. Media storage
    /// itself is outside this crate; only the reference is carried.
    pub image: Option<String>,
    /// Current list price. Exact decimal; serialized as a string.
    pub price: Decimal,
    /// Unavailable products are hidden from listings and cannot be added
    /// to a cart.
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
