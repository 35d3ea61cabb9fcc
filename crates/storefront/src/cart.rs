//! Session-backed cart manager.
//!
//! One cart per visitor session, materialized from a single session slot at
//! the start of a request and written back after every mutation. There is
//! no in-memory-only mode: the session store is the only home of cart
//! state, and the cart's lifetime is bounded by the session's.
//!
//! # Consistency
//!
//! Each operation is a plain read-modify-write of the slot with no locking.
//! Two racing requests from the same session (two tabs adding at once) are
//! last-writer-wins; this is an accepted property of session-backed state.

use std::collections::HashMap;

use rust_decimal::Decimal;
use tower_sessions::Session;

use greengrocer_core::{CartContents, CartItem, Product, ProductId};

use crate::db::ProductLookup;
use crate::error::Result;

/// Session slot holding the serialized cart.
pub const CART_SESSION_KEY: &str = "cart";

/// A visitor's cart, bound to their session.
#[derive(Debug)]
pub struct Cart {
    session: Session,
    contents: CartContents,
}

impl Cart {
    /// Materialize the cart from the session.
    ///
    /// If the session has no cart slot, an empty one is created and written
    /// back immediately, so the slot always exists after loading. A missing
    /// slot is the documented empty-cart state, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read or written.
    pub async fn load(session: Session) -> Result<Self> {
        let contents = match session.get::<CartContents>(CART_SESSION_KEY).await? {
            Some(contents) => contents,
            None => {
                let contents = CartContents::new();
                session.insert(CART_SESSION_KEY, &contents).await?;
                contents
            }
        };

        Ok(Self { session, contents })
    }

    /// Add `quantity` of `product` to the cart and persist.
    ///
    /// The product's current price is captured as the entry's unit price on
    /// first add and kept until the entry is removed. `override_quantity`
    /// replaces the stored quantity instead of accumulating. Duplicate adds
    /// are not an error.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Cart` for a zero quantity or an accumulate past
    /// `u32::MAX` (nothing is mutated or persisted on either) and
    /// `AppError::Session` if the write-back fails.
    pub async fn add(
        &mut self,
        product: &Product,
        quantity: u32,
        override_quantity: bool,
    ) -> Result<()> {
        self.contents
            .add(product.id, product.price, quantity, override_quantity)?;
        self.save().await
    }

    /// Remove a product's entry and persist.
    ///
    /// Removing a product that is not in the cart is a true no-op: nothing
    /// is written back on that path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the write-back fails.
    pub async fn remove(&mut self, product_id: ProductId) -> Result<()> {
        if self.contents.remove(product_id).is_some() {
            self.save().await?;
        }
        Ok(())
    }

    /// Resolve the cart into display items.
    ///
    /// Issues ONE batched `find_by_ids` call covering every product id in
    /// the cart, then pairs each entry with its live product. Entries whose
    /// product no longer resolves (deleted from the catalog) are skipped
    /// with a warning; they still contribute to [`count`](Self::count) and
    /// [`total_price`](Self::total_price), which never touch the catalog.
    ///
    /// Item order is not meaningful.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Repository` if the batched lookup fails.
    pub async fn items(&self, catalog: &impl ProductLookup) -> Result<Vec<CartItem>> {
        let ids = self.contents.product_ids();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let products: HashMap<ProductId, Product> = catalog
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect();

        let mut items = Vec::with_capacity(self.contents.len());
        for (product_id, entry) in self.contents.entries() {
            let Some(product) = products.get(product_id) else {
                tracing::warn!(product_id = %product_id, "cart entry references missing product");
                continue;
            };
            items.push(CartItem {
                product: product.clone(),
                quantity: entry.quantity,
                unit_price: entry.unit_price,
                line_total: entry.line_total(),
            });
        }

        Ok(items)
    }

    /// Total item count: the sum of quantities across entries.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.contents.item_count()
    }

    /// Cart total from captured unit prices; exact decimal arithmetic, no
    /// catalog round-trip.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.contents.total_price()
    }

    /// Delete the entire cart slot from the session.
    ///
    /// Consumes the cart; a fresh [`Cart::load`] is required before further
    /// operations, mirroring first-visit behavior.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Session` if the delete fails.
    pub async fn clear(self) -> Result<()> {
        self.session
            .remove::<CartContents>(CART_SESSION_KEY)
            .await?;
        Ok(())
    }

    /// Write the current contents back to the session slot.
    async fn save(&mut self) -> Result<()> {
        self.session.insert(CART_SESSION_KEY, &self.contents).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use tower_sessions::{MemoryStore, Session};

    use greengrocer_core::{CartError, CategoryId, ProductId};

    use super::*;
    use crate::db::RepositoryError;
    use crate::error::AppError;

    /// In-memory catalog standing in for the Postgres repository.
    struct FakeCatalog {
        products: HashMap<ProductId, Product>,
        lookups: AtomicUsize,
    }

    impl FakeCatalog {
        fn new(products: impl IntoIterator<Item = Product>) -> Self {
            Self {
                products: products.into_iter().map(|p| (p.id, p)).collect(),
                lookups: AtomicUsize::new(0),
            }
        }

        fn lookup_count(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    impl ProductLookup for FakeCatalog {
        async fn find_by_ids(
            &self,
            ids: &[ProductId],
        ) -> std::result::Result<Vec<Product>, RepositoryError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(ids
                .iter()
                .filter_map(|id| self.products.get(id).cloned())
                .collect())
        }
    }

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn product(id: i32, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new(id),
            category_id: CategoryId::new(1),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: String::new(),
            image: None,
            price: Decimal::new(price_cents, 2),
            available: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn load_writes_the_slot_back_immediately() {
        let session = session();
        let cart = Cart::load(session.clone()).await.unwrap();
        assert_eq!(cart.count(), 0);

        // The slot exists even though the cart is still empty.
        let slot = session.get::<CartContents>(CART_SESSION_KEY).await.unwrap();
        assert_eq!(slot, Some(CartContents::new()));
    }

    #[tokio::test]
    async fn add_then_reload_round_trips_entries() {
        let session = session();
        let a = product(1, 10_00);
        let b = product(2, 5_50);

        let mut cart = Cart::load(session.clone()).await.unwrap();
        cart.add(&a, 2, false).await.unwrap();
        cart.add(&b, 1, false).await.unwrap();

        // A new Cart instance over the same session sees identical state.
        let reloaded = Cart::load(session).await.unwrap();
        assert_eq!(reloaded.count(), 3);
        assert_eq!(reloaded.total_price(), Decimal::new(25_50, 2));
        assert_eq!(
            reloaded.contents.get(a.id).unwrap().unit_price,
            Decimal::new(10_00, 2)
        );
    }

    #[tokio::test]
    async fn scenario_walkthrough() {
        let a = product(1, 10_00);
        let b = product(2, 5_50);
        let mut cart = Cart::load(session()).await.unwrap();

        cart.add(&a, 2, false).await.unwrap();
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total_price(), Decimal::new(20_00, 2));

        cart.add(&b, 1, false).await.unwrap();
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total_price(), Decimal::new(25_50, 2));

        cart.add(&a, 5, true).await.unwrap();
        assert_eq!(cart.count(), 6);
        assert_eq!(cart.total_price(), Decimal::new(55_50, 2));

        cart.remove(b.id).await.unwrap();
        assert_eq!(cart.count(), 5);
        assert_eq!(cart.total_price(), Decimal::new(50_00, 2));
    }

    #[tokio::test]
    async fn zero_quantity_add_is_rejected_and_not_persisted() {
        let session = session();
        let mut cart = Cart::load(session.clone()).await.unwrap();

        let err = cart.add(&product(1, 10_00), 0, false).await.unwrap_err();
        assert!(matches!(err, AppError::Cart(CartError::ZeroQuantity)));

        let reloaded = Cart::load(session).await.unwrap();
        assert_eq!(reloaded.count(), 0);
    }

    #[tokio::test]
    async fn overflowing_accumulate_is_rejected_and_not_persisted() {
        let session = session();
        let a = product(1, 10_00);
        let mut cart = Cart::load(session.clone()).await.unwrap();
        cart.add(&a, u32::MAX, false).await.unwrap();

        let err = cart.add(&a, 1, false).await.unwrap_err();
        assert!(matches!(err, AppError::Cart(CartError::QuantityOverflow)));

        let reloaded = Cart::load(session).await.unwrap();
        assert_eq!(reloaded.count(), u32::MAX);
    }

    #[tokio::test]
    async fn remove_of_absent_product_changes_nothing() {
        let mut cart = Cart::load(session()).await.unwrap();
        cart.add(&product(1, 10_00), 1, false).await.unwrap();

        cart.remove(ProductId::new(99)).await.unwrap();
        assert_eq!(cart.count(), 1);
    }

    #[tokio::test]
    async fn unit_price_survives_live_price_change() {
        let mut cart = Cart::load(session()).await.unwrap();
        cart.add(&product(1, 19_99), 1, false).await.unwrap();

        // Catalog price moved; a later accumulate keeps the captured price.
        let repriced = product(1, 24_99);
        cart.add(&repriced, 2, false).await.unwrap();
        assert_eq!(cart.total_price(), Decimal::new(59_97, 2));
    }

    #[tokio::test]
    async fn items_batches_a_single_lookup_and_computes_line_totals() {
        let a = product(1, 19_99);
        let b = product(2, 5_50);
        let catalog = FakeCatalog::new([a.clone(), b.clone()]);

        let mut cart = Cart::load(session()).await.unwrap();
        cart.add(&a, 3, false).await.unwrap();
        cart.add(&b, 1, false).await.unwrap();

        let items = cart.items(&catalog).await.unwrap();
        assert_eq!(catalog.lookup_count(), 1);
        assert_eq!(items.len(), 2);

        let line_a = items.iter().find(|item| item.product.id == a.id).unwrap();
        assert_eq!(line_a.quantity, 3);
        assert_eq!(line_a.unit_price, Decimal::new(19_99, 2));
        assert_eq!(line_a.line_total, Decimal::new(59_97, 2));
    }

    #[tokio::test]
    async fn items_on_empty_cart_skips_the_lookup() {
        let catalog = FakeCatalog::new([]);
        let cart = Cart::load(session()).await.unwrap();

        let items = cart.items(&catalog).await.unwrap();
        assert!(items.is_empty());
        assert_eq!(catalog.lookup_count(), 0);
    }

    #[tokio::test]
    async fn items_skips_entries_whose_product_was_deleted() {
        let a = product(1, 10_00);
        let ghost = product(2, 5_50);
        // Only product A remains in the catalog.
        let catalog = FakeCatalog::new([a.clone()]);

        let mut cart = Cart::load(session()).await.unwrap();
        cart.add(&a, 1, false).await.unwrap();
        cart.add(&ghost, 2, false).await.unwrap();

        let items = cart.items(&catalog).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.first().unwrap().product.id, a.id);

        // Totals are a function of stored entries, stale or not.
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total_price(), Decimal::new(21_00, 2));
    }

    #[tokio::test]
    async fn clear_then_load_yields_an_empty_cart() {
        let session = session();
        let mut cart = Cart::load(session.clone()).await.unwrap();
        cart.add(&product(1, 10_00), 4, false).await.unwrap();

        cart.clear().await.unwrap();

        let reloaded = Cart::load(session).await.unwrap();
        assert_eq!(reloaded.count(), 0);
        assert_eq!(reloaded.total_price(), Decimal::ZERO);
    }
}
