//! Database operations for the storefront `PostgreSQL` catalog.
//!
//! ## Tables
//!
//! - `category` - Catalog categories
//! - `product` - Catalog products (price is `NUMERIC(10, 2)`)
//! - `tower_sessions.session` - Session storage (created by the session
//!   store's own migration)
//!
//! # Migrations
//!
//! Catalog migrations live in `crates/storefront/migrations/` and are
//! applied at startup via `sqlx::migrate!`.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use greengrocer_core::{Product, ProductId};

mod products;

pub use products::ProductRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The underlying query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row held a value the domain types cannot represent.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Batched product lookup capability.
///
/// The cart manager depends on this trait rather than on a concrete
/// repository so tests can substitute an in-memory catalog.
pub trait ProductLookup {
    /// Resolve every product in `ids` with a single round-trip.
    ///
    /// Ids that do not resolve are simply absent from the result; callers
    /// decide how to treat them.
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
