//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (verifies database)
//!
//! # Products
//! GET  /products               - Product listing (?category=slug to filter)
//! GET  /products/{slug}        - Product detail with related products
//!
//! # Cart
//! GET  /cart                   - Full cart view (items + totals)
//! POST /cart/add               - Add a product (accumulate or override)
//! POST /cart/remove            - Remove a product (no-op when absent)
//! POST /cart/clear             - Drop the cart slot entirely
//! GET  /cart/count             - Item-count badge data
//! ```

pub mod cart;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/{slug}", get(products::detail))
}

/// Create the main application router with all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
}
