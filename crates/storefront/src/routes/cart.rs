//! Cart route handlers.
//!
//! Every mutation loads the cart from the session, applies the change, and
//! persists before responding. Mutating handlers answer with a summary so
//! clients can refresh their cart badge without a second request.

use axum::{Json, extract::State, http::StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use greengrocer_core::{CartItem, ProductId};

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    /// Defaults to 1.
    pub quantity: Option<u32>,
    /// Replace the stored quantity instead of accumulating. Defaults to
    /// false.
    #[serde(default)]
    pub override_quantity: bool,
}

/// Remove from cart request body.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartRequest {
    pub product_id: ProductId,
}

/// Totals-only view of the cart, returned by mutations.
#[derive(Debug, Serialize)]
pub struct CartSummary {
    pub item_count: u32,
    pub total_price: Decimal,
}

impl CartSummary {
    fn of(cart: &Cart) -> Self {
        Self {
            item_count: cart.count(),
            total_price: cart.total_price(),
        }
    }
}

/// Full cart view with enriched line items.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub item_count: u32,
    pub total_price: Decimal,
}

/// Item-count badge data.
#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u32,
}

/// Display the full cart.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartResponse>> {
    let cart = Cart::load(session).await?;
    let items = cart.items(&state.products()).await?;

    Ok(Json(CartResponse {
        item_count: cart.count(),
        total_price: cart.total_price(),
        items,
    }))
}

/// Add a product to the cart.
///
/// Accumulates onto any existing entry unless `override_quantity` is set.
/// Adding a product that does not exist (or is unavailable) is a caller
/// error and answers 404.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartSummary>> {
    let product = state
        .products()
        .get_by_id(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let mut cart = Cart::load(session).await?;
    cart.add(
        &product,
        request.quantity.unwrap_or(1),
        request.override_quantity,
    )
    .await?;

    Ok(Json(CartSummary::of(&cart)))
}

/// Remove a product from the cart. Silent no-op when the product is not in
/// the cart.
#[instrument(skip(_state, session))]
pub async fn remove(
    State(_state): State<AppState>,
    session: Session,
    Json(request): Json<RemoveFromCartRequest>,
) -> Result<Json<CartSummary>> {
    let mut cart = Cart::load(session).await?;
    cart.remove(request.product_id).await?;

    Ok(Json(CartSummary::of(&cart)))
}

/// Drop the cart slot entirely.
#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<StatusCode> {
    let cart = Cart::load(session).await?;
    cart.clear().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Item-count badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = Cart::load(session).await?;

    Ok(Json(CartCount { count: cart.count() }))
}
