//! Product route handlers.
//!
//! Thin read-only catalog surface: listings grouped by category and a
//! detail view with a small related-products strip.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use greengrocer_core::{Category, Product};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// How many related products a detail view shows.
const RELATED_PRODUCT_LIMIT: i64 = 4;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Restrict the listing to one category by slug.
    pub category: Option<String>,
}

/// Product listing response.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub categories: Vec<Category>,
    /// The selected category, when the listing is filtered.
    pub category: Option<Category>,
    pub products: Vec<Product>,
}

/// Product detail response.
#[derive(Debug, Serialize)]
pub struct ProductDetailResponse {
    pub product: Product,
    pub related_products: Vec<Product>,
}

/// List available products, optionally filtered by category slug.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ProductListResponse>> {
    let repo = state.products();
    let categories = repo.list_categories().await?;

    let category = match query.category {
        Some(slug) => Some(
            repo.get_category_by_slug(&slug)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?,
        ),
        None => None,
    };

    let products = repo
        .list_available(category.as_ref().map(|c| c.id))
        .await?;

    Ok(Json(ProductListResponse {
        categories,
        category,
        products,
    }))
}

/// Product detail by slug, with up to four related products from the same
/// category.
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetailResponse>> {
    let repo = state.products();
    let product = repo
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {slug}")))?;

    let related_products = repo.related_to(&product, RELATED_PRODUCT_LIMIT).await?;

    Ok(Json(ProductDetailResponse {
        product,
        related_products,
    }))
}
