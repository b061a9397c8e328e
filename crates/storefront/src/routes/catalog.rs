//! Public catalog routes: categories, products and reviews.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use bloom_core::ProductId;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::db::{CategoryRepository, ProductRepository, RepositoryError, ReviewRepository};
use crate::error::{AppError, Result};
use crate::middleware::OptionalUser;
use crate::models::{Category, Product, ProductFilter, Review, ReviewInput};
use crate::state::AppState;

/// GET /api/categories
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// GET /api/products[?categoryId=&inStock=]
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProductFilter>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// GET /api/products/{id}
#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

/// GET /api/products/{id}/reviews
#[instrument(skip(state))]
pub async fn list_reviews(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<Vec<Review>>> {
    if ProductRepository::new(state.pool()).get(id).await?.is_none() {
        return Err(AppError::NotFound("Product not found".to_string()));
    }
    let reviews = ReviewRepository::new(state.pool())
        .list_for_product(id)
        .await?;
    Ok(Json(reviews))
}

/// POST /api/products/{id}/reviews
///
/// Open to guests; a logged-in user's name fills a blank `authorName`.
#[instrument(skip(state, user, input))]
pub async fn create_review(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(mut input): ApiJson<ReviewInput>,
) -> Result<(StatusCode, Json<Review>)> {
    if let Some(user) = user
        && input.author_name.trim().is_empty()
    {
        input.author_name = user.name;
    }
    let input = input.normalized().map_err(AppError::BadRequest)?;
    let review = ReviewRepository::new(state.pool())
        .create(id, &input)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
            other => other.into(),
        })?;

    tracing::info!(review_id = %review.id, rating = review.rating, "Review posted");
    Ok((StatusCode::CREATED, Json(review)))
}
