//! Cart route handlers.
//!
//! Every mutation returns the freshly priced cart so clients always see
//! discounts, messages, and totals consistent with the change.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use readnook_core::{BookId, UserId};

use crate::db::{BookRepository, CartRepository, DiscountRepository, OrderRepository};
use crate::error::Result;
use crate::services::{CartManager, PricedCart};
use crate::state::AppState;

/// Request body for adding a book to the cart.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub book_id: BookId,
}

/// Request body for changing a line's quantity.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Priced cart for the user, created lazily on first access.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<PricedCart>> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let cart = CartManager::new(&books, &carts, &discounts, &orders);

    Ok(Json(cart.get(user_id).await?))
}

/// Add a book to the cart with quantity 1.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<PricedCart>> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let cart = CartManager::new(&books, &carts, &discounts, &orders);

    Ok(Json(cart.add_item(user_id, req.book_id).await?))
}

/// Set the quantity of a line already in the cart.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path((user_id, book_id)): Path<(UserId, BookId)>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<PricedCart>> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let cart = CartManager::new(&books, &carts, &discounts, &orders);

    Ok(Json(cart.update_item(user_id, book_id, req.quantity).await?))
}

/// Remove a line from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path((user_id, book_id)): Path<(UserId, BookId)>,
) -> Result<Json<PricedCart>> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let cart = CartManager::new(&books, &carts, &discounts, &orders);

    Ok(Json(cart.remove_item(user_id, book_id).await?))
}

/// Remove every line, keeping the cart itself.
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let cart = CartManager::new(&books, &carts, &discounts, &orders);

    cart.clear(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
