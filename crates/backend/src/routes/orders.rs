//! Order route handlers.
//!
//! Claim codes arrive as path segments; parsing normalizes case and
//! whitespace, so `read-q7k9-m2xp` and `READ-Q7K9-M2XP` hit the same
//! order.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use readnook_core::{ClaimCode, UserId};

use crate::db::{
    BookRepository, CartRepository, DiscountRepository, OrderRepository, UserRepository,
};
use crate::error::{AppError, Result};
use crate::models::Order;
use crate::services::OrderService;
use crate::state::AppState;

fn parse_claim_code(raw: &str) -> Result<ClaimCode> {
    raw.parse::<ClaimCode>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Convert the user's cart into a Pending order.
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<(StatusCode, Json<Order>)> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let service = OrderService::new(
        &books,
        &carts,
        &discounts,
        &orders,
        &users,
        state.notifier(),
    );

    let order = service.create_from_cart(user_id).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Order history for a user, newest first.
#[instrument(skip(state))]
pub async fn history(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<Order>>> {
    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let service = OrderService::new(
        &books,
        &carts,
        &discounts,
        &orders,
        &users,
        state.notifier(),
    );

    Ok(Json(service.orders_for_user(user_id).await?))
}

/// Look up an order by claim code.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(claim_code): Path<String>,
) -> Result<Json<Order>> {
    let code = parse_claim_code(&claim_code)?;

    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let service = OrderService::new(
        &books,
        &carts,
        &discounts,
        &orders,
        &users,
        state.notifier(),
    );

    Ok(Json(service.get_by_claim_code(&code).await?))
}

/// Verify pickup by claim code: decrement stock, clear the cart, and
/// move the order to Verified.
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Path(claim_code): Path<String>,
) -> Result<Json<Order>> {
    let code = parse_claim_code(&claim_code)?;

    let books = BookRepository::new(state.pool());
    let carts = CartRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let users = UserRepository::new(state.pool());
    let service = OrderService::new(
        &books,
        &carts,
        &discounts,
        &orders,
        &users,
        state.notifier(),
    );

    Ok(Json(service.verify_by_claim_code(&code).await?))
}
