//! Discount administration route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use readnook_core::BookId;

use crate::db::{BookRepository, DiscountRepository};
use crate::error::Result;
use crate::models::Discount;
use crate::services::{DiscountAdmin, NewDiscount};
use crate::state::AppState;

/// Request body for setting a book discount.
#[derive(Debug, Deserialize)]
pub struct SetDiscountRequest {
    pub name: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[serde(default = "default_on_sale")]
    pub on_sale: bool,
}

const fn default_on_sale() -> bool {
    true
}

/// Response body for discount removal.
#[derive(Debug, Serialize)]
pub struct RemoveDiscountResponse {
    pub removed: u64,
}

/// List every discount record, newest first.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Discount>>> {
    let books = BookRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let admin = DiscountAdmin::new(&books, &discounts);

    Ok(Json(admin.list().await?))
}

/// Set a discount on a book, superseding overlapping windows.
#[instrument(skip(state, req), fields(name = %req.name))]
pub async fn set_for_book(
    State(state): State<AppState>,
    Path(book_id): Path<BookId>,
    Json(req): Json<SetDiscountRequest>,
) -> Result<Json<Discount>> {
    let books = BookRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let admin = DiscountAdmin::new(&books, &discounts);

    let discount = admin
        .set_book_discount(
            book_id,
            NewDiscount {
                name: req.name,
                percentage: req.percentage,
                start_date: req.start_date,
                end_date: req.end_date,
                on_sale: req.on_sale,
            },
        )
        .await?;

    Ok(Json(discount))
}

/// Remove the currently active discounts from a book.
#[instrument(skip(state))]
pub async fn remove_from_book(
    State(state): State<AppState>,
    Path(book_id): Path<BookId>,
) -> Result<Json<RemoveDiscountResponse>> {
    let books = BookRepository::new(state.pool());
    let discounts = DiscountRepository::new(state.pool());
    let admin = DiscountAdmin::new(&books, &discounts);

    let removed = admin.remove_book_discount(book_id).await?;
    Ok(Json(RemoveDiscountResponse { removed }))
}
