//! Catalog book model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use readnook_core::BookId;

/// A book in the catalog.
///
/// `stock_quantity` is only mutated at order verification time and is
/// guarded against going negative by the repository layer.
/// `discounted_price` and `on_sale` are display caches refreshed by the
/// discount write path; pricing always resolves discounts from the
/// discount records, never from these fields.
#[derive(Debug, Clone, Serialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: String,
    /// List price. "Original" totals are always computed from this.
    pub price: Decimal,
    pub stock_quantity: i32,
    pub is_coming_soon: bool,
    pub on_sale: bool,
    pub discounted_price: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
