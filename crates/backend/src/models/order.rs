//! Order snapshot models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use readnook_core::{BookId, ClaimCode, OrderId, OrderItemId, OrderStatus, UserId};

/// An immutable snapshot of a priced cart.
///
/// All amounts are copied from the pricing pass at creation time and are
/// never re-derived; only `status` (and `updated_at`) change afterwards,
/// and only forward. Stock is untouched until verification so that an
/// abandoned claim does not consume inventory.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub claim_code: ClaimCode,
    /// Amount due after all discounts.
    pub total_amount: Decimal,
    /// List-price total before any discount.
    pub original_total_amount: Decimal,
    pub volume_discount_amount: Option<Decimal>,
    pub loyalty_discount_amount: Option<Decimal>,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An immutable snapshot of one cart line.
///
/// Title and author are copied from the book at creation time so that
/// historical orders (and pickup emails) are unaffected by later catalog
/// edits. No live reference to the book or discount rows is kept.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub book_id: BookId,
    pub book_title: String,
    pub book_author: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discounted_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub line_total: Decimal,
    pub created_at: DateTime<Utc>,
}
