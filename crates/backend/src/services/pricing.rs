//! Cart pricing engine.
//!
//! Prices a cart in three layers, applied in order: per-item time-bounded
//! discounts, a flat volume discount once the cart holds enough copies,
//! and the loyalty discount on the post-volume subtotal. Each discount
//! amount is rounded to cents before it is subtracted, so the emitted
//! amounts always sum exactly to `original_total - total`.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use readnook_core::{BookId, CartId, UserId};

use crate::db::{BookStore, DiscountStore, OrderStore};
use crate::models::Cart;

use super::cart::CartError;
use super::discount::DiscountResolver;
use super::loyalty::{LOYALTY_DISCOUNT_PERCENTAGE, LOYALTY_ORDER_THRESHOLD, LoyaltyEvaluator};

/// Total quantity at which the volume discount kicks in.
pub const VOLUME_DISCOUNT_THRESHOLD: i32 = 5;

/// Flat volume discount rate (5%).
pub const VOLUME_DISCOUNT_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Round a money amount to cents, half away from zero.
#[must_use]
pub(crate) fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// One fully priced cart line.
#[derive(Debug, Clone, Serialize)]
pub struct PricedLine {
    pub book_id: BookId,
    pub book_title: String,
    pub book_author: String,
    /// List price per unit.
    pub unit_price: Decimal,
    /// Per-unit price after the item discount, when one is active.
    pub discounted_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
    pub on_sale: bool,
    pub quantity: i32,
    /// Effective unit price times quantity.
    pub line_total: Decimal,
}

/// A fully priced cart: per-line prices plus layered cart discounts.
#[derive(Debug, Clone, Serialize)]
pub struct PricedCart {
    pub cart_id: CartId,
    pub user_id: UserId,
    pub lines: Vec<PricedLine>,
    pub total_quantity: i32,
    /// List-price total, before any discount.
    pub original_total: Decimal,
    pub volume_discount_amount: Option<Decimal>,
    pub volume_discount_message: Option<String>,
    pub loyalty_discount_amount: Option<Decimal>,
    pub loyalty_message: Option<String>,
    /// Amount due after per-item, volume, and loyalty discounts.
    pub total: Decimal,
}

impl PricedCart {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Prices carts against the catalog, discount records, and order history.
pub struct CartPricer<'a, B, D, O> {
    books: &'a B,
    discounts: &'a D,
    orders: &'a O,
}

impl<'a, B, D, O> CartPricer<'a, B, D, O>
where
    B: BookStore,
    D: DiscountStore,
    O: OrderStore,
{
    /// Create a pricer over the given stores.
    #[must_use]
    pub const fn new(books: &'a B, discounts: &'a D, orders: &'a O) -> Self {
        Self {
            books,
            discounts,
            orders,
        }
    }

    /// Price every line of the cart, then layer volume and loyalty
    /// discounts onto the subtotal.
    ///
    /// An empty cart prices to zero with no discounts and no error.
    ///
    /// # Errors
    ///
    /// Returns `CartError::BookNotFound` if a cart line references a book
    /// that no longer exists, or `CartError::Repository` on query failure.
    pub async fn price(&self, cart: &Cart, now: DateTime<Utc>) -> Result<PricedCart, CartError> {
        let resolver = DiscountResolver::new(self.discounts);

        let mut lines = Vec::with_capacity(cart.lines.len());
        let mut original_total = Decimal::ZERO;
        let mut subtotal = Decimal::ZERO;
        let mut total_quantity = 0;

        for line in &cart.lines {
            let book = self
                .books
                .find(line.book_id)
                .await?
                .ok_or(CartError::BookNotFound(line.book_id))?;

            let discount = resolver.resolve(book.id, now).await?;
            let (discounted_price, discount_percentage, on_sale) = match &discount {
                Some(d) => {
                    let per_unit = round_cents(
                        book.price * (Decimal::ONE - d.percentage / Decimal::ONE_HUNDRED),
                    );
                    (Some(per_unit), Some(d.percentage), d.on_sale)
                }
                None => (None, None, false),
            };

            let quantity = Decimal::from(line.quantity);
            let effective = discounted_price.unwrap_or(book.price);
            let line_total = round_cents(effective * quantity);

            original_total += book.price * quantity;
            subtotal += line_total;
            total_quantity += line.quantity;

            lines.push(PricedLine {
                book_id: book.id,
                book_title: book.title,
                book_author: book.author,
                unit_price: book.price,
                discounted_price,
                discount_percentage,
                on_sale,
                quantity: line.quantity,
                line_total,
            });
        }

        let mut priced = PricedCart {
            cart_id: cart.id,
            user_id: cart.user_id,
            lines,
            total_quantity,
            original_total,
            volume_discount_amount: None,
            volume_discount_message: None,
            loyalty_discount_amount: None,
            loyalty_message: None,
            total: subtotal,
        };

        if priced.is_empty() {
            return Ok(priced);
        }

        if total_quantity >= VOLUME_DISCOUNT_THRESHOLD {
            let amount = round_cents(subtotal * VOLUME_DISCOUNT_RATE);
            subtotal -= amount;
            priced.volume_discount_amount = Some(amount);
            priced.volume_discount_message = Some(format!(
                "5% volume discount applied for ordering {VOLUME_DISCOUNT_THRESHOLD} or more books."
            ));
        }

        // Loyalty applies to the post-volume subtotal: discounts stack
        // sequentially, never on the original total.
        let loyalty = LoyaltyEvaluator::new(self.orders);
        let count = loyalty.settled_order_count(cart.user_id).await?;
        if count == LOYALTY_ORDER_THRESHOLD {
            let amount =
                round_cents(subtotal * (LOYALTY_DISCOUNT_PERCENTAGE / Decimal::ONE_HUNDRED));
            subtotal -= amount;
            priced.loyalty_discount_amount = Some(amount);
            priced.loyalty_message = Some(format!(
                "{LOYALTY_DISCOUNT_PERCENTAGE}% loyalty discount applied. Thanks for being a regular!"
            ));
        } else {
            priced.loyalty_message = Some(format!(
                "Completed order {count} of {LOYALTY_ORDER_THRESHOLD} toward your next loyalty discount."
            ));
        }

        priced.total = subtotal;
        Ok(priced)
    }
}
