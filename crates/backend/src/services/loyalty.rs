//! Loyalty discount evaluation.
//!
//! A user earns a 10% loyalty discount on the pricing pass that follows
//! their 11th settled order, and again after every further 11 (22, 33,
//! ...). The count is a cyclic window: it is always reported in the range
//! 1–11, with exact multiples of 11 reading as 11 rather than 0.
//!
//! Evaluation is a pure function of persisted order history and is
//! recomputed on every pricing call; the count changes between calls.

use rust_decimal::Decimal;

use readnook_core::UserId;

use crate::db::{OrderStore, RepositoryError};

/// Settled orders per loyalty cycle.
pub const LOYALTY_ORDER_THRESHOLD: i64 = 11;

/// Percentage off when a user qualifies.
pub const LOYALTY_DISCOUNT_PERCENTAGE: Decimal = Decimal::TEN;

/// Map a raw settled-order count into the 1–11 cyclic window.
///
/// Multiples of the threshold read as the threshold itself so a user who
/// has just completed a full cycle qualifies instead of wrapping to zero.
#[must_use]
pub const fn normalized_count(settled: i64) -> i64 {
    if settled > 0 && settled % LOYALTY_ORDER_THRESHOLD == 0 {
        LOYALTY_ORDER_THRESHOLD
    } else {
        settled % LOYALTY_ORDER_THRESHOLD
    }
}

/// Evaluates loyalty discounts from settled order history.
pub struct LoyaltyEvaluator<'a, O> {
    orders: &'a O,
}

impl<'a, O: OrderStore> LoyaltyEvaluator<'a, O> {
    /// Create an evaluator over an order store.
    #[must_use]
    pub const fn new(orders: &'a O) -> Self {
        Self { orders }
    }

    /// The user's settled-order count, normalized into the cyclic window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the count query fails.
    pub async fn settled_order_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let settled = self.orders.settled_count(user_id).await?;
        Ok(normalized_count(settled))
    }

    /// Whether the next pricing pass should apply the loyalty discount.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the count query fails.
    pub async fn qualifies(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        Ok(self.settled_order_count(user_id).await? == LOYALTY_ORDER_THRESHOLD)
    }

    /// The loyalty percentage for the user: 10 when qualifying, else 0.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the count query fails.
    pub async fn discount_percentage(&self, user_id: UserId) -> Result<Decimal, RepositoryError> {
        if self.qualifies(user_id).await? {
            Ok(LOYALTY_DISCOUNT_PERCENTAGE)
        } else {
            Ok(Decimal::ZERO)
        }
    }
}
