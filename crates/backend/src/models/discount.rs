//! Time-bounded discount records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use readnook_core::{BookId, DiscountId};

/// A percentage discount with a validity window.
///
/// Scoped to a single book when `book_id` is set, otherwise a global
/// record kept for admin listing. Overlapping windows for the same book
/// can exist transiently even though the write path deletes overlaps;
/// resolution picks the most recently created active match.
#[derive(Debug, Clone, Serialize)]
pub struct Discount {
    pub id: DiscountId,
    pub name: String,
    /// Percentage off, in the range 0–100.
    pub percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub on_sale: bool,
    pub book_id: Option<BookId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Discount {
    /// Whether the validity window covers `now`.
    #[must_use]
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}
