//! Shopping cart model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use readnook_core::{BookId, CartId, UserId};

/// A user's shopping cart.
///
/// Exactly one cart per user, created lazily on first access and never
/// deleted, only emptied. Lines hold requested quantities; they validate
/// against stock but do not reserve it.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Find the line for a book, if present.
    #[must_use]
    pub fn line_for(&self, book_id: BookId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.book_id == book_id)
    }

    /// Total requested quantity across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> i32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// One book in a cart. At most one line per book.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub book_id: BookId,
    /// Requested quantity, always at least 1.
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
