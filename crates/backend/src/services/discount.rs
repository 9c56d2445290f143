//! Discount resolution and the admin write path.
//!
//! Resolution is read-only. Even though the write path deletes
//! overlapping windows, transient overlaps can exist; when several
//! records cover the same instant, the most recently created one wins.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use readnook_core::{BookId, DiscountId};

use crate::db::{BookStore, DiscountStore, RepositoryError};
use crate::models::Discount;

use super::pricing::round_cents;

/// Errors from the discount admin write path.
#[derive(Debug, Error)]
pub enum DiscountError {
    #[error("book {0} not found")]
    BookNotFound(BookId),

    #[error("discount percentage must be between 0 and 100")]
    InvalidPercentage,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Pick the active discount among candidate records.
///
/// A record is active when its window covers `now`; ties are broken by
/// the latest creation timestamp (last-write-wins, matching the write
/// path's overlap deletion).
#[must_use]
pub fn select_active(candidates: &[Discount], now: DateTime<Utc>) -> Option<&Discount> {
    candidates
        .iter()
        .filter(|d| d.is_active_at(now))
        .max_by_key(|d| d.created_at)
}

/// Read-only resolver for the single active discount of a book.
pub struct DiscountResolver<'a, D> {
    discounts: &'a D,
}

impl<'a, D: DiscountStore> DiscountResolver<'a, D> {
    /// Create a resolver over a discount store.
    #[must_use]
    pub const fn new(discounts: &'a D) -> Self {
        Self { discounts }
    }

    /// Resolve the active discount for a book at `now`.
    ///
    /// `None` means full price, not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the candidate lookup fails.
    pub async fn resolve(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> Result<Option<Discount>, RepositoryError> {
        let candidates = self.discounts.for_book(book_id).await?;
        Ok(select_active(&candidates, now).cloned())
    }
}

/// Request to put a book on discount.
#[derive(Debug, Clone)]
pub struct NewDiscount {
    pub name: String,
    pub percentage: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub on_sale: bool,
}

/// Admin write path for book discounts.
///
/// Writes delete overlapping windows first so at most one record covers
/// any instant, and refresh the book's cached sale fields for catalog
/// display.
pub struct DiscountAdmin<'a, B, D> {
    books: &'a B,
    discounts: &'a D,
}

impl<'a, B: BookStore, D: DiscountStore> DiscountAdmin<'a, B, D> {
    /// Create a discount admin service.
    #[must_use]
    pub const fn new(books: &'a B, discounts: &'a D) -> Self {
        Self { books, discounts }
    }

    /// List every discount record, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::Repository` if the query fails.
    pub async fn list(&self) -> Result<Vec<Discount>, DiscountError> {
        Ok(self.discounts.list().await?)
    }

    /// Create a discount for a book, superseding overlapping windows.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::InvalidPercentage` for percentages outside
    /// 0–100 and `DiscountError::BookNotFound` for unknown books.
    pub async fn set_book_discount(
        &self,
        book_id: BookId,
        request: NewDiscount,
    ) -> Result<Discount, DiscountError> {
        if request.percentage < Decimal::ZERO || request.percentage > Decimal::ONE_HUNDRED {
            return Err(DiscountError::InvalidPercentage);
        }

        let book = self
            .books
            .find(book_id)
            .await?
            .ok_or(DiscountError::BookNotFound(book_id))?;

        let superseded = self
            .discounts
            .delete_overlapping(book_id, request.start_date, request.end_date)
            .await?;
        if superseded > 0 {
            tracing::info!(%book_id, superseded, "Superseded overlapping discounts");
        }

        let now = Utc::now();
        let discount = Discount {
            id: DiscountId::generate(),
            name: request.name,
            percentage: request.percentage,
            start_date: request.start_date,
            end_date: request.end_date,
            on_sale: request.on_sale,
            book_id: Some(book_id),
            created_at: now,
            updated_at: now,
        };
        self.discounts.insert(&discount).await?;

        let discounted_price = round_cents(
            book.price * (Decimal::ONE - discount.percentage / Decimal::ONE_HUNDRED),
        );
        self.books
            .update_sale_fields(book_id, Some(discounted_price), discount.on_sale)
            .await?;

        Ok(discount)
    }

    /// Remove the currently active discounts from a book and clear its
    /// cached sale fields.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::BookNotFound` for unknown books.
    pub async fn remove_book_discount(&self, book_id: BookId) -> Result<u64, DiscountError> {
        self.books
            .find(book_id)
            .await?
            .ok_or(DiscountError::BookNotFound(book_id))?;

        let removed = self.discounts.delete_active(book_id, Utc::now()).await?;
        self.books.update_sale_fields(book_id, None, false).await?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn discount_record(
        book_id: BookId,
        start_offset_days: i64,
        end_offset_days: i64,
        created_offset_mins: i64,
        name: &str,
    ) -> Discount {
        let now = Utc::now();
        Discount {
            id: DiscountId::generate(),
            name: name.to_string(),
            percentage: Decimal::from(20),
            start_date: now + Duration::days(start_offset_days),
            end_date: now + Duration::days(end_offset_days),
            on_sale: true,
            book_id: Some(book_id),
            created_at: now + Duration::minutes(created_offset_mins),
            updated_at: now,
        }
    }

    #[test]
    fn test_no_candidates_resolves_to_none() {
        assert!(select_active(&[], Utc::now()).is_none());
    }

    #[test]
    fn test_expired_and_future_windows_are_ignored() {
        let book_id = BookId::generate();
        let candidates = vec![
            discount_record(book_id, -10, -5, 0, "expired"),
            discount_record(book_id, 5, 10, 0, "future"),
        ];
        assert!(select_active(&candidates, Utc::now()).is_none());
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let book_id = BookId::generate();
        let record = discount_record(book_id, 0, 0, 0, "today");
        let at_start = record.start_date;
        let at_end = record.end_date;
        let candidates = vec![record];
        assert!(select_active(&candidates, at_start).is_some());
        assert!(select_active(&candidates, at_end).is_some());
    }

    #[test]
    fn test_overlapping_windows_pick_latest_created() {
        let book_id = BookId::generate();
        let candidates = vec![
            discount_record(book_id, -5, 5, -30, "older"),
            discount_record(book_id, -3, 3, -5, "newer"),
            discount_record(book_id, -4, 4, -20, "middle"),
        ];
        let active = select_active(&candidates, Utc::now()).expect("one active");
        assert_eq!(active.name, "newer");
    }
}
