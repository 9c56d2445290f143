//! Database operations for discount records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use readnook_core::{BookId, DiscountId};

use super::{DiscountStore, RepositoryError};
use crate::models::Discount;

/// Internal row type for discount queries.
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    id: Uuid,
    name: String,
    percentage: Decimal,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    on_sale: bool,
    book_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<DiscountRow> for Discount {
    fn from(row: DiscountRow) -> Self {
        Self {
            id: DiscountId::new(row.id),
            name: row.name,
            percentage: row.percentage,
            start_date: row.start_date,
            end_date: row.end_date,
            on_sale: row.on_sale,
            book_id: row.book_id.map(BookId::new),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str =
    "id, name, percentage, start_date, end_date, on_sale, book_id, created_at, updated_at";

/// Repository for discount database operations.
pub struct DiscountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DiscountRepository<'a> {
    /// Create a new discount repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl DiscountStore for DiscountRepository<'_> {
    async fn for_book(&self, book_id: BookId) -> Result<Vec<Discount>, RepositoryError> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM discounts WHERE book_id = $1 ORDER BY created_at DESC"
        ))
        .bind(book_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list(&self) -> Result<Vec<Discount>, RepositoryError> {
        let rows = sqlx::query_as::<_, DiscountRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM discounts ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert(&self, discount: &Discount) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO discounts \
                 (id, name, percentage, start_date, end_date, on_sale, book_id, \
                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(discount.id.as_uuid())
        .bind(&discount.name)
        .bind(discount.percentage)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.on_sale)
        .bind(discount.book_id.map(|id| id.as_uuid()))
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn delete_overlapping(
        &self,
        book_id: BookId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM discounts \
             WHERE book_id = $1 AND start_date <= $3 AND end_date >= $2",
        )
        .bind(book_id.as_uuid())
        .bind(start)
        .bind(end)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_active(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM discounts \
             WHERE book_id = $1 AND start_date <= $2 AND end_date >= $2",
        )
        .bind(book_id.as_uuid())
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
