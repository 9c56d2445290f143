//! Database operations for the book catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use readnook_core::BookId;

use super::{BookStore, RepositoryError, StockDecrement};
use crate::models::Book;

/// Internal row type for book queries.
#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author: String,
    isbn: String,
    price: Decimal,
    stock_quantity: i32,
    is_coming_soon: bool,
    on_sale: bool,
    discounted_price: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: BookId::new(row.id),
            title: row.title,
            author: row.author,
            isbn: row.isbn,
            price: row.price,
            stock_quantity: row.stock_quantity,
            is_coming_soon: row.is_coming_soon,
            on_sale: row.on_sale,
            discounted_price: row.discounted_price,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, title, author, isbn, price, stock_quantity, \
     is_coming_soon, on_sale, discounted_price, created_at, updated_at";

/// Repository for book database operations.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl BookStore for BookRepository<'_> {
    async fn find(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM books ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_sale_fields(
        &self,
        id: BookId,
        discounted_price: Option<Decimal>,
        on_sale: bool,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE books SET discounted_price = $2, on_sale = $3, updated_at = now() \
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(discounted_price)
        .bind(on_sale)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn decrement_stock(
        &self,
        items: &[(BookId, i32)],
    ) -> Result<StockDecrement, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for &(book_id, quantity) in items {
            // Guarded decrement: the WHERE clause serializes concurrent
            // verifications on the row lock and prevents underflow.
            let updated = sqlx::query(
                "UPDATE books SET stock_quantity = stock_quantity - $2, updated_at = now() \
                 WHERE id = $1 AND stock_quantity >= $2",
            )
            .bind(book_id.as_uuid())
            .bind(quantity)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                let exists = sqlx::query_scalar::<_, bool>(
                    "SELECT EXISTS(SELECT 1 FROM books WHERE id = $1)",
                )
                .bind(book_id.as_uuid())
                .fetch_one(&mut *tx)
                .await?;

                tx.rollback().await?;
                return Ok(if exists {
                    StockDecrement::Insufficient(book_id)
                } else {
                    StockDecrement::Missing(book_id)
                });
            }
        }

        tx.commit().await?;
        Ok(StockDecrement::Applied)
    }
}
