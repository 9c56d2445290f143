//! Database operations for carts and cart lines.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use readnook_core::{BookId, CartId, UserId};

use super::{CartStore, RepositoryError};
use crate::models::{Cart, CartLine};

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for cart line queries.
#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    book_id: Uuid,
    quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            book_id: BookId::new(row.book_id),
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, cart_id: Uuid) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            "SELECT book_id, quantity, created_at, updated_at \
             FROM cart_items WHERE cart_id = $1 ORDER BY created_at ASC",
        )
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET updated_at = now() WHERE id = $1")
            .bind(cart_id.as_uuid())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

impl CartStore for CartRepository<'_> {
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // Lazy creation: the upsert makes concurrent first reads converge
        // on the same row (one cart per user is a unique constraint).
        let row = sqlx::query_as::<_, CartRow>(
            "INSERT INTO carts (id, user_id, created_at, updated_at) \
             VALUES ($1, $2, now(), now()) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING id, user_id, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id.as_uuid())
        .fetch_one(self.pool)
        .await?;

        let lines = self.load_lines(row.id).await?;

        Ok(Cart {
            id: CartId::new(row.id),
            user_id: UserId::new(row.user_id),
            lines,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    async fn add_line(&self, cart_id: CartId, book_id: BookId) -> Result<bool, RepositoryError> {
        let inserted = sqlx::query(
            "INSERT INTO cart_items (cart_id, book_id, quantity, created_at, updated_at) \
             VALUES ($1, $2, 1, now(), now()) \
             ON CONFLICT (cart_id, book_id) DO NOTHING",
        )
        .bind(cart_id.as_uuid())
        .bind(book_id.as_uuid())
        .execute(self.pool)
        .await?
        .rows_affected();

        if inserted > 0 {
            self.touch(cart_id).await?;
        }
        Ok(inserted > 0)
    }

    async fn set_quantity(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let updated = sqlx::query(
            "UPDATE cart_items SET quantity = $3, updated_at = now() \
             WHERE cart_id = $1 AND book_id = $2",
        )
        .bind(cart_id.as_uuid())
        .bind(book_id.as_uuid())
        .bind(quantity)
        .execute(self.pool)
        .await?
        .rows_affected();

        if updated > 0 {
            self.touch(cart_id).await?;
        }
        Ok(updated > 0)
    }

    async fn remove_line(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<bool, RepositoryError> {
        let removed = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND book_id = $2")
            .bind(cart_id.as_uuid())
            .bind(book_id.as_uuid())
            .execute(self.pool)
            .await?
            .rows_affected();

        if removed > 0 {
            self.touch(cart_id).await?;
        }
        Ok(removed > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query(
            "DELETE FROM cart_items \
             WHERE cart_id IN (SELECT id FROM carts WHERE user_id = $1)",
        )
        .bind(user_id.as_uuid())
        .execute(self.pool)
        .await?;

        sqlx::query("UPDATE carts SET updated_at = now() WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
