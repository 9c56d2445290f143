//! Database operations for order snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use readnook_core::{BookId, ClaimCode, OrderId, OrderItemId, OrderStatus, UserId};

use super::{OrderStore, RepositoryError};
use crate::models::{Order, OrderItem};

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    claim_code: String,
    total_amount: Decimal,
    original_total_amount: Decimal,
    volume_discount_amount: Option<Decimal>,
    loyalty_discount_amount: Option<Decimal>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    book_id: Uuid,
    book_title: String,
    book_author: String,
    quantity: i32,
    unit_price: Decimal,
    discounted_price: Option<Decimal>,
    discount_percentage: Option<Decimal>,
    line_total: Decimal,
    created_at: DateTime<Utc>,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            book_id: BookId::new(row.book_id),
            book_title: row.book_title,
            book_author: row.book_author,
            quantity: row.quantity,
            unit_price: row.unit_price,
            discounted_price: row.discounted_price,
            discount_percentage: row.discount_percentage,
            line_total: row.line_total,
            created_at: row.created_at,
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status: OrderStatus = self.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let claim_code = ClaimCode::parse(&self.claim_code).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid claim code in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            user_id: UserId::new(self.user_id),
            claim_code,
            total_amount: self.total_amount,
            original_total_amount: self.original_total_amount,
            volume_discount_amount: self.volume_discount_amount,
            loyalty_discount_amount: self.loyalty_discount_amount,
            status,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, claim_code, total_amount, original_total_amount, \
     volume_discount_amount, loyalty_discount_amount, status, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, book_id, book_title, book_author, quantity, \
     unit_price, discounted_price, discount_percentage, line_total, created_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    async fn load_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items \
             WHERE order_id = $1 ORDER BY created_at ASC"
        ))
        .bind(order_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

impl OrderStore for OrderRepository<'_> {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders \
                 (id, user_id, claim_code, total_amount, original_total_amount, \
                  volume_discount_amount, loyalty_discount_amount, status, \
                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.claim_code.as_str())
        .bind(order.total_amount)
        .bind(order.original_total_amount)
        .bind(order.volume_discount_amount)
        .bind(order.loyalty_discount_amount)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("orders_claim_code_key")
            {
                return RepositoryError::Conflict("duplicate claim code".to_string());
            }
            RepositoryError::Database(e)
        })?;

        for item in &order.items {
            sqlx::query(
                "INSERT INTO order_items \
                     (id, order_id, book_id, book_title, book_author, quantity, \
                      unit_price, discounted_price, discount_percentage, line_total, \
                      created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(item.id.as_uuid())
            .bind(item.order_id.as_uuid())
            .bind(item.book_id.as_uuid())
            .bind(&item.book_title)
            .bind(&item.book_author)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.discounted_price)
            .bind(item.discount_percentage)
            .bind(item.line_total)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_claim_code(
        &self,
        code: &ClaimCode,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE claim_code = $1"
        ))
        .bind(code.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = self.load_items(row.id).await?;
        row.into_order(items).map(Some)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(self.pool)
        .await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let items = self.load_items(row.id).await?;
            orders.push(row.into_order(items)?);
        }
        Ok(orders)
    }

    async fn settled_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders \
             WHERE user_id = $1 AND status IN ('Verified', 'Completed')",
        )
        .bind(user_id.as_uuid())
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        // Compare-and-set: of two concurrent verifications, exactly one
        // sees rows_affected == 1.
        let updated = sqlx::query(
            "UPDATE orders SET status = $3, updated_at = now() \
             WHERE id = $1 AND status = $2",
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }
}
