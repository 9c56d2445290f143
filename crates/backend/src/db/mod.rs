//! Database layer: storage traits and their `PostgreSQL` implementations.
//!
//! The service layer talks to storage exclusively through the `*Store`
//! traits so business logic can be exercised against in-memory fakes.
//! The `PostgreSQL` implementations use runtime-checked sqlx queries.
//!
//! ## Tables
//!
//! - `users` - customer accounts
//! - `books` - catalog with stock quantities
//! - `discounts` - time-bounded percentage discounts
//! - `carts` / `cart_items` - one cart per user, one line per book
//! - `orders` / `order_items` - immutable priced snapshots

pub mod books;
pub mod carts;
pub mod discounts;
pub mod orders;
pub mod users;

use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use readnook_core::{BookId, CartId, ClaimCode, OrderId, OrderStatus, UserId};

use crate::models::{Book, Cart, Discount, Order, User};

pub use books::BookRepository;
pub use carts::CartRepository;
pub use discounts::DiscountRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate claim code).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Outcome of an all-or-nothing stock decrement.
///
/// `Insufficient` and `Missing` guarantee that no stock was changed for
/// any book in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockDecrement {
    /// Every book had enough stock; all decrements were applied.
    Applied,
    /// The named book had less stock than requested; nothing was applied.
    Insufficient(BookId),
    /// The named book no longer exists; nothing was applied.
    Missing(BookId),
}

/// Catalog storage.
pub trait BookStore {
    /// Look up a book by ID.
    fn find(
        &self,
        id: BookId,
    ) -> impl Future<Output = Result<Option<Book>, RepositoryError>> + Send;

    /// List the catalog, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;

    /// Refresh the cached sale fields set by the discount write path.
    fn update_sale_fields(
        &self,
        id: BookId,
        discounted_price: Option<Decimal>,
        on_sale: bool,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Atomically decrement stock for every `(book, quantity)` pair, or
    /// change nothing at all.
    fn decrement_stock(
        &self,
        items: &[(BookId, i32)],
    ) -> impl Future<Output = Result<StockDecrement, RepositoryError>> + Send;
}

/// Discount record storage.
pub trait DiscountStore {
    /// All discount records scoped to a book, regardless of window.
    fn for_book(
        &self,
        book_id: BookId,
    ) -> impl Future<Output = Result<Vec<Discount>, RepositoryError>> + Send;

    /// All discount records, newest first.
    fn list(&self) -> impl Future<Output = Result<Vec<Discount>, RepositoryError>> + Send;

    /// Persist a new discount record.
    fn insert(
        &self,
        discount: &Discount,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete records for a book whose windows overlap `[start, end]`.
    /// Returns the number of deleted rows.
    fn delete_overlapping(
        &self,
        book_id: BookId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;

    /// Delete records for a book whose windows cover `now`.
    /// Returns the number of deleted rows.
    fn delete_active(
        &self,
        book_id: BookId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Cart storage. One cart per user, created lazily.
pub trait CartStore {
    /// Fetch the user's cart, creating an empty one on first access.
    fn get_or_create(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Cart, RepositoryError>> + Send;

    /// Add a line with quantity 1. Adding a book that is already in the
    /// cart is a no-op. Returns `true` if a line was inserted.
    fn add_line(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Set the quantity of an existing line. Returns `false` if the book
    /// has no line in this cart.
    fn set_quantity(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Remove a line. Returns `false` if the book has no line in this cart.
    fn remove_line(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Remove every line from the user's cart, keeping the cart itself.
    fn clear(&self, user_id: UserId)
    -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Order snapshot storage.
pub trait OrderStore {
    /// Persist a new order with its items.
    fn insert(&self, order: &Order) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up an order (with items) by claim code.
    fn find_by_claim_code(
        &self,
        code: &ClaimCode,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// All orders for a user, newest first.
    fn list_for_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Order>, RepositoryError>> + Send;

    /// Number of settled (Verified or Completed) orders for a user.
    fn settled_count(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<i64, RepositoryError>> + Send;

    /// Compare-and-set status transition. Returns `true` only if the order
    /// was in `from` and is now in `to`; a concurrent caller that lost the
    /// race observes `false`.
    fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Customer account storage.
pub trait UserStore {
    /// Look up a user by ID.
    fn find(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
