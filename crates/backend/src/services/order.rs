//! Order conversion and claim-code verification.
//!
//! Creating an order snapshots the priced cart without touching stock or
//! the cart itself; both are settled exactly once when the claim code is
//! presented. Verification is all-or-nothing: either every item's stock
//! is decremented and the order moves to Verified, or nothing changes.

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use readnook_core::{BookId, ClaimCode, OrderId, OrderItemId, OrderStatus, UserId};

use crate::db::{
    BookStore, CartStore, DiscountStore, OrderStore, RepositoryError, StockDecrement, UserStore,
};
use crate::models::{Order, OrderItem};

use super::cart::CartError;
use super::email::Notifier;
use super::pricing::CartPricer;

/// Errors from order conversion and verification.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("user not found")]
    UserNotFound,

    #[error("book {0} not found")]
    BookNotFound(BookId),

    #[error("order not found")]
    OrderNotFound,

    #[error("order has already been verified")]
    AlreadyVerified,

    #[error("not enough stock available for book: {book_title}")]
    InsufficientStock { book_title: String },

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CartError> for OrderError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::BookNotFound(id) => Self::BookNotFound(id),
            CartError::InvalidQuantity => Self::InvalidQuantity,
            CartError::InsufficientStock { book_title } => Self::InsufficientStock { book_title },
            CartError::Repository(e) => Self::Repository(e),
        }
    }
}

/// Converts carts into orders and verifies them by claim code.
pub struct OrderService<'a, B, C, D, O, U, N> {
    books: &'a B,
    carts: &'a C,
    discounts: &'a D,
    orders: &'a O,
    users: &'a U,
    notifier: &'a N,
}

impl<'a, B, C, D, O, U, N> OrderService<'a, B, C, D, O, U, N>
where
    B: BookStore,
    C: CartStore,
    D: DiscountStore,
    O: OrderStore,
    U: UserStore,
    N: Notifier,
{
    /// Create an order service over the given stores and notifier.
    #[must_use]
    pub const fn new(
        books: &'a B,
        carts: &'a C,
        discounts: &'a D,
        orders: &'a O,
        users: &'a U,
        notifier: &'a N,
    ) -> Self {
        Self {
            books,
            carts,
            discounts,
            orders,
            users,
            notifier,
        }
    }

    /// Snapshot the user's priced cart into a Pending order.
    ///
    /// Stock is not decremented and the cart is not cleared here; both
    /// happen at verification so an abandoned claim never consumes
    /// inventory. The confirmation email is best-effort.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` for carts with no lines and
    /// `OrderError::UserNotFound` for unknown users.
    pub async fn create_from_cart(&self, user_id: UserId) -> Result<Order, OrderError> {
        let cart = self.carts.get_or_create(user_id).await?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let user = self
            .users
            .find(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;

        let now = Utc::now();
        let priced = CartPricer::new(self.books, self.discounts, self.orders)
            .price(&cart, now)
            .await?;

        let order_id = OrderId::generate();
        let items = priced
            .lines
            .iter()
            .map(|line| OrderItem {
                id: OrderItemId::generate(),
                order_id,
                book_id: line.book_id,
                book_title: line.book_title.clone(),
                book_author: line.book_author.clone(),
                quantity: line.quantity,
                unit_price: line.unit_price,
                discounted_price: line.discounted_price,
                discount_percentage: line.discount_percentage,
                line_total: line.line_total,
                created_at: now,
            })
            .collect();

        let order = Order {
            id: order_id,
            user_id,
            claim_code: ClaimCode::generate(),
            total_amount: priced.total,
            original_total_amount: priced.original_total,
            volume_discount_amount: priced.volume_discount_amount,
            loyalty_discount_amount: priced.loyalty_discount_amount,
            status: OrderStatus::Pending,
            items,
            created_at: now,
            updated_at: now,
        };

        self.orders.insert(&order).await?;
        tracing::info!(order_id = %order.id, user_id = %user_id, "Order created");

        // An order must exist even if the confirmation email fails.
        if let Err(e) = self.notifier.order_confirmation(&user.email, &order).await {
            warn!(order_id = %order.id, error = %e, "Failed to send order confirmation email");
        }

        Ok(order)
    }

    /// Look up an order by claim code. Pure read, any status.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` if no order has this code.
    pub async fn get_by_claim_code(&self, code: &ClaimCode) -> Result<Order, OrderError> {
        self.orders
            .find_by_claim_code(code)
            .await?
            .ok_or(OrderError::OrderNotFound)
    }

    /// All orders for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` on query failure.
    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// Settle a Pending order: decrement stock for every item, move the
    /// order to Verified, and empty the buyer's cart. Exactly once.
    ///
    /// Every item is validated before anything is mutated, the status
    /// transition is a compare-and-set so a concurrent verification
    /// short-circuits, and the stock decrement itself is all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::OrderNotFound` for unknown codes,
    /// `OrderError::AlreadyVerified` for non-Pending orders, and
    /// `OrderError::BookNotFound` / `OrderError::InsufficientStock` when
    /// an item can no longer be fulfilled (in which case no book's stock
    /// changed and the order is still Pending).
    pub async fn verify_by_claim_code(&self, code: &ClaimCode) -> Result<Order, OrderError> {
        let order = self
            .orders
            .find_by_claim_code(code)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        if order.status != OrderStatus::Pending {
            return Err(OrderError::AlreadyVerified);
        }

        // Pre-validate every item so a failure names the book and nothing
        // is mutated on the common path.
        let mut decrements = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let book = self
                .books
                .find(item.book_id)
                .await?
                .ok_or(OrderError::BookNotFound(item.book_id))?;
            if book.stock_quantity < item.quantity {
                return Err(OrderError::InsufficientStock {
                    book_title: book.title,
                });
            }
            decrements.push((item.book_id, item.quantity));
        }

        // Claim the order first; the loser of a double-verify race stops
        // here without touching stock.
        let claimed = self
            .orders
            .transition_status(order.id, OrderStatus::Pending, OrderStatus::Verified)
            .await?;
        if !claimed {
            return Err(OrderError::AlreadyVerified);
        }

        match self.books.decrement_stock(&decrements).await? {
            StockDecrement::Applied => {}
            StockDecrement::Insufficient(book_id) => {
                // Lost a stock race against another order since
                // pre-validation; release the claim.
                self.release_claim(order.id).await?;
                let book_title = self
                    .books
                    .find(book_id)
                    .await?
                    .map_or_else(|| book_id.to_string(), |b| b.title);
                return Err(OrderError::InsufficientStock { book_title });
            }
            StockDecrement::Missing(book_id) => {
                self.release_claim(order.id).await?;
                return Err(OrderError::BookNotFound(book_id));
            }
        }

        self.carts.clear(order.user_id).await?;
        tracing::info!(order_id = %order.id, claim_code = %order.claim_code, "Order verified");

        match self.users.find(order.user_id).await {
            Ok(Some(user)) => {
                if let Err(e) = self.notifier.order_verified(&user.email, &order).await {
                    warn!(order_id = %order.id, error = %e, "Failed to send order verified email");
                }
            }
            Ok(None) => {
                warn!(order_id = %order.id, "Buyer no longer exists, skipping verified email");
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Buyer lookup failed, skipping verified email");
            }
        }

        let mut verified = order;
        verified.status = OrderStatus::Verified;
        verified.updated_at = Utc::now();
        Ok(verified)
    }

    async fn release_claim(&self, order_id: OrderId) -> Result<(), RepositoryError> {
        let released = self
            .orders
            .transition_status(order_id, OrderStatus::Verified, OrderStatus::Pending)
            .await?;
        if !released {
            warn!(%order_id, "Could not release verification claim");
        }
        Ok(())
    }
}
