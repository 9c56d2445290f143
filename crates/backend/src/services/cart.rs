//! Cart management.
//!
//! One cart per user, created lazily on first access and never deleted.
//! Quantities validate against current stock but never reserve it; stock
//! is only consumed when an order is verified.

use chrono::Utc;
use thiserror::Error;

use readnook_core::{BookId, UserId};

use crate::db::{BookStore, CartStore, DiscountStore, OrderStore, RepositoryError};

use super::pricing::{CartPricer, PricedCart};

/// Errors from cart operations and pricing.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("book {0} not found")]
    BookNotFound(BookId),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("not enough stock available for book: {book_title}")]
    InsufficientStock { book_title: String },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart operations, each returning the freshly priced cart.
pub struct CartManager<'a, B, C, D, O> {
    books: &'a B,
    carts: &'a C,
    discounts: &'a D,
    orders: &'a O,
}

impl<'a, B, C, D, O> CartManager<'a, B, C, D, O>
where
    B: BookStore,
    C: CartStore,
    D: DiscountStore,
    O: OrderStore,
{
    /// Create a cart manager over the given stores.
    #[must_use]
    pub const fn new(books: &'a B, carts: &'a C, discounts: &'a D, orders: &'a O) -> Self {
        Self {
            books,
            carts,
            discounts,
            orders,
        }
    }

    async fn priced(&self, user_id: UserId) -> Result<PricedCart, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;
        CartPricer::new(self.books, self.discounts, self.orders)
            .price(&cart, Utc::now())
            .await
    }

    /// Fetch (lazily creating) and price the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` on pricing or storage failure.
    pub async fn get(&self, user_id: UserId) -> Result<PricedCart, CartError> {
        self.priced(user_id).await
    }

    /// Add a book to the cart with quantity 1.
    ///
    /// Adding a book that is already in the cart is a no-op for quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::BookNotFound` for unknown books.
    pub async fn add_item(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<PricedCart, CartError> {
        self.books
            .find(book_id)
            .await?
            .ok_or(CartError::BookNotFound(book_id))?;

        let cart = self.carts.get_or_create(user_id).await?;
        self.carts.add_line(cart.id, book_id).await?;

        self.priced(user_id).await
    }

    /// Set the quantity of a line already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::InvalidQuantity` for quantities below 1,
    /// `CartError::BookNotFound` if the book is unknown or has no line in
    /// this cart, and `CartError::InsufficientStock` when the request
    /// exceeds current stock.
    pub async fn update_item(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<PricedCart, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }

        let book = self
            .books
            .find(book_id)
            .await?
            .ok_or(CartError::BookNotFound(book_id))?;

        // Validation only; nothing is reserved.
        if quantity > book.stock_quantity {
            return Err(CartError::InsufficientStock {
                book_title: book.title,
            });
        }

        let cart = self.carts.get_or_create(user_id).await?;
        let updated = self.carts.set_quantity(cart.id, book_id, quantity).await?;
        if !updated {
            return Err(CartError::BookNotFound(book_id));
        }

        self.priced(user_id).await
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::BookNotFound` if the book has no line in this
    /// cart.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<PricedCart, CartError> {
        let cart = self.carts.get_or_create(user_id).await?;
        let removed = self.carts.remove_line(cart.id, book_id).await?;
        if !removed {
            return Err(CartError::BookNotFound(book_id));
        }

        self.priced(user_id).await
    }

    /// Remove every line, keeping the cart itself.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` on storage failure.
    pub async fn clear(&self, user_id: UserId) -> Result<(), CartError> {
        self.carts.get_or_create(user_id).await?;
        self.carts.clear(user_id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::services::memory::MemoryStore;

    fn dec(value: &str) -> Decimal {
        value.parse().expect("valid decimal")
    }

    fn manager(store: &MemoryStore) -> CartManager<'_, MemoryStore, MemoryStore, MemoryStore, MemoryStore> {
        CartManager::new(store, store, store, store)
    }

    #[tokio::test]
    async fn test_cart_is_created_lazily_on_first_read() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");

        let priced = manager(&store).get(user_id).await.expect("cart");

        assert!(priced.is_empty());
        assert_eq!(priced.total, Decimal::ZERO);

        // Second read returns the same cart.
        let again = manager(&store).get(user_id).await.expect("cart");
        assert_eq!(again.cart_id, priced.cart_id);
    }

    #[tokio::test]
    async fn test_add_item_starts_at_quantity_one() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");
        let book_id = store.seed_book("Dune", dec("20.00"), 5);

        let priced = manager(&store)
            .add_item(user_id, book_id)
            .await
            .expect("add");

        assert_eq!(priced.total_quantity, 1);
        assert_eq!(priced.total, dec("20.00"));
    }

    #[tokio::test]
    async fn test_re_adding_a_book_is_a_noop() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");
        let book_id = store.seed_book("Dune", dec("20.00"), 5);

        let svc = manager(&store);
        svc.add_item(user_id, book_id).await.expect("add");
        svc.update_item(user_id, book_id, 3).await.expect("update");
        let priced = svc.add_item(user_id, book_id).await.expect("re-add");

        assert_eq!(priced.total_quantity, 3);
    }

    #[tokio::test]
    async fn test_add_unknown_book_fails() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");

        let result = manager(&store).add_item(user_id, BookId::generate()).await;

        assert!(matches!(result, Err(CartError::BookNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_zero_quantity() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");
        let book_id = store.seed_book("Dune", dec("20.00"), 5);

        let svc = manager(&store);
        svc.add_item(user_id, book_id).await.expect("add");
        let result = svc.update_item(user_id, book_id, 0).await;

        assert!(matches!(result, Err(CartError::InvalidQuantity)));
    }

    #[tokio::test]
    async fn test_update_validates_against_stock() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");
        let book_id = store.seed_book("Dune", dec("20.00"), 2);

        let svc = manager(&store);
        svc.add_item(user_id, book_id).await.expect("add");
        let result = svc.update_item(user_id, book_id, 3).await;

        assert!(
            matches!(result, Err(CartError::InsufficientStock { ref book_title }) if book_title == "Dune")
        );
        // Stock validation does not reserve anything.
        assert_eq!(store.stock_of(book_id), 2);
    }

    #[tokio::test]
    async fn test_update_missing_line_fails() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");
        let book_id = store.seed_book("Dune", dec("20.00"), 5);

        let result = manager(&store).update_item(user_id, book_id, 2).await;

        assert!(matches!(result, Err(CartError::BookNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_and_clear_keep_the_cart() {
        let store = MemoryStore::new();
        let user_id = store.seed_user("Reader");
        let first = store.seed_book("Dune", dec("20.00"), 5);
        let second = store.seed_book("Hyperion", dec("15.00"), 5);

        let svc = manager(&store);
        svc.add_item(user_id, first).await.expect("add");
        svc.add_item(user_id, second).await.expect("add");

        let priced = svc.remove_item(user_id, first).await.expect("remove");
        assert_eq!(priced.total_quantity, 1);
        let cart_id = priced.cart_id;

        svc.clear(user_id).await.expect("clear");
        let priced = svc.get(user_id).await.expect("cart");
        assert!(priced.is_empty());
        assert_eq!(priced.cart_id, cart_id);
    }
}
