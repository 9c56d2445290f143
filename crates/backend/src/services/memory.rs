//! In-memory store fakes for service tests.
//!
//! One `MemoryStore` implements every storage trait so a test can pass
//! the same instance for each service parameter. All mutations are
//! synchronous under a mutex; nothing is held across an await.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use readnook_core::{
    BookId, CartId, ClaimCode, DiscountId, OrderId, OrderStatus, UserId,
};

use crate::db::{
    BookStore, CartStore, DiscountStore, OrderStore, RepositoryError, StockDecrement, UserStore,
};
use crate::models::{Book, Cart, CartLine, Discount, Order, User};

use super::email::{Notifier, NotifyError};

/// In-memory implementation of every storage trait.
#[derive(Default)]
pub struct MemoryStore {
    books: Mutex<HashMap<BookId, Book>>,
    discounts: Mutex<Vec<Discount>>,
    carts: Mutex<HashMap<UserId, Cart>>,
    orders: Mutex<Vec<Order>>,
    users: Mutex<HashMap<UserId, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_user(&self, name: &str) -> UserId {
        let id = UserId::generate();
        let user = User {
            id,
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            created_at: Utc::now(),
        };
        self.users.lock().expect("lock").insert(id, user);
        id
    }

    pub fn seed_book(&self, title: &str, price: Decimal, stock: i32) -> BookId {
        let id = BookId::generate();
        let now = Utc::now();
        let book = Book {
            id,
            title: title.to_string(),
            author: "Test Author".to_string(),
            isbn: "9780000000000".to_string(),
            price,
            stock_quantity: stock,
            is_coming_soon: false,
            on_sale: false,
            discounted_price: None,
            created_at: now,
            updated_at: now,
        };
        self.books.lock().expect("lock").insert(id, book);
        id
    }

    pub fn seed_discount_window(
        &self,
        book_id: BookId,
        percentage: Decimal,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> DiscountId {
        let id = DiscountId::generate();
        let now = Utc::now();
        let discount = Discount {
            id,
            name: "Test discount".to_string(),
            percentage,
            start_date: start,
            end_date: end,
            on_sale: true,
            book_id: Some(book_id),
            created_at: now,
            updated_at: now,
        };
        self.discounts.lock().expect("lock").push(discount);
        id
    }

    pub fn seed_active_discount(
        &self,
        book_id: BookId,
        percentage: Decimal,
        _name: &str,
    ) -> DiscountId {
        self.seed_discount_window(
            book_id,
            percentage,
            Utc::now() - Duration::days(1),
            Utc::now() + Duration::days(1),
        )
    }

    /// Create a cart with the given lines, without checking the catalog.
    pub fn seed_cart_unchecked(&self, user_id: UserId, lines: &[(BookId, i32)]) -> Cart {
        let now = Utc::now();
        let cart = Cart {
            id: CartId::generate(),
            user_id,
            lines: lines
                .iter()
                .map(|&(book_id, quantity)| CartLine {
                    book_id,
                    quantity,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.carts
            .lock()
            .expect("lock")
            .insert(user_id, cart.clone());
        cart
    }

    /// Create a cart with the given lines of known books.
    pub fn seed_cart(&self, user_id: UserId, lines: &[(BookId, i32)]) -> Cart {
        {
            let books = self.books.lock().expect("lock");
            for (book_id, _) in lines {
                assert!(books.contains_key(book_id), "seeding line for unknown book");
            }
        }
        self.seed_cart_unchecked(user_id, lines)
    }

    pub fn seed_order_with_status(&self, user_id: UserId, status: OrderStatus) -> OrderId {
        let id = OrderId::generate();
        let now = Utc::now();
        let order = Order {
            id,
            user_id,
            claim_code: ClaimCode::generate(),
            total_amount: Decimal::ZERO,
            original_total_amount: Decimal::ZERO,
            volume_discount_amount: None,
            loyalty_discount_amount: None,
            status,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.orders.lock().expect("lock").push(order);
        id
    }

    pub fn seed_settled_orders(&self, user_id: UserId, count: i64) {
        for _ in 0..count {
            self.seed_order_with_status(user_id, OrderStatus::Verified);
        }
    }

    pub fn stock_of(&self, book_id: BookId) -> i32 {
        self.books
            .lock()
            .expect("lock")
            .get(&book_id)
            .expect("book exists")
            .stock_quantity
    }

    pub fn set_stock(&self, book_id: BookId, stock: i32) {
        self.books
            .lock()
            .expect("lock")
            .get_mut(&book_id)
            .expect("book exists")
            .stock_quantity = stock;
    }

    pub fn remove_book(&self, book_id: BookId) {
        self.books.lock().expect("lock").remove(&book_id);
    }
}

impl BookStore for MemoryStore {
    async fn find(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        Ok(self.books.lock().expect("lock").get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Book>, RepositoryError> {
        Ok(self.books.lock().expect("lock").values().cloned().collect())
    }

    async fn update_sale_fields(
        &self,
        id: BookId,
        discounted_price: Option<Decimal>,
        on_sale: bool,
    ) -> Result<(), RepositoryError> {
        if let Some(book) = self.books.lock().expect("lock").get_mut(&id) {
            book.discounted_price = discounted_price;
            book.on_sale = on_sale;
            book.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn decrement_stock(
        &self,
        items: &[(BookId, i32)],
    ) -> Result<StockDecrement, RepositoryError> {
        let mut books = self.books.lock().expect("lock");

        // Validate the whole batch before mutating anything.
        for &(book_id, quantity) in items {
            match books.get(&book_id) {
                None => return Ok(StockDecrement::Missing(book_id)),
                Some(book) if book.stock_quantity < quantity => {
                    return Ok(StockDecrement::Insufficient(book_id));
                }
                Some(_) => {}
            }
        }

        for &(book_id, quantity) in items {
            if let Some(book) = books.get_mut(&book_id) {
                book.stock_quantity -= quantity;
            }
        }
        Ok(StockDecrement::Applied)
    }
}

impl DiscountStore for MemoryStore {
    async fn for_book(&self, book_id: BookId) -> Result<Vec<Discount>, RepositoryError> {
        Ok(self
            .discounts
            .lock()
            .expect("lock")
            .iter()
            .filter(|d| d.book_id == Some(book_id))
            .cloned()
            .collect())
    }

    async fn list(&self) -> Result<Vec<Discount>, RepositoryError> {
        Ok(self.discounts.lock().expect("lock").clone())
    }

    async fn insert(&self, discount: &Discount) -> Result<(), RepositoryError> {
        self.discounts.lock().expect("lock").push(discount.clone());
        Ok(())
    }

    async fn delete_overlapping(
        &self,
        book_id: BookId,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut discounts = self.discounts.lock().expect("lock");
        let before = discounts.len();
        discounts.retain(|d| {
            d.book_id != Some(book_id) || d.start_date > end || d.end_date < start
        });
        Ok((before - discounts.len()) as u64)
    }

    async fn delete_active(
        &self,
        book_id: BookId,
        now: chrono::DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut discounts = self.discounts.lock().expect("lock");
        let before = discounts.len();
        discounts.retain(|d| d.book_id != Some(book_id) || !d.is_active_at(now));
        Ok((before - discounts.len()) as u64)
    }
}

impl CartStore for MemoryStore {
    async fn get_or_create(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.lock().expect("lock");
        let cart = carts.entry(user_id).or_insert_with(|| {
            let now = Utc::now();
            Cart {
                id: CartId::generate(),
                user_id,
                lines: Vec::new(),
                created_at: now,
                updated_at: now,
            }
        });
        Ok(cart.clone())
    }

    async fn add_line(&self, cart_id: CartId, book_id: BookId) -> Result<bool, RepositoryError> {
        let mut carts = self.carts.lock().expect("lock");
        let Some(cart) = carts.values_mut().find(|c| c.id == cart_id) else {
            return Ok(false);
        };
        if cart.line_for(book_id).is_some() {
            return Ok(false);
        }
        let now = Utc::now();
        cart.lines.push(CartLine {
            book_id,
            quantity: 1,
            created_at: now,
            updated_at: now,
        });
        cart.updated_at = now;
        Ok(true)
    }

    async fn set_quantity(
        &self,
        cart_id: CartId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let mut carts = self.carts.lock().expect("lock");
        let Some(cart) = carts.values_mut().find(|c| c.id == cart_id) else {
            return Ok(false);
        };
        let Some(line) = cart.lines.iter_mut().find(|l| l.book_id == book_id) else {
            return Ok(false);
        };
        line.quantity = quantity;
        line.updated_at = Utc::now();
        cart.updated_at = line.updated_at;
        Ok(true)
    }

    async fn remove_line(
        &self,
        cart_id: CartId,
        book_id: BookId,
    ) -> Result<bool, RepositoryError> {
        let mut carts = self.carts.lock().expect("lock");
        let Some(cart) = carts.values_mut().find(|c| c.id == cart_id) else {
            return Ok(false);
        };
        let before = cart.lines.len();
        cart.lines.retain(|l| l.book_id != book_id);
        let removed = cart.lines.len() != before;
        if removed {
            cart.updated_at = Utc::now();
        }
        Ok(removed)
    }

    async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        if let Some(cart) = self.carts.lock().expect("lock").get_mut(&user_id) {
            cart.lines.clear();
            cart.updated_at = Utc::now();
        }
        Ok(())
    }
}

impl OrderStore for MemoryStore {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().expect("lock");
        if orders.iter().any(|o| o.claim_code == order.claim_code) {
            return Err(RepositoryError::Conflict(
                "duplicate claim code".to_string(),
            ));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find_by_claim_code(
        &self,
        code: &ClaimCode,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .expect("lock")
            .iter()
            .find(|o| &o.claim_code == code)
            .cloned())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .orders
            .lock()
            .expect("lock")
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    async fn settled_count(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        Ok(self
            .orders
            .lock()
            .expect("lock")
            .iter()
            .filter(|o| o.user_id == user_id && o.status.is_settled())
            .count() as i64)
    }

    async fn transition_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.lock().expect("lock");
        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            return Ok(false);
        };
        if order.status != from {
            return Ok(false);
        }
        order.status = to;
        order.updated_at = Utc::now();
        Ok(true)
    }
}

impl UserStore for MemoryStore {
    async fn find(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().expect("lock").get(&id).cloned())
    }
}

/// Notifier fake that records sends and can simulate failures.
pub struct RecordingNotifier {
    confirmations: Mutex<Vec<String>>,
    verifications: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            confirmations: Mutex::new(Vec::new()),
            verifications: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations.lock().expect("lock").clone()
    }

    pub fn verifications(&self) -> Vec<String> {
        self.verifications.lock().expect("lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    async fn order_confirmation(
        &self,
        recipient: &str,
        order: &Order,
    ) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Failed("simulated delivery failure".to_string()));
        }
        self.confirmations
            .lock()
            .expect("lock")
            .push(format!("{recipient}: {}", order.claim_code));
        Ok(())
    }

    async fn order_verified(&self, recipient: &str, order: &Order) -> Result<(), NotifyError> {
        if self.fail {
            return Err(NotifyError::Failed("simulated delivery failure".to_string()));
        }
        self.verifications
            .lock()
            .expect("lock")
            .push(format!("{recipient}: {}", order.claim_code));
        Ok(())
    }
}
