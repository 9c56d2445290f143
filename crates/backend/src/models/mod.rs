//! Domain models for the bookstore backend.

pub mod book;
pub mod cart;
pub mod discount;
pub mod order;
pub mod user;

pub use book::Book;
pub use cart::{Cart, CartLine};
pub use discount::Discount;
pub use order::{Order, OrderItem};
pub use user::User;
