//! Business services: discount resolution, cart pricing, loyalty
//! evaluation, cart management, and order conversion/verification.
//!
//! Services are generic over the storage traits in [`crate::db`] so the
//! pricing and order pipelines can be tested against in-memory fakes.

pub mod cart;
pub mod discount;
pub mod email;
pub mod loyalty;
pub mod order;
pub mod pricing;

#[cfg(test)]
pub(crate) mod memory;

pub use cart::{CartError, CartManager};
pub use discount::{DiscountAdmin, DiscountError, DiscountResolver, NewDiscount};
pub use email::{AppNotifier, EmailNotifier, Notifier, NotifyError};
pub use loyalty::LoyaltyEvaluator;
pub use order::{OrderError, OrderService};
pub use pricing::{CartPricer, PricedCart, PricedLine};
