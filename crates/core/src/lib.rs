//! Readnook core types library.
//!
//! Shared types used by the backend: type-safe entity IDs, the order
//! status state machine, and claim codes for order pickup.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::claim_code::{ClaimCode, ClaimCodeError};
pub use types::id::{BookId, CartId, DiscountId, OrderId, OrderItemId, UserId};
pub use types::status::{OrderStatus, ParseOrderStatusError};
