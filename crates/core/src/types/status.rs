//! Order status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of an order.
///
/// Transitions are forward-only: `Pending` → `Verified` when the claim
/// code is presented, and `Verified` → `Completed` is set externally by
/// back-office tooling. `Verified` and `Completed` orders both count as
/// settled for loyalty evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Created from a cart; stock not yet decremented.
    Pending,
    /// Claim code presented; stock decremented and cart cleared.
    Verified,
    /// Settled externally after verification.
    Completed,
}

impl OrderStatus {
    /// String form used in the database and API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Verified => "Verified",
            Self::Completed => "Completed",
        }
    }

    /// Whether this order counts toward loyalty evaluation.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Verified | Self::Completed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing an order status from its string form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown order status: {0}")]
pub struct ParseOrderStatusError(String);

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Verified" => Ok(Self::Verified),
            "Completed" => Ok(Self::Completed),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_string() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Verified,
            OrderStatus::Completed,
        ] {
            let parsed: OrderStatus = status.as_str().parse().expect("valid status");
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_settled_statuses() {
        assert!(!OrderStatus::Pending.is_settled());
        assert!(OrderStatus::Verified.is_settled());
        assert!(OrderStatus::Completed.is_settled());
    }
}
