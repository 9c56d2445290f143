//! Customer account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use readnook_core::UserId;

/// A customer account.
///
/// Authentication mechanics live outside this service; the backend only
/// needs the identity and the email address for order notifications.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
