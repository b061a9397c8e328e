//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bloom_core::{Email, UserId, UserRole};

/// A customer or admin account (domain type).
///
/// The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, normalized.
    pub email: Email,
    /// Display name.
    pub name: String,
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
