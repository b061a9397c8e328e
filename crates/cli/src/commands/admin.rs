//! Admin account management.
//!
//! ```bash
//! bloom-cli admin create -e owner@bloomflorist.shop -n "Shop Owner" --password '...'
//! ```

use bloom_core::UserRole;
use bloom_storefront::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create an admin account and return its ID.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<i32, AdminError> {
    let pool = connect().await?;

    tracing::info!("Creating admin account: {}", email);
    let user = AuthService::new(&pool)
        .create_user(email, name, password, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i32())
}
