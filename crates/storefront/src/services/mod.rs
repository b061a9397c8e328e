//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login (argon2)
//! - `checkout` - Cart quotes, order placement and the WhatsApp hand-off

pub mod auth;
pub mod checkout;
