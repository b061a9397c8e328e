//! Bloom Core - Shared types and pricing rules.
//!
//! This crate provides common types used across all Bloom components:
//! - `storefront` - Public JSON API and admin back-office
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure business rules - no I/O, no
//! database access, no HTTP clients. This keeps it lightweight and allows it
//! to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`pricing`] - Cart and order pricing (subtotal, coupon discount, delivery fee, total)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{LineItem, MAX_AMOUNT, PriceBreakdown, PricingError, PricingPolicy};
pub use types::*;
