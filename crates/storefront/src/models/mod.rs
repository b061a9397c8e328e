//! Domain models for the storefront.
//!
//! These are the validated shapes handed between the repositories and the
//! route handlers. They serialize to the camelCase JSON the web client reads.

pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod order;
pub mod review;
pub mod session;
pub mod settings;
pub mod user;

pub use cart::{Cart, CartLine};
pub use catalog::{Category, CategoryInput, Product, ProductFilter, ProductInput};
pub use coupon::{Coupon, CouponInput, CouponRejection, normalize_code};
pub use order::{NewOrder, Order, OrderItemRequest, OrderLine, OrderRequest};
pub use review::{Review, ReviewInput};
pub use session::{CurrentUser, keys as session_keys};
pub use settings::{PublicSettings, StoreSettings, StoreSettingsUpdate};
pub use user::User;
