//! Shared types used across the order service crates.

pub mod page;
pub mod types;

pub use page::{Page, PageRequest};
pub use types::{MemberId, OrderId, PaymentId, ProductId, Version};
