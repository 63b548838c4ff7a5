//! Order aggregate and related types.

mod aggregate;
mod state;
mod value_objects;

pub use aggregate::{Order, OrderRecord};
pub use state::OrderStatus;
pub use value_objects::{Money, OrderItem, PaymentMethod};
