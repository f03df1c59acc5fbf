//! Aggregates module
pub mod order;

pub use order::{
    Order, OrderDraft, OrderError, OrderItem, OrderPatch, OrderStatus, PaymentMethod, PaymentStatus, StatusEntry,
    UnknownPaymentMethod, UnknownStatus,
};
