//! WashWish laundry order service
//!
//! Order lifecycle and pricing for a laundry booking app.
//!
//! ## Features
//! - Garment price catalog with delivery and special-treatment surcharges
//! - Order creation with a fixed pricing snapshot
//! - Strict status lifecycle with an append-only history
//! - In-memory and PostgreSQL order storage behind one repository trait
//! - Back-office search, pagination and stats
//! - Optional order events on NATS

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod publisher;
pub mod repository;
pub mod service;

pub use domain::aggregates::{Order, OrderError, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, StatusEntry};
pub use domain::pricing::{DeliveryOption, PricingTable, SpecialTreatment};
pub use domain::value_objects::{Money, OrderNumber};
pub use error::{Result, WashWishError};
pub use repository::{InMemoryOrderRepository, OrderRepository, PgOrderRepository, RepoError};
pub use service::{CreateOrderInput, OrderItemInput, OrderService, OrderStats, QuoteInput};
