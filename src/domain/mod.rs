//! Laundry order domain: pricing, the order aggregate and its events.
pub mod aggregates;
pub mod events;
pub mod pricing;
pub mod value_objects;
