//! Domain events
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{OrderStatus, PaymentStatus};
use crate::domain::value_objects::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    Created { order_id: Uuid, order_number: String, customer_id: String, total_amount: Money },
    StatusChanged { order_id: Uuid, from: OrderStatus, to: OrderStatus },
    PaymentStatusChanged { order_id: Uuid, from: PaymentStatus, to: PaymentStatus },
    StaffAssigned { order_id: Uuid, staff_id: String },
}

impl OrderEvent {
    pub fn order_id(&self) -> Uuid {
        match self {
            Self::Created { order_id, .. }
            | Self::StatusChanged { order_id, .. }
            | Self::PaymentStatusChanged { order_id, .. }
            | Self::StaffAssigned { order_id, .. } => *order_id,
        }
    }

    /// Last segment of the subject the event is published on.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::StatusChanged { .. } => "status_changed",
            Self::PaymentStatusChanged { .. } => "payment_status_changed",
            Self::StaffAssigned { .. } => "staff_assigned",
        }
    }
}
