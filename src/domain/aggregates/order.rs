//! Order Aggregate

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::OrderEvent;
use crate::domain::pricing::{DeliveryOption, ItemPricing, OrderPricing, SpecialTreatment};
use crate::domain::value_objects::{Money, OrderNumber};

pub const CREATED_NOTE: &str = "Order created";

/// A customer's laundry order with its pricing snapshot and status history.
///
/// New orders only come from [`Order::create`], which derives every total from
/// the items and surcharges. `Deserialize` exists so storage can reload orders
/// it wrote itself (the JSONB document column). It performs no checks, so never
/// deserialize an `Order` from client input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: Uuid,
    order_number: OrderNumber,
    customer_id: String,
    items: Vec<OrderItem>,
    subtotal: Money,
    delivery_option: DeliveryOption,
    delivery_charge: Money,
    special_treatments: Vec<SpecialTreatment>,
    treatment_charge: Money,
    total_amount: Money,
    payment_method: PaymentMethod,
    payment_status: PaymentStatus,
    order_status: OrderStatus,
    status_history: Vec<StatusEntry>,
    pickup_address: String,
    delivery_address: String,
    pickup_date: NaiveDate,
    delivery_date: NaiveDate,
    special_instructions: Option<String>,
    assigned_staff: Option<String>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(skip)]
    events: Vec<OrderEvent>,
}

/// One priced garment line. The line total is fixed at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(rename = "type")]
    item_type: String,
    quantity: u32,
    unit_price: Money,
    line_total: Money,
}

impl OrderItem {
    pub fn new(item_type: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self { item_type: item_type.into(), quantity, unit_price, line_total: unit_price.multiply(quantity) }
    }

    pub fn priced(item_type: impl Into<String>, quantity: u32, pricing: ItemPricing) -> Self {
        Self::new(item_type, quantity, pricing.unit_price)
    }

    pub fn item_type(&self) -> &str { &self.item_type }
    pub fn quantity(&self) -> u32 { self.quantity }
    pub fn unit_price(&self) -> Money { self.unit_price }
    pub fn line_total(&self) -> Money { self.line_total }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    PickedUp,
    InProcess,
    Washed,
    Ironed,
    ReadyForDelivery,
    Delivered,
    Cancelled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Online,
    Cod,
}

impl OrderStatus {
    /// The linear flow; `Cancelled` sits outside it.
    pub const FLOW: [OrderStatus; 7] = [
        Self::Pending,
        Self::PickedUp,
        Self::InProcess,
        Self::Washed,
        Self::Ironed,
        Self::ReadyForDelivery,
        Self::Delivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PickedUp => "picked_up",
            Self::InProcess => "in_process",
            Self::Washed => "washed",
            Self::Ironed => "ironed",
            Self::ReadyForDelivery => "ready_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn next(self) -> Option<OrderStatus> {
        let pos = Self::FLOW.iter().position(|s| *s == self)?;
        Self::FLOW.get(pos + 1).copied()
    }

    pub fn is_terminal(self) -> bool { matches!(self, Self::Delivered | Self::Cancelled) }

    /// Statuses counted as "in process" by the back office.
    pub fn is_in_process(self) -> bool {
        matches!(self, Self::PickedUp | Self::InProcess | Self::Washed | Self::Ironed)
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        if self.is_terminal() { return false; }
        to == Self::Cancelled || self.next() == Some(to)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::FLOW
            .into_iter()
            .chain([Self::Cancelled])
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [Self::Online, Self::Cod];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Cod => "cod",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|m| m.as_str() == s).ok_or_else(|| UnknownPaymentMethod(s.to_string()))
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPaymentMethod(pub String);
impl std::error::Error for UnknownPaymentMethod {}
impl fmt::Display for UnknownPaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "payment method must be online or cod, got `{}`", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);
impl std::error::Error for UnknownStatus {}
impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "unknown order status `{}`", self.0) }
}

/// Everything needed to open a new order.
#[derive(Clone, Debug)]
pub struct OrderDraft {
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub delivery_option: DeliveryOption,
    pub special_treatments: Vec<SpecialTreatment>,
    pub payment_method: PaymentMethod,
    pub pickup_address: String,
    pub delivery_address: String,
    pub pickup_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub special_instructions: Option<String>,
}

/// Fields a stored order may change after creation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status_change: Option<StatusEntry>,
    pub payment_status: Option<PaymentStatus>,
    pub assigned_staff: Option<String>,
}

impl OrderPatch {
    pub fn status(entry: StatusEntry) -> Self { Self { status_change: Some(entry), ..Self::default() } }
    pub fn payment(status: PaymentStatus) -> Self { Self { payment_status: Some(status), ..Self::default() } }
    pub fn staff(staff_id: impl Into<String>) -> Self { Self { assigned_staff: Some(staff_id.into()), ..Self::default() } }
}

impl Order {
    pub fn create(draft: OrderDraft) -> Result<Self, OrderError> {
        if draft.items.is_empty() { return Err(OrderError::NoItems); }
        let special_treatments = SpecialTreatment::dedupe(&draft.special_treatments);
        let pricing = OrderPricing::from_lines(
            draft.items.iter().map(OrderItem::line_total),
            draft.delivery_option,
            &special_treatments,
        );
        let now = Utc::now();
        let mut order = Self {
            id: Uuid::now_v7(),
            order_number: draft.order_number,
            customer_id: draft.customer_id,
            items: draft.items,
            subtotal: pricing.subtotal,
            delivery_option: draft.delivery_option,
            delivery_charge: pricing.delivery_charge,
            special_treatments,
            treatment_charge: pricing.treatment_charge,
            total_amount: pricing.total_amount,
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Pending,
            order_status: OrderStatus::Pending,
            status_history: vec![StatusEntry { status: OrderStatus::Pending, timestamp: now, note: Some(CREATED_NOTE.into()) }],
            pickup_address: draft.pickup_address,
            delivery_address: draft.delivery_address,
            pickup_date: draft.pickup_date,
            delivery_date: draft.delivery_date,
            special_instructions: draft.special_instructions,
            assigned_staff: None,
            version: 0,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise_event(OrderEvent::Created {
            order_id: order.id,
            order_number: order.order_number.to_string(),
            customer_id: order.customer_id.clone(),
            total_amount: order.total_amount,
        });
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &OrderNumber { &self.order_number }
    pub fn customer_id(&self) -> &str { &self.customer_id }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn subtotal(&self) -> Money { self.subtotal }
    pub fn delivery_option(&self) -> DeliveryOption { self.delivery_option }
    pub fn delivery_charge(&self) -> Money { self.delivery_charge }
    pub fn special_treatments(&self) -> &[SpecialTreatment] { &self.special_treatments }
    pub fn treatment_charge(&self) -> Money { self.treatment_charge }
    pub fn total_amount(&self) -> Money { self.total_amount }
    pub fn payment_method(&self) -> PaymentMethod { self.payment_method }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn status(&self) -> OrderStatus { self.order_status }
    pub fn status_history(&self) -> &[StatusEntry] { &self.status_history }
    pub fn pickup_address(&self) -> &str { &self.pickup_address }
    pub fn delivery_address(&self) -> &str { &self.delivery_address }
    pub fn pickup_date(&self) -> NaiveDate { self.pickup_date }
    pub fn delivery_date(&self) -> NaiveDate { self.delivery_date }
    pub fn special_instructions(&self) -> Option<&str> { self.special_instructions.as_deref() }
    pub fn assigned_staff(&self) -> Option<&str> { self.assigned_staff.as_deref() }
    pub fn version(&self) -> u64 { self.version }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Moves the order along its lifecycle and records the move in the history.
    pub fn transition_to(&mut self, next: OrderStatus, note: Option<String>) -> Result<StatusEntry, OrderError> {
        let current = self.order_status;
        if !current.can_transition_to(next) {
            return Err(OrderError::InvalidTransition { current, requested: next });
        }
        let entry = StatusEntry { status: next, timestamp: Utc::now(), note };
        self.apply_status(entry.clone());
        self.touch();
        self.raise_event(OrderEvent::StatusChanged { order_id: self.id, from: current, to: next });
        Ok(entry)
    }

    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        let from = self.payment_status;
        self.payment_status = status;
        self.touch();
        self.raise_event(OrderEvent::PaymentStatusChanged { order_id: self.id, from, to: status });
    }

    pub fn assign_staff(&mut self, staff_id: impl Into<String>) {
        let staff_id = staff_id.into();
        self.assigned_staff = Some(staff_id.clone());
        self.touch();
        self.raise_event(OrderEvent::StaffAssigned { order_id: self.id, staff_id });
    }

    /// Case-insensitive substring match; `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.order_number.as_str().to_lowercase().contains(needle)
            || self.order_status.as_str().contains(needle)
            || self.customer_id.to_lowercase().contains(needle)
    }

    /// Applies a stored-side patch. Callers check `version` first.
    pub(crate) fn merge(&mut self, patch: OrderPatch) {
        if let Some(entry) = patch.status_change { self.apply_status(entry); }
        if let Some(status) = patch.payment_status { self.payment_status = status; }
        if let Some(staff) = patch.assigned_staff { self.assigned_staff = Some(staff); }
        self.version += 1;
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<OrderEvent> { std::mem::take(&mut self.events) }

    fn apply_status(&mut self, entry: StatusEntry) {
        self.order_status = entry.status;
        self.status_history.push(entry);
    }

    fn raise_event(&mut self, e: OrderEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    NoItems,
    InvalidTransition { current: OrderStatus, requested: OrderStatus },
}

impl std::error::Error for OrderError {}
impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoItems => write!(f, "an order needs at least one item"),
            Self::InvalidTransition { current, requested } => {
                write!(f, "cannot move order from {current} to {requested}")
            }
        }
    }
}
