//! Order service: validation, pricing, lifecycle and back-office queries.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::aggregates::{Order, OrderDraft, OrderError, OrderItem, OrderPatch, OrderStatus, PaymentMethod, PaymentStatus};
use crate::domain::events::OrderEvent;
use crate::domain::pricing::{DeliveryOption, OrderPricing, PricingTable, SpecialTreatment};
use crate::domain::value_objects::{Money, OrderNumber};
use crate::error::{Result, WashWishError};
use crate::publisher::EventPublisher;
use crate::repository::OrderRepository;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_schedule"))]
pub struct CreateOrderInput {
    #[validate(length(min = 1, message = "an order needs at least one item"), nested)]
    pub items: Vec<OrderItemInput>,
    #[validate(custom(function = "not_blank"))]
    pub pickup_address: String,
    #[validate(custom(function = "not_blank"))]
    pub delivery_address: String,
    pub pickup_date: NaiveDate,
    pub delivery_date: NaiveDate,
    #[validate(custom(function = "known_payment_method"))]
    pub payment_method: String,
    #[serde(default)]
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub delivery_option: DeliveryOption,
    #[serde(default)]
    pub special_treatments: Vec<SpecialTreatment>,
}

/// One garment line as sent by a client.
///
/// `quantity` is signed so a negative count reaches the range check and comes
/// back as a field error instead of a body parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OrderItemInput {
    #[serde(rename = "type")]
    pub item_type: String,
    #[validate(range(min = 1, max = MAX_ITEM_QUANTITY, message = "quantity must be between 1 and 10000"))]
    pub quantity: i64,
}

impl OrderItemInput {
    /// Quantity as priced. Only meaningful once the input has been validated.
    fn count(&self) -> u32 { u32::try_from(self.quantity.clamp(0, MAX_ITEM_QUANTITY)).unwrap_or(0) }
}

/// Items and surcharges to price without opening an order.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    #[validate(length(min = 1, message = "a quote needs at least one item"), nested)]
    pub items: Vec<OrderItemInput>,
    #[serde(default)]
    pub delivery_option: DeliveryOption,
    #[serde(default)]
    pub special_treatments: Vec<SpecialTreatment>,
}

fn not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

fn known_payment_method(value: &str) -> std::result::Result<(), ValidationError> {
    value.parse::<PaymentMethod>().map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("payment_method");
        err.message = Some(e.to_string().into());
        err
    })
}

fn field_error(field: &'static str, err: ValidationError) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add(field, err);
    errors
}

fn validate_schedule(input: &CreateOrderInput) -> std::result::Result<(), ValidationError> {
    if input.pickup_date > input.delivery_date {
        let mut err = ValidationError::new("schedule");
        err.message = Some("pickupDate must not be after deliveryDate".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: u64,
    pub pending: u64,
    pub in_process: u64,
    pub completed: u64,
    pub today_orders: u64,
    pub total_revenue: Money,
}

impl OrderStats {
    pub fn collect<'a>(orders: impl IntoIterator<Item = &'a Order>, today: NaiveDate) -> Self {
        orders.into_iter().fold(Self::default(), |mut stats, order| {
            stats.total += 1;
            match order.status() {
                OrderStatus::Pending => stats.pending += 1,
                OrderStatus::Delivered => stats.completed += 1,
                s if s.is_in_process() => stats.in_process += 1,
                _ => {}
            }
            if order.created_at().date_naive() == today {
                stats.today_orders += 1;
            }
            if order.payment_status() == PaymentStatus::Paid {
                stats.total_revenue = stats.total_revenue + order.total_amount();
            }
            stats
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Clone)]
pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    pricing: Arc<PricingTable>,
    publisher: Option<EventPublisher>,
}

impl OrderService {
    pub fn new(repo: Arc<dyn OrderRepository>, pricing: PricingTable) -> Self {
        Self { repo, pricing: Arc::new(pricing), publisher: None }
    }

    pub fn with_publisher(mut self, publisher: EventPublisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn pricing(&self) -> &PricingTable { &self.pricing }

    pub fn quote(&self, input: &QuoteInput) -> Result<OrderPricing> {
        input.validate()?;
        Ok(self.pricing.price_order(
            input.items.iter().map(|i| (i.item_type.as_str(), i.count())),
            input.delivery_option,
            &input.special_treatments,
        ))
    }

    pub async fn create_order(&self, customer_id: &str, input: CreateOrderInput) -> Result<Order> {
        input.validate()?;
        let payment_method: PaymentMethod =
            input.payment_method.parse().map_err(|_| field_error("payment_method", ValidationError::new("payment_method")))?;
        let items = input
            .items
            .iter()
            .map(|i| OrderItem::priced(i.item_type.trim(), i.count(), self.pricing.price_item(&i.item_type, i.count())))
            .collect();
        let seq = self.repo.next_sequence().await?;
        let mut order = Order::create(OrderDraft {
            order_number: OrderNumber::from_sequence(seq),
            customer_id: customer_id.to_string(),
            items,
            delivery_option: input.delivery_option,
            special_treatments: input.special_treatments,
            payment_method,
            pickup_address: input.pickup_address.trim().to_string(),
            delivery_address: input.delivery_address.trim().to_string(),
            pickup_date: input.pickup_date,
            delivery_date: input.delivery_date,
            special_instructions: input.special_instructions.filter(|s| !s.trim().is_empty()),
        })?;
        let events = order.take_events();
        let stored = self.repo.create(order).await?;
        info!(
            order_id = %stored.id(),
            order_number = %stored.order_number(),
            customer_id,
            total = %stored.total_amount(),
            "order created"
        );
        self.publish(events).await;
        Ok(stored)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order> {
        self.repo.find_by_id(id).await?.ok_or(WashWishError::NotFound(id))
    }

    pub async fn update_order_status(&self, id: Uuid, status: OrderStatus, note: Option<String>) -> Result<Order> {
        let mut order = self.get_order(id).await?;
        let from = order.status();
        let entry = order.transition_to(status, note).map_err(|e| {
            if let OrderError::InvalidTransition { current, requested } = &e {
                warn!(order_id = %id, %current, %requested, "status transition rejected");
            }
            e
        })?;
        let updated = self.apply(&mut order, OrderPatch::status(entry)).await?;
        info!(order_id = %id, %from, to = %status, "order status updated");
        Ok(updated)
    }

    pub async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<Order> {
        let mut order = self.get_order(id).await?;
        order.set_payment_status(status);
        let updated = self.apply(&mut order, OrderPatch::payment(status)).await?;
        info!(order_id = %id, payment_status = %status, "payment status updated");
        Ok(updated)
    }

    pub async fn assign_staff(&self, id: Uuid, staff_id: &str) -> Result<Order> {
        not_blank(staff_id).map_err(|e| field_error("staffId", e))?;
        let mut order = self.get_order(id).await?;
        order.assign_staff(staff_id.trim());
        let updated = self.apply(&mut order, OrderPatch::staff(staff_id.trim())).await?;
        info!(order_id = %id, staff_id, "staff assigned");
        Ok(updated)
    }

    pub async fn get_orders_by_customer(&self, customer_id: &str) -> Result<Vec<Order>> {
        Ok(self.repo.find_by_customer(customer_id).await?)
    }

    pub async fn search_orders(&self, query: &str) -> Result<Vec<Order>> {
        Ok(self.repo.search(query).await?)
    }

    pub async fn list_orders(&self, page: Option<u32>, per_page: Option<u32>) -> Result<Page<Order>> {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let all = self.repo.find_all().await?;
        let total = all.len() as u64;
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let data = all.into_iter().skip(skip).take(per_page as usize).collect();
        Ok(Page { data, total, page, per_page })
    }

    pub async fn delete_order(&self, id: Uuid) -> Result<()> {
        if self.repo.delete(id).await? {
            info!(order_id = %id, "order deleted");
            Ok(())
        } else {
            Err(WashWishError::NotFound(id))
        }
    }

    pub async fn get_order_stats(&self) -> Result<OrderStats> {
        let orders = self.repo.find_all().await?;
        Ok(OrderStats::collect(&orders, Utc::now().date_naive()))
    }

    /// Persists a change made on a loaded copy, guarded by that copy's version.
    async fn apply(&self, order: &mut Order, patch: OrderPatch) -> Result<Order> {
        let id = order.id();
        let events = order.take_events();
        let updated = match self.repo.update(id, order.version(), patch).await {
            Ok(Some(updated)) => updated,
            Ok(None) => return Err(WashWishError::NotFound(id)),
            Err(e) => {
                let err = WashWishError::from(e);
                if matches!(err, WashWishError::Conflict(_)) {
                    warn!(order_id = %id, version = order.version(), "concurrent order update rejected");
                }
                return Err(err);
            }
        };
        self.publish(events).await;
        Ok(updated)
    }

    async fn publish(&self, events: Vec<OrderEvent>) {
        if let Some(publisher) = &self.publisher {
            publisher.publish(events).await;
        }
    }
}
