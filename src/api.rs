//! REST surface over the order service.

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderError, OrderStatus, PaymentStatus};
use crate::domain::pricing::{DeliveryOption, OrderPricing, SpecialTreatment};
use crate::domain::value_objects::Money;
use crate::error::WashWishError;
use crate::service::{CreateOrderInput, OrderService, OrderStats, Page, QuoteInput};

#[derive(Clone)]
pub struct AppState {
    pub orders: OrderService,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "healthy", "service": "washwish"})) }))
        .route("/api/v1/pricing", get(price_list))
        .route("/api/v1/pricing/quote", post(quote))
        .route("/api/v1/customers/:customer_id/orders", get(customer_orders).post(create_order))
        .route("/api/v1/orders", get(list_orders))
        .route("/api/v1/orders/search", get(search_orders))
        .route("/api/v1/orders/stats", get(order_stats))
        .route("/api/v1/orders/:id", get(get_order).delete(delete_order))
        .route("/api/v1/orders/:id/status", put(update_status))
        .route("/api/v1/orders/:id/payment", put(update_payment))
        .route("/api/v1/orders/:id/assignment", put(assign_staff))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl IntoResponse for WashWishError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(errors) => {
                (StatusCode::BAD_REQUEST, json!({"error": "validation_failed", "fields": errors}))
            }
            Self::MalformedBody(_) | Self::Order(OrderError::NoItems) => {
                (StatusCode::BAD_REQUEST, json!({"error": "validation_failed", "message": self.to_string()}))
            }
            Self::NotFound(_) => (StatusCode::NOT_FOUND, json!({"error": "not_found", "message": self.to_string()})),
            Self::Order(OrderError::InvalidTransition { current, requested }) => (
                StatusCode::CONFLICT,
                json!({"error": "invalid_transition", "message": self.to_string(), "current": current, "requested": requested}),
            ),
            Self::Conflict(_) => (StatusCode::CONFLICT, json!({"error": "conflict", "message": self.to_string()})),
            Self::Storage(e) => {
                tracing::error!(error = %e, "storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "internal_error"}))
            }
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<T, WashWishError>;

/// Unwraps a JSON body, turning axum's rejection into the same 400 as a failed validation.
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(value)| value).map_err(|rejection| WashWishError::MalformedBody(rejection.body_text()))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceList {
    items: Vec<PriceEntry>,
    default_unit_price: Money,
    delivery_options: Vec<(DeliveryOption, Money)>,
    special_treatments: Vec<(SpecialTreatment, Money)>,
}

#[derive(Debug, Serialize)]
struct PriceEntry {
    #[serde(rename = "type")]
    item_type: String,
    price: Money,
}

async fn price_list(State(s): State<AppState>) -> Json<PriceList> {
    let table = s.orders.pricing();
    Json(PriceList {
        items: table.entries().into_iter().map(|(t, price)| PriceEntry { item_type: t.to_string(), price }).collect(),
        default_unit_price: table.default_price(),
        delivery_options: DeliveryOption::ALL.iter().map(|d| (*d, d.fee())).collect(),
        special_treatments: SpecialTreatment::ALL.iter().map(|t| (*t, t.fee())).collect(),
    })
}

async fn quote(
    State(s): State<AppState>,
    payload: Result<Json<QuoteInput>, JsonRejection>,
) -> ApiResult<Json<OrderPricing>> {
    Ok(Json(s.orders.quote(&body(payload)?)?))
}

async fn create_order(
    State(s): State<AppState>,
    Path(customer_id): Path<String>,
    payload: Result<Json<CreateOrderInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let order = s.orders.create_order(&customer_id, body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

async fn customer_orders(State(s): State<AppState>, Path(customer_id): Path<String>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(s.orders.get_orders_by_customer(&customer_id).await?))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u32>,
    per_page: Option<u32>,
}

async fn list_orders(State(s): State<AppState>, Query(p): Query<ListParams>) -> ApiResult<Json<Page<Order>>> {
    Ok(Json(s.orders.list_orders(p.page, p.per_page).await?))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

async fn search_orders(State(s): State<AppState>, Query(p): Query<SearchParams>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(s.orders.search_orders(&p.q).await?))
}

async fn order_stats(State(s): State<AppState>) -> ApiResult<Json<OrderStats>> {
    Ok(Json(s.orders.get_order_stats().await?))
}

async fn get_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Order>> {
    Ok(Json(s.orders.get_order(id).await?))
}

async fn delete_order(State(s): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    s.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: OrderStatus,
    note: Option<String>,
}

async fn update_status(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<StatusUpdate>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let r = body(payload)?;
    Ok(Json(s.orders.update_order_status(id, r.status, r.note).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PaymentUpdate {
    payment_status: PaymentStatus,
}

async fn update_payment(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<PaymentUpdate>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let r = body(payload)?;
    Ok(Json(s.orders.update_payment_status(id, r.payment_status).await?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaffAssignment {
    staff_id: String,
}

async fn assign_staff(
    State(s): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<StaffAssignment>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    let r = body(payload)?;
    Ok(Json(s.orders.assign_staff(id, &r.staff_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pricing::PricingTable;
    use crate::repository::InMemoryOrderRepository;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let service = OrderService::new(Arc::new(InMemoryOrderRepository::new()), PricingTable::standard());
        router(AppState { orders: service })
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, json)
    }

    fn order_body(items: Value) -> Value {
        json!({
            "items": items,
            "pickupAddress": "7 Hill View",
            "deliveryAddress": "7 Hill View",
            "pickupDate": "2026-10-20",
            "deliveryDate": "2026-10-21",
            "paymentMethod": "online"
        })
    }

    #[tokio::test]
    async fn test_order_lifecycle_over_http() {
        let app = app();
        let (status, order) = call(
            &app,
            Method::POST,
            "/api/v1/customers/C1/orders",
            Some(order_body(json!([{"type": "shirt", "quantity": 2}, {"type": "towel", "quantity": 1}]))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order["totalAmount"], 280);
        assert_eq!(order["orderStatus"], "pending");
        assert_eq!(order["orderNumber"], "WW0001");
        assert_eq!(order["items"][0]["lineTotal"], 200);
        let id = order["id"].as_str().unwrap().to_string();

        let (status, updated) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/orders/{id}/status"),
            Some(json!({"status": "picked_up", "note": "collected"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["statusHistory"].as_array().unwrap().len(), 2);

        let (status, err) =
            call(&app, Method::PUT, &format!("/api/v1/orders/{id}/status"), Some(json!({"status": "delivered"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["current"], "picked_up");
        assert_eq!(err["requested"], "delivered");

        let (status, listed) = call(&app, Method::GET, "/api/v1/customers/C1/orders", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let (_, found) = call(&app, Method::GET, "/api/v1/orders/search?q=ww000", None).await;
        assert_eq!(found.as_array().unwrap().len(), 1);

        let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &format!("/api/v1/orders/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_items_is_bad_request() {
        let app = app();
        let (status, body) = call(&app, Method::POST, "/api/v1/customers/C1/orders", Some(order_body(json!([])))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        let (_, stats) = call(&app, Method::GET, "/api/v1/orders/stats", None).await;
        assert_eq!(stats["total"], 0);
    }

    #[tokio::test]
    async fn test_bad_quantity_and_payment_method_are_bad_request() {
        let app = app();
        let mut negative = order_body(json!([{"type": "shirt", "quantity": -1}]));
        let (status, body) = call(&app, Method::POST, "/api/v1/customers/C1/orders", Some(negative.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert!(body["fields"]["items"].is_object());

        negative["items"] = json!([{"type": "shirt", "quantity": 1}]);
        negative["paymentMethod"] = json!("cheque");
        let (status, body) = call(&app, Method::POST, "/api/v1/customers/C1/orders", Some(negative)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert!(body["fields"]["payment_method"].is_array() || body["fields"]["paymentMethod"].is_array());

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/customers/C1/orders",
            Some(order_body(json!([{"type": "shirt", "quantity": "two"}]))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");

        let (_, stats) = call(&app, Method::GET, "/api/v1/orders/stats", None).await;
        assert_eq!(stats["total"], 0);
    }

    #[tokio::test]
    async fn test_unknown_status_value_is_bad_request() {
        let app = app();
        let (_, order) =
            call(&app, Method::POST, "/api/v1/customers/C1/orders", Some(order_body(json!([{"type": "shirt", "quantity": 1}]))))
                .await;
        let id = order["id"].as_str().unwrap();
        let (status, body) =
            call(&app, Method::PUT, &format!("/api/v1/orders/{id}/status"), Some(json!({"status": "shipped"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
    }

    #[tokio::test]
    async fn test_payment_and_stats() {
        let app = app();
        let (_, order) = call(
            &app,
            Method::POST,
            "/api/v1/customers/C1/orders",
            Some(order_body(json!([{"type": "shirt", "quantity": 2}, {"type": "towel", "quantity": 1}]))),
        )
        .await;
        let id = order["id"].as_str().unwrap();
        let (status, paid) =
            call(&app, Method::PUT, &format!("/api/v1/orders/{id}/payment"), Some(json!({"paymentStatus": "paid"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(paid["paymentStatus"], "paid");
        let (_, stats) = call(&app, Method::GET, "/api/v1/orders/stats", None).await;
        assert_eq!(stats["totalRevenue"], 280);
        assert_eq!(stats["todayOrders"], 1);
    }

    #[tokio::test]
    async fn test_quote_and_price_list() {
        let app = app();
        let (status, quote) = call(
            &app,
            Method::POST,
            "/api/v1/pricing/quote",
            Some(json!({"items": [{"type": "saree", "quantity": 1}], "deliveryOption": "express"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["totalAmount"], 300);

        for items in [json!([]), json!([{"type": "shirt", "quantity": 0}]), json!([{"type": "shirt", "quantity": -2}])] {
            let (status, body) = call(&app, Method::POST, "/api/v1/pricing/quote", Some(json!({"items": items}))).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["error"], "validation_failed");
        }

        let (_, prices) = call(&app, Method::GET, "/api/v1/pricing", None).await;
        assert_eq!(prices["defaultUnitPrice"], 50);
        assert!(prices["items"].as_array().unwrap().iter().any(|e| e["type"] == "towel" && e["price"] == 80));
    }
}
