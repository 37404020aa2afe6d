use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, flexible_date, format_plate_count, success_response, validate_input,
    PlateCount,
};
use super::materials::validate_non_negative;
use crate::entities::production_order;
use crate::errors::ServiceError;
use crate::services::production_orders::{
    CreateOrderCommand, OrderFilter, RecordProductionCommand, UpdateOrderCommand,
};
use crate::AppState;

/// Production order as clients see it, with display strings and profit.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: Uuid,
    pub lot: String,
    pub date: NaiveDate,
    pub product: String,
    pub ordered_quantity: i32,
    pub ordered_quantity_display: String,
    pub produced_quantity: Option<i32>,
    pub produced_quantity_display: Option<String>,
    pub qc_quantity: Option<i32>,
    pub electricity_cost: Decimal,
    pub material_cost: Decimal,
    pub total_cost: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
    pub status: String,
    pub machine_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<production_order::Model> for OrderView {
    fn from(order: production_order::Model) -> Self {
        let profit = order.profit();
        Self {
            id: order.id,
            lot: order.lot,
            date: order.date,
            product: order.product,
            ordered_quantity: order.ordered_quantity,
            ordered_quantity_display: format_plate_count(order.ordered_quantity),
            produced_quantity: order.produced_quantity,
            produced_quantity_display: order.produced_quantity.map(format_plate_count),
            qc_quantity: order.qc_quantity,
            electricity_cost: order.electricity_cost,
            material_cost: order.material_cost,
            total_cost: order.total_cost,
            selling_price: order.selling_price,
            profit,
            status: order.status,
            machine_id: order.machine_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub status: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub lot: String,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub product: String,
    pub ordered_quantity: PlateCount,
    #[validate(custom = "validate_non_negative")]
    pub selling_price: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub electricity_cost: Option<Decimal>,
    pub status: Option<String>,
    pub machine_id: Option<String>,
    pub qc_quantity: Option<PlateCount>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordProductionRequest {
    pub order_id: Uuid,
    pub produced_quantity: PlateCount,
    pub qc_quantity: Option<PlateCount>,
    #[validate(custom = "validate_non_negative")]
    pub electricity_cost: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[validate(length(min = 1, max = 100))]
    pub lot: Option<String>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 255))]
    pub product: Option<String>,
    pub ordered_quantity: Option<PlateCount>,
    pub produced_quantity: Option<PlateCount>,
    pub qc_quantity: Option<PlateCount>,
    #[validate(custom = "validate_non_negative")]
    pub electricity_cost: Option<Decimal>,
    #[validate(custom = "validate_non_negative")]
    pub selling_price: Option<Decimal>,
    pub status: Option<String>,
    pub machine_id: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderQuery),
    responses((status = 200, description = "Orders, newest first", body = [OrderView])),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Response, ServiceError> {
    let orders = state
        .services
        .orders
        .list(OrderFilter {
            status: query.status,
            product: query.product,
        })
        .await?;
    let views: Vec<OrderView> = orders.into_iter().map(OrderView::from).collect();
    Ok(success_response(views))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order found", body = OrderView),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.get(id).await?;
    Ok(success_response(OrderView::from(order)))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderView),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .create(CreateOrderCommand {
            lot: payload.lot,
            date: payload.date,
            product: payload.product,
            ordered_quantity: payload.ordered_quantity.into(),
            selling_price: payload.selling_price,
            electricity_cost: payload.electricity_cost,
            status: payload.status,
            machine_id: payload.machine_id,
            qc_quantity: payload.qc_quantity.map(i32::from),
        })
        .await?;
    Ok(created_response(OrderView::from(order)))
}

/// Record production once and consume the recipe's materials
#[utoipa::path(
    post,
    path = "/api/orders/production",
    request_body = RecordProductionRequest,
    responses(
        (status = 200, description = "Production recorded", body = OrderView),
        (status = 400, description = "Invalid request or not enough stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Production already recorded", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn record_production(
    State(state): State<AppState>,
    Json(payload): Json<RecordProductionRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .record_production(RecordProductionCommand {
            order_id: payload.order_id,
            produced_quantity: payload.produced_quantity.into(),
            qc_quantity: payload.qc_quantity.map(i32::from),
            electricity_cost: payload.electricity_cost,
        })
        .await?;
    Ok(success_response(OrderView::from(order)))
}

/// Edit an order; a new produced quantity reconciles stock
#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = OrderView),
        (status = 400, description = "Invalid request or not enough stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let order = state
        .services
        .orders
        .update(
            id,
            UpdateOrderCommand {
                lot: payload.lot,
                date: payload.date,
                product: payload.product,
                ordered_quantity: payload.ordered_quantity.map(i32::from),
                produced_quantity: payload.produced_quantity.map(i32::from),
                qc_quantity: payload.qc_quantity.map(i32::from),
                electricity_cost: payload.electricity_cost,
                selling_price: payload.selling_price,
                status: payload.status,
                machine_id: payload.machine_id,
            },
        )
        .await?;
    Ok(success_response(OrderView::from(order)))
}

/// Delete an order and return its materials to stock
#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order deleted", body = OrderView),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state.services.orders.delete(id).await?;
    Ok(success_response(OrderView::from(order)))
}
