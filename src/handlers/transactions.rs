use axum::{
    extract::{Json, Path, Query, State},
    response::Response,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{
    created_response, flexible_date, message_response, success_response, validate_input,
};
use super::material_history::parse_optional_date;
use super::materials::validate_non_negative;
use crate::entities::ledger_transaction;
use crate::errors::ServiceError;
use crate::services::ledger::{CreateTransactionCommand, LedgerFilter, UpdateTransactionCommand};
use crate::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct TransactionQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub is_income: Option<bool>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(custom = "validate_non_negative")]
    pub amount: Decimal,
    pub quantity: Option<String>,
    #[serde(default)]
    pub is_income: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub amount: Option<Decimal>,
    pub quantity: Option<String>,
    pub is_income: Option<bool>,
    pub notes: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/transactions",
    params(TransactionQuery),
    responses((status = 200, description = "Ledger entries, newest first", body = [ledger_transaction::Model])),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Response, ServiceError> {
    let filter = LedgerFilter {
        from: parse_optional_date(query.from.as_deref())?,
        to: parse_optional_date(query.to.as_deref())?,
        is_income: query.is_income,
        category: query.category,
    };
    let rows = state.services.ledger.list(filter).await?;
    Ok(success_response(rows))
}

#[utoipa::path(
    post,
    path = "/api/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 201, description = "Entry created", body = ledger_transaction::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn create_transaction(
    State(state): State<AppState>,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let saved = state
        .services
        .ledger
        .create(CreateTransactionCommand {
            date: payload.date.unwrap_or_else(|| Utc::now().date_naive()),
            description: payload.description,
            category: payload.category,
            amount: payload.amount,
            quantity: payload.quantity,
            is_income: payload.is_income,
            notes: payload.notes,
        })
        .await?;
    Ok(created_response(saved))
}

#[utoipa::path(
    put,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Entry updated", body = ledger_transaction::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Entry not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTransactionRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let saved = state
        .services
        .ledger
        .update(
            id,
            UpdateTransactionCommand {
                date: payload.date,
                description: payload.description,
                category: payload.category,
                amount: payload.amount,
                quantity: payload.quantity,
                is_income: payload.is_income,
                notes: payload.notes,
            },
        )
        .await?;
    Ok(success_response(saved))
}

#[utoipa::path(
    delete,
    path = "/api/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction id")),
    responses(
        (status = 200, description = "Entry deleted"),
        (status = 404, description = "Entry not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "transactions"
)]
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    state.services.ledger.delete(id).await?;
    Ok(message_response("Transaction deleted"))
}
