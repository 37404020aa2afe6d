use axum::{
    extract::{Json, Path, State},
    response::Response,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::common::{created_response, flexible_date, success_response, validate_input};
use crate::entities::material;
use crate::errors::ServiceError;
use crate::services::materials::{
    AddMaterialCommand, AdjustQuantityCommand, StockOperation, UpdateMaterialCommand,
};
use crate::AppState;

pub(crate) fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        return Err(ValidationError::new("must_not_be_negative"));
    }
    Ok(())
}

pub(crate) fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("must_be_positive"));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMaterialRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom = "validate_non_negative")]
    pub quantity: Decimal,
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price_per_unit: Option<Decimal>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterialRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub quantity: Option<Decimal>,
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price_per_unit: Option<Decimal>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUnitRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1, max = 64))]
    pub unit: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdjustQuantityRequest {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(custom = "validate_positive")]
    pub quantity: Decimal,
    pub operation: StockOperation,
    pub unit: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub price_per_unit: Option<Decimal>,
}

/// List materials
#[utoipa::path(
    get,
    path = "/api/materials",
    responses(
        (status = 200, description = "All materials ordered by name", body = [material::Model]),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn list_materials(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let materials = state.services.materials.list().await?;
    Ok(success_response(materials))
}

/// Add stock, creating the material when the name is new
#[utoipa::path(
    post,
    path = "/api/materials",
    request_body = AddMaterialRequest,
    responses(
        (status = 201, description = "Material created or topped up", body = material::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn add_material(
    State(state): State<AppState>,
    Json(payload): Json<AddMaterialRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let saved = state
        .services
        .materials
        .add(AddMaterialCommand {
            name: payload.name,
            quantity: payload.quantity,
            unit: payload.unit,
            price_per_unit: payload.price_per_unit,
            date: payload.date,
        })
        .await?;
    Ok(created_response(saved))
}

#[utoipa::path(
    put,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    request_body = UpdateMaterialRequest,
    responses(
        (status = 200, description = "Material updated", body = material::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Name already in use", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaterialRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let saved = state
        .services
        .materials
        .update(
            id,
            UpdateMaterialCommand {
                name: payload.name,
                quantity: payload.quantity,
                unit: payload.unit,
                price_per_unit: payload.price_per_unit,
                date: payload.date,
            },
        )
        .await?;
    Ok(success_response(saved))
}

#[utoipa::path(
    delete,
    path = "/api/materials/{id}",
    params(("id" = Uuid, Path, description = "Material id")),
    responses(
        (status = 200, description = "Material deleted", body = material::Model),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn delete_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let deleted = state.services.materials.delete(id).await?;
    Ok(success_response(deleted))
}

/// Set the unit of a material by name
#[utoipa::path(
    patch,
    path = "/api/materials/update-unit",
    request_body = UpdateUnitRequest,
    responses(
        (status = 200, description = "Unit updated", body = material::Model),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn update_unit(
    State(state): State<AppState>,
    Json(payload): Json<UpdateUnitRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let saved = state
        .services
        .materials
        .update_unit(&payload.name, &payload.unit)
        .await?;
    Ok(success_response(saved))
}

/// Increase or decrease stock by name
#[utoipa::path(
    post,
    path = "/api/materials/quantity",
    request_body = AdjustQuantityRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = material::Model),
        (status = 400, description = "Invalid request or not enough stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Material not found", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "materials"
)]
pub async fn adjust_quantity(
    State(state): State<AppState>,
    Json(payload): Json<AdjustQuantityRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let saved = state
        .services
        .materials
        .adjust_quantity(AdjustQuantityCommand {
            name: payload.name,
            quantity: payload.quantity,
            operation: payload.operation,
            unit: payload.unit,
            price_per_unit: payload.price_per_unit,
        })
        .await?;
    Ok(success_response(saved))
}
