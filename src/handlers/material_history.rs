use axum::{
    extract::{Json, Query, State},
    response::Response,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, flexible_date, success_response, validate_input};
use super::materials::validate_non_negative;
use crate::entities::material_history::{self, HistoryAction};
use crate::errors::ServiceError;
use crate::services::material_history::{HistoryFilter, ManualHistoryCommand};
use crate::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryQuery {
    /// Material name
    pub name: Option<String>,
    /// Thai label or code: เพิ่ม/add, ลบ/delete, นำไปใช้/consume, คืนวัตถุดิบ/return
    pub action: Option<String>,
    pub order_id: Option<Uuid>,
    /// Inclusive start date (YYYY-MM-DD)
    pub from: Option<String>,
    /// Inclusive end date (YYYY-MM-DD)
    pub to: Option<String>,
    /// Defaults to 200, capped at 1000
    pub limit: Option<u64>,
}

impl HistoryQuery {
    fn into_filter(self) -> Result<HistoryFilter, ServiceError> {
        let action = match self.action.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
            Some(raw) => Some(HistoryAction::parse(raw).ok_or_else(|| {
                ServiceError::ValidationError(format!("Unknown history action {}", raw))
            })?),
            None => None,
        };
        Ok(HistoryFilter {
            name: self.name,
            action,
            order_id: self.order_id,
            from: parse_optional_date(self.from.as_deref())?,
            to: parse_optional_date(self.to.as_deref())?,
            limit: self.limit,
        })
    }
}

pub(crate) fn parse_optional_date(value: Option<&str>) -> Result<Option<NaiveDate>, ServiceError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => super::common::parse_flexible_date(raw).map(Some),
        None => Ok(None),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ManualHistoryRequest {
    pub action: HistoryAction,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom = "validate_non_negative")]
    pub quantity: Decimal,
    pub unit: Option<String>,
    #[serde(default, deserialize_with = "flexible_date::deserialize")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Stock log, newest first
#[utoipa::path(
    get,
    path = "/api/material-history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "History entries", body = [material_history::Model]),
        (status = 400, description = "Bad filter", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "material-history"
)]
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ServiceError> {
    let entries = state
        .services
        .material_history
        .list(query.into_filter()?)
        .await?;
    Ok(success_response(entries))
}

/// Append a manual entry. Stock does not change.
#[utoipa::path(
    post,
    path = "/api/material-history",
    request_body = ManualHistoryRequest,
    responses(
        (status = 201, description = "Entry recorded", body = material_history::Model),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "material-history"
)]
pub async fn create_history_entry(
    State(state): State<AppState>,
    Json(payload): Json<ManualHistoryRequest>,
) -> Result<Response, ServiceError> {
    validate_input(&payload)?;
    let entry = state
        .services
        .material_history
        .record_manual(ManualHistoryCommand {
            action: payload.action,
            name: payload.name,
            quantity: payload.quantity,
            unit: payload.unit,
            date: payload.date,
            note: payload.note,
        })
        .await?;
    Ok(created_response(entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_accepts_thai_action_labels() {
        let filter = HistoryQuery {
            action: Some("นำไปใช้".into()),
            from: Some("2024-01-01".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.action, Some(HistoryAction::Consume));
        assert_eq!(filter.from, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = HistoryQuery {
            action: Some("ขาย".into()),
            ..Default::default()
        }
        .into_filter();
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }
}
