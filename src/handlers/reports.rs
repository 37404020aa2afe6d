use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::success_response;
use super::material_history::parse_optional_date;
use crate::errors::ServiceError;
use crate::services::reports::{ExportDataset, ReportPeriod, ReportSummary};
use crate::AppState;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    /// Materials at or below this quantity count as low stock. Defaults to 0.
    #[param(value_type = Option<String>)]
    pub low_stock_threshold: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

fn period(from: Option<&str>, to: Option<&str>) -> Result<ReportPeriod, ServiceError> {
    let period = ReportPeriod {
        from: parse_optional_date(from)?,
        to: parse_optional_date(to)?,
    };
    if let (Some(from), Some(to)) = (period.from, period.to) {
        if from > to {
            return Err(ServiceError::ValidationError(
                "from must not be after to".into(),
            ));
        }
    }
    Ok(period)
}

#[utoipa::path(
    get,
    path = "/api/reports/summary",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Totals for the period", body = ReportSummary),
        (status = 400, description = "Bad period", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Response, ServiceError> {
    let period = period(query.from.as_deref(), query.to.as_deref())?;
    let report = state
        .services
        .reports
        .summary(period, query.low_stock_threshold.unwrap_or(Decimal::ZERO))
        .await?;
    Ok(success_response(report))
}

/// CSV download of one dataset
#[utoipa::path(
    get,
    path = "/api/reports/export/{dataset}",
    params(
        ("dataset" = String, Path, description = "materials, material-history, orders or transactions"),
        PeriodQuery
    ),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv"),
        (status = 404, description = "Unknown dataset", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn export(
    State(state): State<AppState>,
    Path(dataset): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> Result<Response, ServiceError> {
    let dataset = ExportDataset::parse(&dataset)?;
    let period = period(query.from.as_deref(), query.to.as_deref())?;
    let export = state.services.reports.export(dataset, period).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        export.filename
    ))
    .map_err(|e| ServiceError::InternalError(e.to_string()))?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/csv; charset=utf-8"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}
