use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::material_history::{self, Entity as HistoryEntity, HistoryAction};
use crate::errors::ServiceError;
use crate::services::stock::{self, HistoryRecord};

pub const DEFAULT_HISTORY_LIMIT: u64 = 200;
pub const MAX_HISTORY_LIMIT: u64 = 1000;

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub name: Option<String>,
    pub action: Option<HistoryAction>,
    pub order_id: Option<Uuid>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<u64>,
}

impl HistoryFilter {
    pub fn effective_limit(&self) -> u64 {
        self.limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[derive(Debug, Clone)]
pub struct ManualHistoryCommand {
    pub action: HistoryAction,
    pub name: String,
    pub quantity: Decimal,
    pub unit: Option<String>,
    pub date: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Read side of the stock log, plus manual entries that do not move stock.
#[derive(Clone)]
pub struct MaterialHistoryService {
    db_pool: Arc<DbPool>,
    default_unit: String,
}

impl MaterialHistoryService {
    pub fn new(db_pool: Arc<DbPool>, default_unit: impl Into<String>) -> Self {
        Self {
            db_pool,
            default_unit: default_unit.into(),
        }
    }

    /// Newest first
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: HistoryFilter,
    ) -> Result<Vec<material_history::Model>, ServiceError> {
        let mut query = HistoryEntity::find();

        if let Some(name) = filter.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query = query.filter(material_history::Column::Name.eq(name));
        }
        if let Some(action) = filter.action {
            query = query.filter(material_history::Column::Action.eq(action));
        }
        if let Some(order_id) = filter.order_id {
            query = query.filter(material_history::Column::OrderId.eq(order_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(material_history::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(material_history::Column::Date.lte(to));
        }

        query
            .order_by_desc(material_history::Column::CreatedAt)
            .order_by_desc(material_history::Column::Date)
            .limit(filter.effective_limit())
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    /// Appends an entry by hand. Stock is left alone.
    #[instrument(skip(self))]
    pub async fn record_manual(
        &self,
        command: ManualHistoryCommand,
    ) -> Result<material_history::Model, ServiceError> {
        let name = command.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError("name must not be empty".into()));
        }
        if command.quantity < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity must not be negative".into(),
            ));
        }

        let db = self.db_pool.as_ref();
        let unit = match command
            .unit
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
        {
            Some(unit) => unit,
            None => stock::find_by_name(db, &name)
                .await?
                .map(|m| m.unit)
                .unwrap_or_else(|| self.default_unit.clone()),
        };

        let row = stock::record_history(
            db,
            HistoryRecord {
                action: command.action,
                date: command.date.unwrap_or_else(|| Utc::now().date_naive()),
                name,
                quantity: command.quantity,
                unit,
                order_id: None,
                note: command.note,
            },
        )
        .await?;

        info!(history_id = %row.id, action = %row.action, "manual history entry recorded");
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(HistoryFilter::default().effective_limit(), 200);
        let big = HistoryFilter {
            limit: Some(50_000),
            ..Default::default()
        };
        assert_eq!(big.effective_limit(), 1000);
        let zero = HistoryFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(zero.effective_limit(), 1);
    }
}
