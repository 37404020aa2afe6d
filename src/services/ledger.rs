use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, ModelTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::ledger_transaction::{self, Entity as LedgerEntity};
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub is_income: Option<bool>,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateTransactionCommand {
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub quantity: Option<String>,
    pub is_income: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTransactionCommand {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Decimal>,
    pub quantity: Option<String>,
    pub is_income: Option<bool>,
    pub notes: Option<String>,
}

/// Income and expense bookkeeping
#[derive(Clone)]
pub struct LedgerService {
    db_pool: Arc<DbPool>,
}

impl LedgerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        filter: LedgerFilter,
    ) -> Result<Vec<ledger_transaction::Model>, ServiceError> {
        let mut query = LedgerEntity::find();
        if let Some(from) = filter.from {
            query = query.filter(ledger_transaction::Column::Date.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(ledger_transaction::Column::Date.lte(to));
        }
        if let Some(is_income) = filter.is_income {
            query = query.filter(ledger_transaction::Column::IsIncome.eq(is_income));
        }
        if let Some(category) = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            query = query.filter(ledger_transaction::Column::Category.eq(category));
        }

        query
            .order_by_desc(ledger_transaction::Column::Date)
            .order_by_desc(ledger_transaction::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<ledger_transaction::Model, ServiceError> {
        LedgerEntity::find_by_id(id)
            .one(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Transaction {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        command: CreateTransactionCommand,
    ) -> Result<ledger_transaction::Model, ServiceError> {
        let description = required(&command.description, "description")?;
        let category = required(&command.category, "category")?;
        ensure_amount(command.amount)?;

        let saved = ledger_transaction::ActiveModel {
            date: Set(command.date),
            description: Set(description),
            category: Set(category),
            amount: Set(command.amount),
            quantity: Set(optional(command.quantity)),
            is_income: Set(command.is_income),
            notes: Set(optional(command.notes)),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await
        .map_err(ServiceError::db_error)?;

        info!(transaction_id = %saved.id, is_income = saved.is_income, amount = %saved.amount, "ledger entry created");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        command: UpdateTransactionCommand,
    ) -> Result<ledger_transaction::Model, ServiceError> {
        let existing = self.get(id).await?;
        let mut active = existing.into_active_model();

        if let Some(date) = command.date {
            active.date = Set(date);
        }
        if let Some(description) = command.description.as_deref() {
            active.description = Set(required(description, "description")?);
        }
        if let Some(category) = command.category.as_deref() {
            active.category = Set(required(category, "category")?);
        }
        if let Some(amount) = command.amount {
            ensure_amount(amount)?;
            active.amount = Set(amount);
        }
        if command.quantity.is_some() {
            active.quantity = Set(optional(command.quantity));
        }
        if let Some(is_income) = command.is_income {
            active.is_income = Set(is_income);
        }
        if command.notes.is_some() {
            active.notes = Set(optional(command.notes));
        }

        let saved = active
            .update(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!(transaction_id = %id, "ledger entry updated");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        existing
            .delete(self.db_pool.as_ref())
            .await
            .map_err(ServiceError::db_error)?;
        info!(transaction_id = %id, "ledger entry deleted");
        Ok(())
    }
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(value.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn ensure_amount(amount: Decimal) -> Result<(), ServiceError> {
    if amount < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "amount must not be negative".into(),
        ));
    }
    Ok(())
}
